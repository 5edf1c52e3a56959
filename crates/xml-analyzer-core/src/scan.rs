//! XML file discovery and corpus-wide extraction.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::extract::{extract_from_file, TagValues};

/// File name suffix of documents picked up by [`list_xml_files`].
pub const XML_SUFFIX: &str = ".xml";

/// Recursively list regular files under `root` whose name ends with `.xml`.
///
/// The suffix check is case-sensitive. Results are sorted by path so repeated
/// runs see files in the same order. Unreadable subdirectories are skipped
/// with a warning.
#[must_use]
pub fn list_xml_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable path: {e}");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(XML_SUFFIX)
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    files.sort();
    files
}

/// Outcome of extracting one tag across a set of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files examined
    pub files: usize,
    /// Files containing at least one matching element
    pub matched_files: usize,
    /// Files that could not be read, decoded, or parsed
    pub failed_files: Vec<PathBuf>,
}

/// Extract `tag` from every file in `files`, merging all values.
///
/// A file that fails to load contributes nothing; the failure is logged at
/// debug level and recorded in the summary, and the scan moves on.
#[must_use]
pub fn scan_files(files: &[PathBuf], tag: &str) -> (TagValues, ScanSummary) {
    let mut values = TagValues::default();
    let mut summary = ScanSummary {
        files: files.len(),
        ..ScanSummary::default()
    };

    for path in files {
        match extract_from_file(path, tag) {
            Ok(found) => {
                if found.matched > 0 {
                    summary.matched_files += 1;
                }
                values.merge(found);
            }
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
                summary.failed_files.push(path.clone());
            }
        }
    }

    (values, summary)
}
