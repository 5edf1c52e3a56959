//! Recursive ZIP expansion onto the filesystem
//!
//! Entries are materialized under the destination directory in the order the
//! archive's central directory lists them. Every extracted `*.zip` file is
//! expanded in turn, depth-first, into the directory chosen by the
//! configured [`DestNaming`] policy.

use crate::error::ArchiveError;
use crate::naming::DestNaming;
use crate::{is_zip_path, MAX_NESTING_DEPTH};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Options controlling an expansion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// How nested archive destinations are named
    pub naming: DestNaming,
    /// Deepest nested archive level that is still expanded
    pub max_depth: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            naming: DestNaming::default(),
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Summary of what an expansion wrote, nested archives included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandReport {
    /// Files written (nested archives count here as well)
    pub files: usize,
    /// Directory entries created
    pub directories: usize,
    /// Nested archives encountered
    pub nested_archives: usize,
    /// Entries that could not be extracted
    pub skipped_entries: usize,
    /// Nested archives that could not be expanded
    pub failed_archives: Vec<PathBuf>,
}

impl ExpandReport {
    fn absorb(&mut self, nested: Self) {
        self.files += nested.files;
        self.directories += nested.directories;
        self.nested_archives += nested.nested_archives;
        self.skipped_entries += nested.skipped_entries;
        self.failed_archives.extend(nested.failed_archives);
    }
}

/// Kind of an archive entry, resolved once when the entry is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Directory entry
    Directory,
    /// Plain file
    File,
    /// File that is itself a ZIP archive and gets expanded
    Archive,
}

impl EntryKind {
    /// Classify an entry from its directory flag and output path.
    #[must_use]
    pub fn classify(is_dir: bool, path: &Path) -> Self {
        if is_dir {
            Self::Directory
        } else if is_zip_path(path) {
            Self::Archive
        } else {
            Self::File
        }
    }
}

/// An entry after it has been written under the destination directory.
#[derive(Debug)]
struct MaterializedEntry {
    kind: EntryKind,
    /// Path below the destination directory
    relative: PathBuf,
    path: PathBuf,
}

/// Expand `zip_path` into `dest_dir`, recursing into nested archives.
///
/// `dest_dir` is created if needed; existing files at entry paths are
/// overwritten, so re-running with the same inputs yields the same tree.
///
/// # Errors
///
/// Returns `ArchiveError` only if `zip_path` itself cannot be opened or is
/// not a valid ZIP archive, or `dest_dir` cannot be created. Failures of
/// individual entries and of nested archives are logged and counted in the
/// returned [`ExpandReport`] instead.
pub fn expand(
    zip_path: &Path,
    dest_dir: &Path,
    options: &ExpandOptions,
) -> Result<ExpandReport, ArchiveError> {
    let report = expand_at_depth(zip_path, dest_dir, options, 0)?;
    info!(
        "Expanded {} into {}: {} files, {} nested archives ({} failed), {} entries skipped",
        zip_path.display(),
        dest_dir.display(),
        report.files,
        report.nested_archives,
        report.failed_archives.len(),
        report.skipped_entries
    );
    Ok(report)
}

fn expand_at_depth(
    zip_path: &Path,
    dest_dir: &Path,
    options: &ExpandOptions,
    depth: usize,
) -> Result<ExpandReport, ArchiveError> {
    if depth > options.max_depth {
        return Err(ArchiveError::TooDeep {
            max: options.max_depth,
        });
    }

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    fs::create_dir_all(dest_dir)?;
    debug!(
        "Expanding {} ({} entries, depth {depth})",
        zip_path.display(),
        archive.len()
    );

    let mut report = ExpandReport::default();

    for index in 0..archive.len() {
        let entry = match materialize_entry(&mut archive, index, dest_dir) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                report.skipped_entries += 1;
                continue;
            }
            Err(e) => {
                warn!(
                    "Skipping entry #{index} of {}: {e}",
                    zip_path.display()
                );
                report.skipped_entries += 1;
                continue;
            }
        };

        match entry.kind {
            EntryKind::Directory => report.directories += 1,
            EntryKind::File => report.files += 1,
            EntryKind::Archive => {
                report.files += 1;
                report.nested_archives += 1;

                // Naming applies below dest_dir only; its ancestors are never rewritten
                let nested_dest = dest_dir.join(options.naming.dest_for(&entry.relative));
                match expand_at_depth(&entry.path, &nested_dest, options, depth + 1) {
                    Ok(nested) => report.absorb(nested),
                    Err(e) => {
                        warn!("Failed to expand nested archive {}: {e}", entry.path.display());
                        report.failed_archives.push(entry.path);
                    }
                }
            }
        }
    }

    Ok(report)
}

/// Write entry `index` under `dest_dir`.
///
/// Returns `Ok(None)` for entries whose name would escape `dest_dir`.
fn materialize_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    dest_dir: &Path,
) -> Result<Option<MaterializedEntry>, ArchiveError> {
    let mut entry = archive.by_index(index)?;

    // SECURITY: entries like "../../etc/passwd" or "/etc/passwd" are rejected
    let Some(relative) = entry.enclosed_name() else {
        warn!("Skipping unsafe entry path: {}", entry.name());
        return Ok(None);
    };

    let path = dest_dir.join(&relative);
    let kind = EntryKind::classify(entry.is_dir(), &path);

    match kind {
        EntryKind::Directory => fs::create_dir_all(&path)?,
        EntryKind::File | EntryKind::Archive => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&path)?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    Ok(Some(MaterializedEntry {
        kind,
        relative,
        path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::{SimpleFileOptions, ZipWriter};

    /// Helper: build a ZIP in memory from (name, contents) pairs.
    /// Names ending in `/` become directory entries.
    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        for (name, contents) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(contents).unwrap();
            }
        }

        zip.finish().unwrap().into_inner()
    }

    fn write_zip(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    /// Collect (relative path, contents) for every file under `root`, sorted.
    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let rel = path.strip_prefix(root).unwrap().to_path_buf();
                    out.push((rel, fs::read(&path).unwrap()));
                }
            }
        }
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out.sort();
        out
    }

    #[test]
    fn test_expand_flat_archive() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(
            temp.path(),
            "flat.zip",
            &[
                ("docs/", b""),
                ("docs/a.xml", b"<a/>"),
                ("b.xml", b"<b/>"),
            ],
        );
        let dest = temp.path().join("out");

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 1);
        assert_eq!(report.nested_archives, 0);
        assert_eq!(fs::read(dest.join("docs/a.xml")).unwrap(), b"<a/>");
        assert_eq!(fs::read(dest.join("b.xml")).unwrap(), b"<b/>");
    }

    #[test]
    fn test_expand_creates_missing_parents() {
        let temp = TempDir::new().unwrap();
        // No explicit directory entry for "deep/er/"
        let archive = write_zip(temp.path(), "p.zip", &[("deep/er/c.xml", b"<c/>")]);
        let dest = temp.path().join("not/yet/there");

        expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert!(dest.join("deep/er/c.xml").is_file());
    }

    #[test]
    fn test_expand_nested_archive_legacy_naming() {
        let temp = TempDir::new().unwrap();
        let inner = zip_bytes(&[("inner.xml", b"<inner/>")]);
        let archive = write_zip(
            temp.path(),
            "outer.zip",
            &[("outer.xml", b"<outer/>"), ("sub/inner.zip", &inner)],
        );
        let dest = DestNaming::Legacy.sibling_dest(&archive);

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(dest, temp.path().join("outerzip"));
        assert!(dest.join("outer.xml").is_file());
        // The nested archive itself stays on disk next to its expansion
        assert!(dest.join("sub/inner.zip").is_file());
        assert_eq!(
            fs::read(dest.join("sub/innerzip/inner.xml")).unwrap(),
            b"<inner/>"
        );
        assert_eq!(report.nested_archives, 1);
        assert_eq!(report.files, 3);
        assert!(report.failed_archives.is_empty());
    }

    #[test]
    fn test_expand_nested_archive_stem_naming() {
        let temp = TempDir::new().unwrap();
        let inner = zip_bytes(&[("inner.xml", b"<inner/>")]);
        let archive = write_zip(temp.path(), "outer.zip", &[("inner.zip", &inner)]);
        let options = ExpandOptions {
            naming: DestNaming::Stem,
            ..ExpandOptions::default()
        };
        let dest = options.naming.sibling_dest(&archive);

        expand(&archive, &dest, &options).unwrap();

        assert!(temp.path().join("outer/inner/inner.xml").is_file());
    }

    #[test]
    fn test_expand_three_levels() {
        let temp = TempDir::new().unwrap();
        let level3 = zip_bytes(&[("l3.xml", b"<l3/>")]);
        let level2 = zip_bytes(&[("l3.zip", &level3), ("l2.xml", b"<l2/>")]);
        let archive = write_zip(temp.path(), "l1.zip", &[("l2.zip", &level2)]);
        let dest = temp.path().join("l1zip");

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(report.nested_archives, 2);
        assert!(dest.join("l2zip/l2.xml").is_file());
        assert!(dest.join("l2zip/l3zip/l3.xml").is_file());
    }

    #[test]
    fn test_corrupt_nested_archive_is_contained() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(
            temp.path(),
            "outer.zip",
            &[
                ("broken.zip", b"definitely not a zip"),
                ("after.xml", b"<after/>"),
            ],
        );
        let dest = temp.path().join("out");

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(report.failed_archives, vec![dest.join("broken.zip")]);
        assert!(dest.join("broken.zip").is_file());
        assert!(dest.join("after.xml").is_file());
    }

    #[test]
    fn test_depth_limit() {
        let temp = TempDir::new().unwrap();
        let inner = zip_bytes(&[("inner.xml", b"<inner/>")]);
        let archive = write_zip(temp.path(), "outer.zip", &[("inner.zip", &inner)]);
        let dest = temp.path().join("out");
        let options = ExpandOptions {
            max_depth: 0,
            ..ExpandOptions::default()
        };

        let report = expand(&archive, &dest, &options).unwrap();

        assert_eq!(report.nested_archives, 1);
        assert_eq!(report.failed_archives.len(), 1);
        assert!(!dest.join("innerzip").exists());
    }

    #[test]
    fn test_unsafe_entry_is_skipped() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(
            temp.path(),
            "evil.zip",
            &[("../escaped.xml", b"<x/>"), ("ok.xml", b"<ok/>")],
        );
        let dest = temp.path().join("out");

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(report.skipped_entries, 1);
        assert!(!temp.path().join("escaped.xml").exists());
        assert!(dest.join("ok.xml").is_file());
    }

    #[test]
    fn test_unwritable_entry_is_skipped() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(
            temp.path(),
            "o.zip",
            &[("a.xml", b"<a/>"), ("b.xml", b"<b/>")],
        );
        let dest = temp.path().join("out");
        // A directory in the way makes creating the file fail
        fs::create_dir_all(dest.join("a.xml")).unwrap();

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(report.skipped_entries, 1);
        assert_eq!(report.files, 1);
        assert!(dest.join("a.xml").is_dir());
        assert_eq!(fs::read(dest.join("b.xml")).unwrap(), b"<b/>");
    }

    #[test]
    fn test_nested_dest_stays_inside_dest_dir() {
        let temp = TempDir::new().unwrap();
        let inner = zip_bytes(&[("inner.xml", b"<inner/>")]);
        let archive = write_zip(temp.path(), "data.zip", &[("inner.zip", &inner)]);
        let dest = temp.path().join("out.zip.d");

        let report = expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert!(report.failed_archives.is_empty());
        assert!(dest.join("innerzip/inner.xml").is_file());
        assert!(!temp.path().join("outzip.d").exists());
    }

    #[test]
    fn test_expand_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let inner = zip_bytes(&[("inner.xml", b"<inner/>")]);
        let archive = write_zip(
            temp.path(),
            "outer.zip",
            &[("a.xml", b"<a/>"), ("n/inner.zip", &inner)],
        );
        let dest = temp.path().join("outerzip");

        expand(&archive, &dest, &ExpandOptions::default()).unwrap();
        let first = snapshot(&dest);
        expand(&archive, &dest, &ExpandOptions::default()).unwrap();
        let second = snapshot(&dest);

        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_file_is_overwritten() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(temp.path(), "o.zip", &[("a.xml", b"<new/>")]);
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.xml"), b"<old-and-longer/>").unwrap();

        expand(&archive, &dest, &ExpandOptions::default()).unwrap();

        assert_eq!(fs::read(dest.join("a.xml")).unwrap(), b"<new/>");
    }

    #[test]
    fn test_nonexistent_archive() {
        let temp = TempDir::new().unwrap();
        let result = expand(
            &temp.path().join("missing.zip"),
            &temp.path().join("out"),
            &ExpandOptions::default(),
        );
        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }

    #[test]
    fn test_invalid_top_level_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fake.zip");
        fs::write(&path, b"plain text").unwrap();

        let result = expand(&path, &temp.path().join("out"), &ExpandOptions::default());
        assert!(matches!(result, Err(ArchiveError::InvalidZip(_))));
    }

    #[test]
    fn test_entry_kind_classify() {
        assert_eq!(
            EntryKind::classify(true, Path::new("x.zip")),
            EntryKind::Directory
        );
        assert_eq!(
            EntryKind::classify(false, Path::new("a/b.zip")),
            EntryKind::Archive
        );
        assert_eq!(
            EntryKind::classify(false, Path::new("a/b.xml")),
            EntryKind::File
        );
    }
}
