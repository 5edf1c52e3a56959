//! Recursive ZIP expansion for xml-analyzer
//!
//! This crate unpacks a ZIP archive onto the filesystem. Any extracted entry
//! that is itself a ZIP archive is expanded too, into a directory derived from
//! the nested archive's own path, so that every XML document packed at any
//! depth ends up reachable by a plain directory walk.
//!
//! # Features
//!
//! - **Depth-first expansion**: a nested archive is fully expanded before the
//!   next entry of its parent is processed
//! - **Contained failures**: a broken entry or a corrupt nested archive is
//!   logged and skipped; only the top-level archive failing to open is fatal
//! - **Configurable naming**: see [`DestNaming`] for how nested destinations
//!   are derived
//! - **Path safety**: entries that would escape the destination are skipped
//!
//! # Usage
//!
//! ```no_run
//! use xml_analyzer_archive::{expand, DestNaming, ExpandOptions};
//! use std::path::Path;
//!
//! let archive = Path::new("exports.zip");
//! let dest = DestNaming::Legacy.sibling_dest(archive);
//! let report = expand(archive, &dest, &ExpandOptions::default()).unwrap();
//! println!(
//!     "{} files, {} nested archives",
//!     report.files, report.nested_archives
//! );
//! ```

pub mod error;
pub mod expand;
pub mod naming;

/// Maximum nesting depth for recursive archive expansion.
///
/// An archive found deeper than this is not expanded and is reported as a
/// failed nested archive.
pub const MAX_NESTING_DEPTH: usize = 10;

/// File name suffix that marks an extracted entry as a nested archive.
pub const ZIP_SUFFIX: &str = ".zip";

/// Returns true if `path` names a ZIP archive by suffix.
///
/// Detection is purely by name; contents are never sniffed.
#[inline]
#[must_use]
pub fn is_zip_path(path: &std::path::Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(ZIP_SUFFIX))
}

pub use error::ArchiveError;
pub use expand::{expand, EntryKind, ExpandOptions, ExpandReport};
pub use naming::DestNaming;
