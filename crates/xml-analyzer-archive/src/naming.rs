//! Destination naming for expanded archives

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ZIP_SUFFIX;

/// Policy deriving the directory an archive is expanded into.
///
/// Only the path handed to [`DestNaming::dest_for`] is rewritten, so callers
/// pass the part below the directory they expand into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DestNaming {
    /// Replace every `.zip` in the path with `zip` (`data/a.zip` -> `data/azip`).
    ///
    /// Matches directory trees produced by earlier versions of the tool.
    #[default]
    Legacy,
    /// Drop the archive extension (`data/a.zip` -> `data/a`).
    Stem,
}

impl DestNaming {
    /// Derive the expansion directory for `archive`.
    #[must_use]
    pub fn dest_for(self, archive: &Path) -> PathBuf {
        match self {
            Self::Legacy => {
                PathBuf::from(archive.to_string_lossy().replace(ZIP_SUFFIX, "zip"))
            }
            Self::Stem => archive.with_extension(""),
        }
    }

    /// Expansion directory next to `archive`, rewriting its file name only.
    #[must_use]
    pub fn sibling_dest(self, archive: &Path) -> PathBuf {
        match archive.file_name() {
            Some(name) => archive.with_file_name(self.dest_for(Path::new(name))),
            None => self.dest_for(archive),
        }
    }
}

impl fmt::Display for DestNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Stem => write!(f, "stem"),
        }
    }
}

impl FromStr for DestNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "stem" => Ok(Self::Stem),
            other => Err(format!(
                "unknown naming policy '{other}' (expected 'legacy' or 'stem')"
            )),
        }
    }
}
