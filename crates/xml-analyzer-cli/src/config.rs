//! Configuration file support for `.xml-analyzer.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of both the user and the project configuration file.
pub const CONFIG_FILE_NAME: &str = ".xml-analyzer.toml";

/// Configuration file structure for .xml-analyzer.toml
///
/// Configuration files can be placed in:
/// - User home directory: ~/.xml-analyzer.toml (user defaults)
/// - Project directory: ./.xml-analyzer.toml (project defaults)
///
/// Precedence order (highest to lowest):
/// 1. Command-line arguments (--format, --naming, etc.)
/// 2. Project config (./.xml-analyzer.toml)
/// 3. User config (~/.xml-analyzer.toml)
/// 4. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Settings for archive expansion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveConfig>,

    /// Settings for result output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Nested archive naming policy (legacy or stem)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub naming: Option<String>,

    /// Deepest nested archive level that is still expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format (text or json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Print values in sorted order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<bool>,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find and load configuration files
    /// Returns (`user_config`, `project_config`)
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .and_then(|path| Self::load_optional(&path, "user"));
        let project_config = Self::load_optional(&PathBuf::from(CONFIG_FILE_NAME), "project");
        (user_config, project_config)
    }

    /// Load a config file if it exists; a broken file is reported and ignored.
    fn load_optional(path: &Path, kind: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load {kind} config from {}: {e:#}", path.display());
                None
            }
        }
    }

    /// Merge multiple configs with precedence
    /// CLI args > project config > user config > defaults
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let mut merged = user_config.unwrap_or_default();

        let Some(project) = project_config else {
            return merged;
        };

        if let Some(archive) = project.archive {
            let mut merged_archive = merged.archive.unwrap_or_default();
            if let Some(naming) = archive.naming {
                merged_archive.naming = Some(naming);
            }
            if let Some(max_depth) = archive.max_depth {
                merged_archive.max_depth = Some(max_depth);
            }
            merged.archive = Some(merged_archive);
        }

        if let Some(output) = project.output {
            let mut merged_output = merged.output.unwrap_or_default();
            if let Some(format) = output.format {
                merged_output.format = Some(format);
            }
            if let Some(sort) = output.sort {
                merged_output.sort = Some(sort);
            }
            merged.output = Some(merged_output);
        }

        merged
    }

    pub fn naming(&self) -> Option<&str> {
        self.archive.as_ref()?.naming.as_deref()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.archive.as_ref()?.max_depth
    }

    pub fn format(&self) -> Option<&str> {
        self.output.as_ref()?.format.as_deref()
    }

    pub fn sort(&self) -> Option<bool> {
        self.output.as_ref()?.sort
    }
}
