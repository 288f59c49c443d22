use crate::conflict::ConflictChoice;
use crate::{FixprojError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional settings file looked up in the target directory.
pub const CONFIG_FILE_NAME: &str = ".fixproj.yaml";

/// Settings for one run. Built once by the caller and handed to the
/// [`Processor`](crate::Processor), which clones it into every template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FixOptions {
    pub delete_duplicates: bool,
    pub delete_references_to_non_existent_files: bool,
    pub file_mask: String,
    pub fix_content: bool,
    /// Compute and report, never write.
    pub preview: bool,
    pub recursive: bool,
    pub sort: bool,
    pub target_directory: PathBuf,
    pub verbose: bool,
    /// Copy the original to `<file>.bak` before overwriting it.
    pub backup: bool,
    /// Comma separated globs of sources to add when missing (legacy projects).
    pub add_compile_files: Option<String>,
    pub add_content_files: Option<String>,
    pub add_embedded_resource_files: Option<String>,
    /// Answer for embedded-resource/copy conflicts when nobody can be asked.
    pub on_conflict: Option<ConflictChoice>,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            delete_duplicates: false,
            delete_references_to_non_existent_files: false,
            file_mask: "*.csproj".to_string(),
            fix_content: false,
            preview: false,
            recursive: false,
            sort: false,
            target_directory: PathBuf::from("."),
            verbose: false,
            backup: false,
            add_compile_files: None,
            add_content_files: None,
            add_embedded_resource_files: None,
            on_conflict: None,
        }
    }
}

impl FixOptions {
    /// Every rule switched on.
    pub fn all_rules() -> Self {
        Self {
            delete_duplicates: true,
            delete_references_to_non_existent_files: true,
            fix_content: true,
            sort: true,
            ..Self::default()
        }
    }

    pub fn with_target<P: Into<PathBuf>>(mut self, target: P) -> Self {
        self.target_directory = target.into();
        self
    }
}

/// Splits a comma separated glob list, dropping empty entries.
pub fn split_globs(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|glob| !glob.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FixOptions> {
    let content = std::fs::read_to_string(path)?;

    // Try to parse as YAML first, then JSON
    if let Ok(options) = serde_yaml::from_str::<FixOptions>(&content) {
        Ok(options)
    } else if let Ok(options) = serde_json::from_str::<FixOptions>(&content) {
        Ok(options)
    } else {
        Err(FixprojError::Config(
            "Failed to parse fixproj configuration as YAML or JSON".to_string(),
        ))
    }
}

pub fn save_config<P: AsRef<Path>>(path: P, options: &FixOptions) -> Result<()> {
    let yaml = serde_yaml::to_string(options)
        .map_err(|err| FixprojError::Config(err.to_string()))?;
    std::fs::write(path, yaml)?;
    Ok(())
}
