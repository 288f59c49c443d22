use crate::template::is_under_packages;
use crate::{FixprojError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Lists the project files below `root` whose file name matches `mask`.
///
/// Without `recursive` only the directory itself is searched. Anything
/// inside a `packages` folder is vendored and skipped. The result is sorted
/// so runs are reproducible.
pub fn find_project_files(root: &Path, mask: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(FixprojError::InvalidArgument(format!(
            "Target directory {} does not exist",
            root.display()
        )));
    }

    let pattern = Pattern::new(mask)?;
    let mut walker = WalkDir::new(root).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !pattern.matches(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if is_under_packages(relative) {
            debug!("Skipping vendored {}", entry.path().display());
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();
    Ok(files)
}
