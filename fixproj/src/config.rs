use anyhow::{Context, Result};
use clap::ArgMatches;
use fixproj_core::options::CONFIG_FILE_NAME;
use fixproj_core::{load_config, ConflictChoice, FixOptions};
use std::path::PathBuf;

/// Builds the run options: the settings file (from `--config`, or
/// `.fixproj.yaml` in the target directory) with the command line on top.
/// Switches only ever turn rules on; values replace the file's.
pub fn resolve_options(matches: &ArgMatches) -> Result<FixOptions> {
    let target = matches.get_one::<PathBuf>("target").cloned();
    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => Some(path.clone()),
        None => {
            let candidate = target
                .clone()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_FILE_NAME);
            candidate.is_file().then_some(candidate)
        }
    };

    let mut options = match &config_path {
        Some(path) => {
            tracing::debug!("Loading settings from {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
        }
        None => FixOptions::default(),
    };

    let switch = |name: &str| matches.get_flag(name);
    options.delete_duplicates |= switch("dedupe");
    options.delete_references_to_non_existent_files |= switch("delete");
    options.fix_content |= switch("fixcontent");
    options.preview |= switch("preview");
    options.recursive |= switch("recursive");
    options.sort |= switch("sort");
    options.verbose |= switch("verbose");
    options.backup |= switch("backup");

    if let Some(target) = target {
        options.target_directory = target;
    }
    if let Some(mask) = matches.get_one::<String>("mask") {
        options.file_mask = mask.clone();
    }
    if let Some(globs) = matches.get_one::<String>("add-compile") {
        options.add_compile_files = Some(globs.clone());
    }
    if let Some(globs) = matches.get_one::<String>("add-content") {
        options.add_content_files = Some(globs.clone());
    }
    if let Some(globs) = matches.get_one::<String>("add-embedded") {
        options.add_embedded_resource_files = Some(globs.clone());
    }
    if let Some(choice) = matches.get_one::<ConflictChoice>("on-conflict") {
        options.on_conflict = Some(*choice);
    }

    Ok(options)
}
