//! Drives the rule pipeline over every project file of a run.

use crate::conflict::ConflictResolver;
use crate::dialect::{load_template, Dialect};
use crate::options::FixOptions;
use crate::scan::find_project_files;
use crate::template::ProjectTemplate;
use crate::xml::Document;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What happened to one project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub dialect: Dialect,
    /// Change records in the order the rules produced them.
    pub changes: Vec<String>,
    /// Whether the rewritten document differs from the file on disk.
    pub changed: bool,
}

/// A processed file together with its rewritten document.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub report: FileReport,
    pub document: Document,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub changed: Vec<FileReport>,
    /// Files actually written; always zero in preview mode.
    pub written: usize,
}

impl RunSummary {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Progress of a run, reported per file as it happens.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'r> {
    /// About to process this file; conflict prompts for it follow.
    Started(&'r Path),
    Finished(&'r FileReport),
}

pub struct Processor<'a> {
    options: &'a FixOptions,
}

impl<'a> Processor<'a> {
    pub fn new(options: &'a FixOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FixOptions {
        self.options
    }

    /// Candidate files for this run.
    pub fn project_files(&self) -> Result<Vec<PathBuf>> {
        find_project_files(
            &self.options.target_directory,
            &self.options.file_mask,
            self.options.recursive,
        )
    }

    /// Processes every candidate file, then writes the changed ones.
    ///
    /// Nothing is written unless every file parsed and processed cleanly.
    pub fn run(&self, resolver: &mut dyn ConflictResolver) -> Result<RunSummary> {
        self.run_with(resolver, |_| {})
    }

    /// Same as [`Processor::run`], calling `on_event` before and after
    /// each file.
    pub fn run_with<F>(&self, resolver: &mut dyn ConflictResolver, mut on_event: F) -> Result<RunSummary>
    where
        F: FnMut(RunEvent<'_>),
    {
        let files = self.project_files()?;
        info!("Found {} project files", files.len());

        let mut processed = Vec::with_capacity(files.len());
        for path in &files {
            on_event(RunEvent::Started(path));
            let file = self.process_file(path, resolver)?;
            on_event(RunEvent::Finished(&file.report));
            processed.push(file);
        }

        let written = self.save_changes(&processed)?;
        Ok(RunSummary {
            processed: processed.len(),
            changed: processed
                .into_iter()
                .filter(|file| file.report.changed)
                .map(|file| file.report)
                .collect(),
            written,
        })
    }

    pub fn process_file(
        &self,
        path: &Path,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<ProcessedFile> {
        info!("Processing: {}", path.display());
        let (original, template) = load_template(path, self.options)?;
        self.apply(path, original, template, resolver)
    }

    /// Runs the pipeline over an already parsed document.
    pub fn process_document(
        &self,
        path: &Path,
        document: Document,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<ProcessedFile> {
        let dialect = crate::dialect::select_dialect(&document);
        let template = dialect.template(path, document.clone(), self.options);
        self.apply(path, document, template, resolver)
    }

    fn apply(
        &self,
        path: &Path,
        original: Document,
        mut template: Box<dyn ProjectTemplate>,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<ProcessedFile> {
        let options = self.options;
        let dialect = template.dialect();
        debug!("{} uses {} rules", path.display(), dialect);

        let mut entities = if options.fix_content {
            template.fix_content(resolver)?
        } else {
            Vec::new()
        };

        if options.sort {
            template.sort_property_groups();
        }

        entities.sort_by(|a, b| a.local_name.cmp(&b.local_name));
        for mut entity in entities {
            if options.delete_duplicates {
                template.delete_duplicates(&mut entity)?;
            }
            if options.delete_references_to_non_existent_files {
                template.delete_references_to_non_existent_files(&mut entity)?;
            }
            template.merge_and_sort_item_groups(entity, options.sort)?;
        }

        let changes = template.changes().entries().to_vec();
        let document = template.into_document();
        let changed = document != original;
        if changed {
            info!("{}: {} changes", path.display(), changes.len());
        } else {
            debug!("{}: no changes", path.display());
        }

        Ok(ProcessedFile {
            report: FileReport {
                path: path.to_path_buf(),
                dialect,
                changes,
                changed,
            },
            document,
        })
    }

    /// Writes every changed document, backing up the original first when
    /// asked to. Returns how many files were written.
    pub fn save_changes(&self, files: &[ProcessedFile]) -> Result<usize> {
        if self.options.preview {
            return Ok(0);
        }

        let mut written = 0;
        for file in files.iter().filter(|file| file.report.changed) {
            let path = &file.report.path;
            if self.options.backup {
                let backup = backup_path(path);
                std::fs::copy(path, &backup)?;
                debug!("Backed up {} to {}", path.display(), backup.display());
            }
            file.document.save(path)?;
            written += 1;
        }
        info!("Saved {} sanitized files", written);
        Ok(written)
    }
}

/// `App.csproj` becomes `App.csproj.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
