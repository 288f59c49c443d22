//! Rule engine that normalizes MSBuild project files.
//!
//! A [`Processor`] walks a directory, hands every project file to the
//! template of its dialect (legacy framework-style or SDK-style), runs the
//! configured cleanup rules and writes back only the documents that changed.

use std::path::PathBuf;

pub mod conflict;
pub mod constants;
pub mod dialect;
pub mod element;
pub mod entity;
pub mod options;
pub mod processor;
pub mod scan;
pub mod template;
pub mod xml;

pub use conflict::{ConflictChoice, ConflictResolver, FixedResolver, RejectingResolver};
pub use dialect::{load_template, select_dialect, Dialect};
pub use entity::ItemGroupEntity;
pub use options::{load_config, save_config, FixOptions};
pub use processor::{FileReport, ProcessedFile, Processor, RunEvent, RunSummary};
pub use scan::find_project_files;
pub use template::{ChangeLog, ProjectTemplate};
pub use xml::{Attribute, Document, Element, Node};

#[derive(Debug, thiserror::Error)]
pub enum FixprojError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document {} is not valid: {reason}", path.display())]
    DocumentInvalid { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file mask: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, FixprojError>;
