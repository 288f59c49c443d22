//! Picks the rule set for a project file from its root element.

use crate::constants::{SDK_ATTRIBUTE, SDK_MARKER};
use crate::element::attribute_value;
use crate::options::FixOptions;
use crate::template::{LegacyTemplate, ProjectTemplate, SdkTemplate};
use crate::xml::Document;
use crate::Result;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Framework-style projects listing every file.
    Legacy,
    /// `<Project Sdk="Microsoft.NET.Sdk...">` projects.
    Sdk,
}

impl Dialect {
    /// Builds the template for this dialect around a working copy of the
    /// document.
    pub fn template(
        self,
        path: &Path,
        document: Document,
        options: &FixOptions,
    ) -> Box<dyn ProjectTemplate> {
        match self {
            Dialect::Legacy => Box::new(LegacyTemplate::new(path, document, options.clone())),
            Dialect::Sdk => Box::new(SdkTemplate::new(path, document, options.clone())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Legacy => write!(f, "legacy"),
            Dialect::Sdk => write!(f, "sdk"),
        }
    }
}

/// Any `Sdk` attribute starting with `Microsoft.NET.Sdk` (so `.Web`,
/// `.Worker` and friends too) selects the SDK rules.
pub fn select_dialect(document: &Document) -> Dialect {
    match attribute_value(&document.root, SDK_ATTRIBUTE) {
        Some(sdk) if sdk.trim().starts_with(SDK_MARKER) => Dialect::Sdk,
        _ => Dialect::Legacy,
    }
}

/// Loads a project file and returns the untouched original together with
/// the template that will work on its copy.
pub fn load_template(
    path: &Path,
    options: &FixOptions,
) -> Result<(Document, Box<dyn ProjectTemplate>)> {
    let original = Document::load(path)?;
    let dialect = select_dialect(&original);
    let template = dialect.template(path, original.clone(), options);
    Ok((original, template))
}
