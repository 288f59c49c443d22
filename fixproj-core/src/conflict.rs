//! Choosing what to do with an item that is both embedded and copied.
//!
//! The legacy rules cannot settle this conflict on their own, so the
//! decision is delegated to a [`ConflictResolver`] supplied by the caller.
//! The command line asks the operator; tests and unattended runs pass a
//! fixed policy.

use crate::{FixprojError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictChoice {
    /// Keep the embedded resource and drop the copy directive.
    Embed,
    /// Turn the item into content copied if newer.
    Content,
    /// Leave the item untouched.
    Skip,
}

impl ConflictChoice {
    /// Accepts `E`, `C` or `S` (or the full word) in any case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "e" | "embed" => Some(ConflictChoice::Embed),
            "c" | "content" => Some(ConflictChoice::Content),
            "s" | "skip" => Some(ConflictChoice::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictChoice::Embed => write!(f, "embed"),
            ConflictChoice::Content => write!(f, "content"),
            ConflictChoice::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for ConflictChoice {
    type Err = FixprojError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            FixprojError::InvalidArgument(format!(
                "Invalid conflict choice: '{}'. Use 'embed', 'content' or 'skip'",
                s
            ))
        })
    }
}

pub trait ConflictResolver {
    /// Decide the fate of an `EmbeddedResource` that also asks to be copied
    /// to the output directory. `include` is the item's include value.
    fn resolve(&mut self, include: &str) -> Result<ConflictChoice>;
}

/// Answers every conflict the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub ConflictChoice);

impl ConflictResolver for FixedResolver {
    fn resolve(&mut self, _include: &str) -> Result<ConflictChoice> {
        Ok(self.0)
    }
}

/// Fails the run on the first conflict. Used when there is no terminal to
/// prompt on and no policy was configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingResolver;

impl ConflictResolver for RejectingResolver {
    fn resolve(&mut self, include: &str) -> Result<ConflictChoice> {
        Err(FixprojError::InvalidArgument(format!(
            "EmbeddedResource {} also asks to be copied to the output folder; \
             rerun interactively or pass --on-conflict",
            include
        )))
    }
}

impl<F> ConflictResolver for F
where
    F: FnMut(&str) -> Result<ConflictChoice>,
{
    fn resolve(&mut self, include: &str) -> Result<ConflictChoice> {
        self(include)
    }
}
