//! Command line front end for `fixproj-core`.

pub mod cli;
pub mod config;
pub mod interactive;
pub mod output;

pub use cli::{FixprojCli, EXIT_CHANGED, EXIT_CLEAN};
pub use interactive::{conflict_resolver, is_interactive, PromptResolver};
