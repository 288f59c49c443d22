use console::style;
use dialoguer::Input;
use fixproj_core::{
    ConflictChoice, ConflictResolver, FixedResolver, FixprojError, RejectingResolver,
};
use std::io::{self, IsTerminal};

/// Detects if we're running in an interactive TTY
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Asks the operator about every embedded-resource/copy conflict and keeps
/// asking until the answer is `E`, `C` or `S`.
#[derive(Debug, Default)]
pub struct PromptResolver;

impl ConflictResolver for PromptResolver {
    fn resolve(&mut self, include: &str) -> fixproj_core::Result<ConflictChoice> {
        println!(
            "{} {} claims it also wants to be copied to the output folder.",
            style("EmbeddedResource").yellow().bold(),
            include
        );

        loop {
            let answer = Input::<String>::new()
                .with_prompt(format!(
                    "{}",
                    style("→ Keep it an (E)mbeddedResource, change it to (C)ontent with PreserveNewest, or (S)kip?").cyan()
                ))
                .interact_text();

            match answer {
                Ok(value) => match ConflictChoice::parse(&value) {
                    Some(choice) => return Ok(choice),
                    None => eprintln!("{}", style("  ✗ Answer E, C or S").red()),
                },
                Err(e) if is_eof_error(&e) => {
                    return Err(FixprojError::Prompt("Cancelled by user".to_string()));
                }
                Err(e) => return Err(FixprojError::Prompt(e.to_string())),
            }
        }
    }
}

/// Picks how conflicts get answered for this run: a configured policy wins,
/// then the prompt when a terminal is attached, otherwise the run fails on
/// the first conflict.
pub fn conflict_resolver(policy: Option<ConflictChoice>) -> Box<dyn ConflictResolver> {
    resolver_for(policy, is_interactive())
}

fn resolver_for(policy: Option<ConflictChoice>, interactive: bool) -> Box<dyn ConflictResolver> {
    match policy {
        Some(choice) => Box::new(FixedResolver(choice)),
        None if interactive => Box::new(PromptResolver),
        None => Box::new(RejectingResolver),
    }
}

fn is_eof_error(error: &dyn std::error::Error) -> bool {
    error.to_string().contains("EOF")
        || error.to_string().contains("end of file")
        || error.to_string().contains("Ctrl+D")
}
