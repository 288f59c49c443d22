use crate::config::resolve_options;
use crate::interactive::conflict_resolver;
use crate::output;
use anyhow::Result;
use clap::{Arg, ArgAction, ColorChoice, Command};
use fixproj_core::{ConflictChoice, FixOptions, Processor, RunEvent, RunSummary};
use std::path::PathBuf;

/// Exit status when every project was already clean.
pub const EXIT_CLEAN: i32 = 0;
/// Exit status when at least one project was (or in preview, would be) rewritten.
pub const EXIT_CHANGED: i32 = 1;

pub struct FixprojCli;

impl FixprojCli {
    pub fn new() -> Self {
        Self
    }

    pub fn build_app(&self) -> Command {
        let styles = clap::builder::styling::Styles::styled()
            .header(clap::builder::styling::AnsiColor::BrightCyan.on_default() | clap::builder::styling::Effects::BOLD)
            .usage(clap::builder::styling::AnsiColor::BrightGreen.on_default() | clap::builder::styling::Effects::BOLD)
            .literal(clap::builder::styling::AnsiColor::BrightWhite.on_default())
            .placeholder(clap::builder::styling::AnsiColor::BrightYellow.on_default())
            .error(clap::builder::styling::AnsiColor::BrightRed.on_default() | clap::builder::styling::Effects::BOLD);

        Command::new("fixproj")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Cleans up MSBuild project files: merges, dedupes, sorts and prunes item groups")
            .styles(styles)
            .color(ColorChoice::Auto)
            .arg(
                Arg::new("target")
                    .short('t')
                    .long("target")
                    .value_name("DIR")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Directory containing the project file, or the root directory to search when recursive"),
            )
            .arg(
                Arg::new("mask")
                    .short('m')
                    .long("mask")
                    .value_name("GLOB")
                    .help("Project search mask [default: *.csproj]"),
            )
            .arg(
                Arg::new("recursive")
                    .short('r')
                    .long("recursive")
                    .action(ArgAction::SetTrue)
                    .help("Search the target directory recursively for project files that match the mask"),
            )
            .arg(
                Arg::new("dedupe")
                    .long("dedupe")
                    .visible_alias("dd")
                    .action(ArgAction::SetTrue)
                    .help("Deduplicate items that have the same identifying attribute"),
            )
            .arg(
                Arg::new("delete")
                    .short('d')
                    .long("delete")
                    .action(ArgAction::SetTrue)
                    .help("Delete references to files that don't exist"),
            )
            .arg(
                Arg::new("fixcontent")
                    .long("fixcontent")
                    .visible_alias("fix")
                    .action(ArgAction::SetTrue)
                    .help("Fix items so they copy, embed and classify correctly based on type"),
            )
            .arg(
                Arg::new("sort")
                    .short('s')
                    .long("sort")
                    .action(ArgAction::SetTrue)
                    .help("Sort items by their identifying attribute and properties by name"),
            )
            .arg(
                Arg::new("preview")
                    .short('p')
                    .long("preview")
                    .action(ArgAction::SetTrue)
                    .help("Preview the changes that would be made without making them"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::SetTrue)
                    .help("List every change and enable debug logging"),
            )
            .arg(
                Arg::new("backup")
                    .long("backup")
                    .action(ArgAction::SetTrue)
                    .help("Copy each project to <file>.bak before rewriting it"),
            )
            .arg(
                Arg::new("add-compile")
                    .long("add-compile")
                    .value_name("GLOBS")
                    .help("Comma separated globs of source files to declare when missing (legacy projects)"),
            )
            .arg(
                Arg::new("add-content")
                    .long("add-content")
                    .value_name("GLOBS")
                    .help("Comma separated globs of content files to declare when missing (legacy projects)"),
            )
            .arg(
                Arg::new("add-embedded")
                    .long("add-embedded")
                    .value_name("GLOBS")
                    .help("Comma separated globs of embedded resources to declare when missing (legacy projects)"),
            )
            .arg(
                Arg::new("on-conflict")
                    .long("on-conflict")
                    .value_name("CHOICE")
                    .value_parser(clap::value_parser!(ConflictChoice))
                    .help("Answer for embedded resources that also ask to be copied: embed, content or skip"),
            )
            .arg(
                Arg::new("config")
                    .long("config")
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Settings file [default: <target>/.fixproj.yaml]"),
            )
    }

    /// Parses the arguments, processes every matching project and returns
    /// the exit status.
    pub fn run(&self, args: Vec<String>) -> Result<i32> {
        let matches = self.build_app().try_get_matches_from(args)?;
        let options = resolve_options(&matches)?;
        self.init_logging(options.verbose);

        let summary = self.execute(&options)?;
        Ok(if summary.has_changes() {
            EXIT_CHANGED
        } else {
            EXIT_CLEAN
        })
    }

    fn execute(&self, options: &FixOptions) -> Result<RunSummary> {
        if options.preview {
            println!("{}", output::preview_banner());
        }

        let mut resolver = conflict_resolver(options.on_conflict);
        let summary = Processor::new(options).run_with(resolver.as_mut(), |event| match event {
            RunEvent::Started(path) => println!("{}", output::processing(path)),
            RunEvent::Finished(report) => println!("{}", output::file_result(report, options.verbose)),
        })?;
        println!("{}", output::summary(&summary, options.preview));
        Ok(summary)
    }

    fn init_logging(&self, verbose: bool) {
        use tracing_subscriber::{fmt, EnvFilter};

        let default = if verbose { "fixproj=debug,fixproj_core=debug" } else { "fixproj=warn,fixproj_core=warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        // a second run in the same process keeps the first subscriber
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

impl Default for FixprojCli {
    fn default() -> Self {
        Self::new()
    }
}
