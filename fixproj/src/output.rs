//! Console report, in the wording operators of the tool are used to.

use colored::*;
use fixproj_core::{FileReport, RunSummary};

pub fn preview_banner() -> String {
    format!("{}\n", "*** PREVIEW ONLY! DON'T PANIC!".yellow().bold())
}

pub fn processing(path: &std::path::Path) -> String {
    format!("{} {}", "Processing:".cyan(), path.display())
}

/// The per-file verdict, followed by every change record when verbose.
pub fn file_result(report: &FileReport, verbose: bool) -> String {
    let mut output = String::new();
    if verbose {
        for change in &report.changes {
            output.push_str(&format!("    {}\n", change.dimmed()));
        }
    }
    if report.changed {
        output.push_str(&format!(
            "  {}\n",
            format!("{} CHANGES", report.changes.len()).green().bold()
        ));
    } else {
        output.push_str(&format!("  {}\n", "NO CHANGES".bright_black()));
    }
    output
}

pub fn summary(summary: &RunSummary, preview: bool) -> String {
    if preview {
        format!(
            "\n{} {} files would have been changed given your criteria.",
            "Preview:".yellow().bold(),
            summary.changed.len()
        )
    } else {
        format!(
            "\n{} {} sanitized files.",
            "Saved".green().bold(),
            summary.written
        )
    }
}
