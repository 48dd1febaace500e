//! Output module for end-of-job reporting
//!
//! This module handles:
//! - Formatting the summary of a delivered job
//! - Printing the planned initial frontier for `--dry-run`

use crate::jobs::{JobOutcome, JobRequest};
use crate::url::{seed_frontier, EntryKind};

/// Formats a job outcome as plain text
///
/// # Arguments
///
/// * `outcome` - The outcome returned by the result stream
/// * `include_log` - Append the job's progress log
///
/// # Returns
///
/// A multi-line summary ending with a newline
pub fn format_summary(outcome: &JobOutcome, include_log: bool) -> String {
    let mut out = String::new();

    out.push_str("=== Export Summary ===\n\n");
    out.push_str(&format!("Job: {}\n", outcome.job_id));
    out.push_str(&format!("State: {}\n", outcome.state));
    out.push_str(&format!("Pages attempted: {}\n", outcome.pages_attempted));
    out.push_str(&format!("Pages exported: {}\n", outcome.pages_exported));
    out.push_str(&format!("Pages skipped: {}\n", outcome.pages_failed));
    out.push_str(&format!("Archive entries: {}\n", outcome.artifacts));
    out.push_str(&format!(
        "Archive size: {} bytes ({:.1} KiB)\n",
        outcome.archive_bytes,
        outcome.archive_bytes as f64 / 1024.0
    ));

    if let Some(error) = &outcome.error {
        out.push_str(&format!("Error: {}\n", error));
    }

    let success_rate = if outcome.pages_attempted > 0 {
        (outcome.pages_exported as f64 / outcome.pages_attempted as f64) * 100.0
    } else {
        0.0
    };
    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} pages)\n",
        success_rate, outcome.pages_exported, outcome.pages_attempted
    ));

    if include_log && !outcome.log.is_empty() {
        out.push_str("\nLog:\n");
        for entry in &outcome.log {
            out.push_str(&format!("  {}\n", entry));
        }
    }

    out
}

/// Prints a job outcome to stdout
pub fn print_summary(outcome: &JobOutcome, include_log: bool) {
    print!("{}", format_summary(outcome, include_log));
}

/// Formats the initial frontier a request would start from
pub fn format_plan(request: &JobRequest) -> String {
    let mut out = String::new();

    out.push_str("=== Export Plan ===\n\n");
    out.push_str(&format!("Seed: {}\n", request.seed.url));
    out.push_str(&format!("Origin: {}\n", request.seed.origin));
    out.push_str(&format!("Scope: {}\n", request.scope));
    out.push_str(&format!("Depth: {}\n", request.max_depth));
    out.push_str(&format!("Max pages: {}\n", request.max_pages));
    out.push_str(&format!("Mode: {}\n", request.mode));
    out.push_str(&format!("Width: {}px\n", request.viewport_width));
    out.push_str(&format!("Delay: {}ms\n", request.page_delay.as_millis()));

    out.push_str("\nInitial frontier:\n");
    for entry in seed_frontier(&request.seed, request.scope) {
        let kind = match entry.kind {
            EntryKind::Ancestor => "ancestor",
            EntryKind::Seed => "seed",
            EntryKind::Descendant => "descendant",
        };
        out.push_str(&format!("  [{}] {} ({})\n", entry.depth, entry.url, kind));
    }

    out
}
