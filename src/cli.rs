//! Command-line orchestration.
//!
//! Wires the pieces of a run together: load configuration, load the pattern
//! and exclusion lists, walk the inbox, print the summary.

use crate::config::SortConfig;
use crate::output::OutputFormatter;
use crate::prompt::ConsolePrompt;
use crate::resolver::Resolver;
use crate::sorter::Sorter;
use crate::store::PatternStore;
use std::path::PathBuf;

/// Options gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the configured archive root.
    pub root: Option<PathBuf>,
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Enables the pattern-learning dialog for unmatched entries. Off by
    /// default so a first pass can run unattended.
    pub interactive: bool,
}

/// Runs one sorting pass over the configured inbox.
///
/// Errors before the walk starts (unreadable configuration or lists, missing
/// inbox) abort the run; everything after that is reported per entry and the
/// walk continues.
pub fn run_cli(options: &RunOptions) -> Result<(), String> {
    let mut config = SortConfig::load(options.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    if let Some(root) = &options.root {
        config.archive.root = root.clone();
    }

    let store = PatternStore::load(&config.lists)
        .map_err(|e| format!("Error loading pattern lists: {}", e))?;

    let inbox = config.inbox_dir();
    if !inbox.is_dir() {
        return Err(format!(
            "Inbox directory {} does not exist",
            inbox.display()
        ));
    }

    let archive = config.archive_dir();
    OutputFormatter::info(&format!(
        "Sorting {} into {}",
        inbox.display(),
        archive.display()
    ));

    let resolver = Resolver::new(archive, config.rules.start_year, config.rules.end_year);
    let mut sorter = Sorter::new(store, resolver, ConsolePrompt, options.interactive);
    let report = sorter.run(&inbox);

    OutputFormatter::summary_table(&[
        ("Moved", report.moved),
        ("Duplicates", report.duplicates),
        ("Excluded", report.blacklisted),
        ("Skipped", report.skipped),
        ("Unidentified", report.unidentified),
        ("Errors", report.errors),
    ]);

    Ok(())
}
