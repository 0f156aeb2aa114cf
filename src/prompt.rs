//! Console prompts for the pattern-learning dialog.
//!
//! When an entry matches nothing the sorter can ask the operator for a new
//! pattern on the spot. The dialog sits behind the [`Prompt`] trait so the
//! engine can be driven by a scripted implementation in tests; the production
//! implementation uses `dialoguer` widgets.

use dialoguer::{Confirm, Input, Select};
use std::io;

/// Which list a newly authored pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// A "white" pattern: matching entries are moved to a destination.
    Destination,
    /// A "black" pattern: matching entries are skipped.
    Block,
}

/// The escalation dialog, one question per method.
///
/// Implementations report IO failures (for example a missing terminal); the
/// sorter treats any failure as a declined prompt.
pub trait Prompt {
    /// Whether the operator wants to author a pattern for the current entry.
    fn wants_new_pattern(&mut self) -> io::Result<bool>;

    /// Whether the new pattern blocks entries or routes them to a destination.
    fn pattern_kind(&mut self) -> io::Result<PatternKind>;

    /// Reads the pattern text itself.
    fn read_pattern(&mut self, kind: PatternKind) -> io::Result<String>;
}

/// Interactive prompt backed by the terminal.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn wants_new_pattern(&mut self) -> io::Result<bool> {
        Confirm::new()
            .with_prompt("Define a pattern for this entry now?")
            .default(false)
            .interact()
            .map_err(into_io)
    }

    fn pattern_kind(&mut self) -> io::Result<PatternKind> {
        let choice = Select::new()
            .with_prompt("Pattern kind")
            .items(&["destination (move matches)", "blocking (skip matches)"])
            .default(0)
            .interact()
            .map_err(into_io)?;

        Ok(if choice == 1 {
            PatternKind::Block
        } else {
            PatternKind::Destination
        })
    }

    fn read_pattern(&mut self, kind: PatternKind) -> io::Result<String> {
        let label = match kind {
            PatternKind::Destination => "Destination pattern",
            PatternKind::Block => "Blocking pattern",
        };

        Input::new()
            .with_prompt(label)
            .interact_text()
            .map_err(into_io)
    }
}

fn into_io(err: dialoguer::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}
