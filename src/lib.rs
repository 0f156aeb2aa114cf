//! picsort - sort pictures into a date-structured archive
//!
//! Entries from an inbox tree are matched against ordered regular expressions
//! with named `year`/`month`/`day` captures; matches are moved under
//! `<archive>/<year>` or `<archive>/<year>/<year>_<month>_<day>`. Name
//! collisions are recorded as duplicates instead of overwritten, and
//! unmatched entries can train the pattern set interactively during a run.

pub mod cli;
pub mod config;
pub mod output;
pub mod prompt;
pub mod resolver;
pub mod sorter;
pub mod store;

pub use config::{ConfigError, SortConfig};
pub use resolver::{ResolveError, Resolver};
pub use sorter::{SortError, SortReport, Sorter};
pub use store::{PatternStore, StoreError};

pub use cli::{RunOptions, run_cli};
