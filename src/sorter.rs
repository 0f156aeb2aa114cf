//! The classification-and-placement engine.
//!
//! A run walks the inbox tree with an explicit FIFO worklist. Each directory
//! is first tried against the directory patterns — a match bulk-moves all of
//! its immediate children — and is otherwise expanded: files are classified
//! individually, subdirectories join the worklist. Classification skips
//! excluded and blocked entries, resolves a destination from the destination
//! patterns, and moves the entry unless the target name already exists, in
//! which case the source is recorded as a duplicate instead of overwritten.
//! Entries matching nothing escalate to the pattern-learning dialog, with a
//! single bounded retry once a new pattern is installed.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputFormatter;
use crate::prompt::{PatternKind, Prompt};
use crate::resolver::Resolver;
use crate::store::{PatternStore, StoreError};

/// Errors that can occur while classifying and moving entries.
///
/// None of these abort a run; the walker reports them and continues with the
/// next entry.
#[derive(Debug)]
pub enum SortError {
    /// Failed to list a directory's entries.
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a destination directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move an entry to its destination.
    MoveFailed {
        entry: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
    /// Failed to update one of the persisted lists.
    Store(StoreError),
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortError::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            SortError::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            SortError::MoveFailed {
                entry,
                destination,
                source,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    entry.display(),
                    destination.display(),
                    source
                )
            }
            SortError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SortError {}

impl From<StoreError> for SortError {
    fn from(err: StoreError) -> Self {
        SortError::Store(err)
    }
}

/// Tally of what a run did, in the order the summary prints it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortReport {
    /// Entries moved into the archive.
    pub moved: usize,
    /// Name collisions recorded on the duplicates list.
    pub duplicates: usize,
    /// Entries excluded during this run (declined or failed escalations).
    pub blacklisted: usize,
    /// Entries skipped because they were already excluded or blocked.
    pub skipped: usize,
    /// Entries that were neither a file nor a directory.
    pub unidentified: usize,
    /// Errors reported along the way.
    pub errors: usize,
}

/// Outcome of a single classification attempt.
enum Outcome {
    /// The entry was moved, skipped, or recorded; nothing left to do.
    Done,
    /// No destination was found. A validation failure forces the
    /// pattern-learning dialog even on unattended runs.
    Unmatched { force_prompt: bool },
}

enum MoveOutcome {
    Moved,
    Duplicate,
}

/// Drives classification over an inbox tree.
pub struct Sorter<P: Prompt> {
    store: PatternStore,
    resolver: Resolver,
    prompt: P,
    allow_prompt: bool,
}

impl<P: Prompt> Sorter<P> {
    pub fn new(store: PatternStore, resolver: Resolver, prompt: P, allow_prompt: bool) -> Self {
        Self {
            store,
            resolver,
            prompt,
            allow_prompt,
        }
    }

    /// The pattern store as mutated by the run so far.
    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    /// Walks the tree under `inbox` and classifies everything reachable.
    ///
    /// The worklist is seeded with `inbox` itself and drains in FIFO order;
    /// subdirectories of expanded directories join the back of the list, so
    /// arbitrarily deep trees never touch the call stack.
    pub fn run(&mut self, inbox: &Path) -> SortReport {
        let mut report = SortReport::default();
        let mut pending = VecDeque::new();
        pending.push_back(inbox.to_path_buf());

        while let Some(dir) = pending.pop_front() {
            if self.classify_directory(&dir, &mut report) {
                continue;
            }

            match self.directory_entries(&dir, &mut report) {
                Ok((files, subdirs)) => {
                    pending.extend(subdirs);
                    for file in files {
                        self.classify_file(&file, &mut report);
                    }
                }
                Err(err) => {
                    OutputFormatter::error(&err.to_string());
                    report.errors += 1;
                }
            }
        }

        report
    }

    /// Tries directory-level classification.
    ///
    /// Returns true when the directory matched a directory pattern and was
    /// handled by a bulk move; a handled directory is never expanded into
    /// per-file classification. A validation failure on the directory name is
    /// reported and the directory falls through to normal expansion.
    fn classify_directory(&mut self, dir: &Path, report: &mut SortReport) -> bool {
        let destination = match self
            .resolver
            .resolve(dir, self.store.directory_patterns())
        {
            Ok(Some(destination)) => destination,
            Ok(None) => return false,
            Err(err) => {
                OutputFormatter::error(&err.to_string());
                report.errors += 1;
                return false;
            }
        };

        if let Err(err) = self.bulk_move(dir, &destination, report) {
            OutputFormatter::error(&err.to_string());
            report.errors += 1;
        }

        true
    }

    /// Moves every immediate child of `dir` into `destination`.
    ///
    /// Children colliding with an existing name at the destination go to the
    /// duplicates list; a per-child failure is reported without stopping the
    /// rest of the batch.
    fn bulk_move(
        &mut self,
        dir: &Path,
        destination: &Path,
        report: &mut SortReport,
    ) -> Result<(), SortError> {
        fs::create_dir_all(destination).map_err(|e| SortError::DirectoryCreationFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;

        let children: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| SortError::ReadDirFailed {
                path: dir.to_path_buf(),
                source: e,
            })?
            .flatten()
            .map(|entry| entry.path())
            .collect();

        let bar = OutputFormatter::create_progress_bar(children.len() as u64);
        let mut notices = Vec::new();

        for child in children {
            match self.move_entry(&child, destination) {
                Ok(MoveOutcome::Moved) => report.moved += 1,
                Ok(MoveOutcome::Duplicate) => {
                    report.duplicates += 1;
                    notices.push(format!(
                        "{} already exists in {}, recorded as duplicate",
                        child.display(),
                        destination.display()
                    ));
                }
                Err(err) => {
                    report.errors += 1;
                    notices.push(err.to_string());
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        OutputFormatter::success(&format!(
            "Moved contents of {} to {}",
            dir.display(),
            destination.display()
        ));
        for notice in notices {
            OutputFormatter::warning(&notice);
        }

        Ok(())
    }

    /// Classifies a single file, with one bounded retry after escalation.
    ///
    /// The retry applies a freshly learned pattern immediately; if the entry
    /// still matches nothing it is excluded so the run can go on.
    pub fn classify_file(&mut self, path: &Path, report: &mut SortReport) {
        let mut learned = false;
        loop {
            match self.try_classify(path, report) {
                Ok(Outcome::Done) => return,
                Ok(Outcome::Unmatched { force_prompt }) => {
                    if !learned && self.escalate(path, force_prompt, report) {
                        learned = true;
                        continue;
                    }
                    if learned {
                        self.store.add_to_blacklist(path.to_path_buf());
                        report.blacklisted += 1;
                        OutputFormatter::warning(&format!(
                            "Still no matching pattern for {}, excluding it",
                            path.display()
                        ));
                    }
                    return;
                }
                Err(err) => {
                    OutputFormatter::error(&err.to_string());
                    report.errors += 1;
                    return;
                }
            }
        }
    }

    /// A single classification attempt.
    fn try_classify(&mut self, path: &Path, report: &mut SortReport) -> Result<Outcome, SortError> {
        // Already moved by an earlier pass; nothing to do
        if !path.exists() {
            return Ok(Outcome::Done);
        }

        if self.store.is_excluded(path) {
            report.skipped += 1;
            return Ok(Outcome::Done);
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.store.is_blocked(&stem) {
            report.skipped += 1;
            return Ok(Outcome::Done);
        }

        match self
            .resolver
            .resolve(path, self.store.destination_patterns())
        {
            Ok(Some(destination)) => {
                fs::create_dir_all(&destination).map_err(|e| {
                    SortError::DirectoryCreationFailed {
                        path: destination.clone(),
                        source: e,
                    }
                })?;

                match self.move_entry(path, &destination)? {
                    MoveOutcome::Moved => {
                        report.moved += 1;
                        OutputFormatter::success(&format!(
                            "Moved {} to {}",
                            path.display(),
                            destination.display()
                        ));
                    }
                    MoveOutcome::Duplicate => {
                        report.duplicates += 1;
                        OutputFormatter::warning(&format!(
                            "{} already exists in {}, recorded as duplicate",
                            path.display(),
                            destination.display()
                        ));
                    }
                }
                Ok(Outcome::Done)
            }
            Ok(None) => {
                OutputFormatter::warning(&format!(
                    "No matching pattern for {}",
                    path.display()
                ));
                Ok(Outcome::Unmatched {
                    force_prompt: false,
                })
            }
            Err(err) => {
                OutputFormatter::error(&err.to_string());
                report.errors += 1;
                Ok(Outcome::Unmatched { force_prompt: true })
            }
        }
    }

    /// Runs the pattern-learning dialog for an unmatched entry.
    ///
    /// Returns true when a new pattern was installed and classification
    /// should retry. Declined, disallowed or failed dialogs exclude the entry
    /// for the rest of the run instead.
    fn escalate(&mut self, path: &Path, force_prompt: bool, report: &mut SortReport) -> bool {
        if (self.allow_prompt || force_prompt)
            && self.prompt.wants_new_pattern().unwrap_or(false)
            && self.learn_pattern(report)
        {
            return true;
        }

        self.store.add_to_blacklist(path.to_path_buf());
        report.blacklisted += 1;
        OutputFormatter::warning(&format!("Excluded {} for this run", path.display()));
        false
    }

    /// Reads one pattern from the dialog and installs it in the store.
    fn learn_pattern(&mut self, report: &mut SortReport) -> bool {
        let Ok(kind) = self.prompt.pattern_kind() else {
            return false;
        };
        let Ok(text) = self.prompt.read_pattern(kind) else {
            return false;
        };

        let added = match kind {
            PatternKind::Destination => self.store.add_destination_pattern(&text),
            PatternKind::Block => self.store.add_block_pattern(&text),
        };

        match added {
            Ok(()) => true,
            Err(err) => {
                OutputFormatter::error(&err.to_string());
                report.errors += 1;
                false
            }
        }
    }

    /// Lists a directory's children, split into files and subdirectories.
    ///
    /// Anything that is neither (symlinks, sockets, and friends) is reported
    /// and ignored.
    fn directory_entries(
        &self,
        dir: &Path,
        report: &mut SortReport,
    ) -> Result<(Vec<PathBuf>, Vec<PathBuf>), SortError> {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();

        let entries = fs::read_dir(dir).map_err(|e| SortError::ReadDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(kind) if kind.is_file() => files.push(path),
                Ok(kind) if kind.is_dir() => subdirs.push(path),
                _ => {
                    report.unidentified += 1;
                    OutputFormatter::warning(&format!(
                        "{} is neither a file nor a directory, ignoring it",
                        path.display()
                    ));
                }
            }
        }

        Ok((files, subdirs))
    }

    /// Moves `entry` into `destination`, refusing to overwrite.
    ///
    /// A name collision records `entry` on the duplicates list (persisted)
    /// and leaves both files untouched. The explicit existence check stands
    /// in for the overwrite `rename` would do; safe because exactly one
    /// process runs against an archive.
    fn move_entry(&mut self, entry: &Path, destination: &Path) -> Result<MoveOutcome, SortError> {
        let name = entry.file_name().ok_or_else(|| SortError::MoveFailed {
            entry: entry.to_path_buf(),
            destination: destination.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "entry has no name component",
            ),
        })?;

        let target = destination.join(name);
        if target.exists() {
            self.store.add_duplicate(entry.to_path_buf())?;
            return Ok(MoveOutcome::Duplicate);
        }

        fs::rename(entry, &target).map_err(|e| SortError::MoveFailed {
            entry: entry.to_path_buf(),
            destination: target.clone(),
            source: e,
        })?;

        Ok(MoveOutcome::Moved)
    }
}
