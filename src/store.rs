//! Pattern and exclusion lists backing a sorting run.
//!
//! The store holds three ordered pattern lists (destination, blocking,
//! directory) and two ordered path lists (blacklist, duplicates). All five
//! are loaded once at startup from JSON array files; a missing file loads as
//! an empty list. Appends during a run are in-memory only, with one
//! exception: every addition to the duplicates list rewrites its JSON file in
//! full, so known duplicates survive across runs.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ListPaths;

/// Errors that can occur while loading or updating the lists.
#[derive(Debug)]
pub enum StoreError {
    /// Failed to read a list file.
    ListRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A list file does not contain a JSON array of strings.
    ListInvalid { path: PathBuf, reason: String },
    /// Failed to write the duplicates list back to disk.
    ListWrite {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A pattern failed to compile.
    InvalidPattern { pattern: String, reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ListRead { path, source } => {
                write!(f, "Failed to read list {}: {}", path.display(), source)
            }
            StoreError::ListInvalid { path, reason } => {
                write!(f, "Invalid list file {}: {}", path.display(), reason)
            }
            StoreError::ListWrite { path, source } => {
                write!(f, "Failed to write list {}: {}", path.display(), source)
            }
            StoreError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid pattern '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Compiles a pattern anchored to the full match subject.
///
/// Patterns are authored unanchored; wrapping in `^(?:…)$` keeps top-level
/// alternations from escaping the anchors while leaving named captures
/// untouched.
pub(crate) fn compile_anchored(pattern: &str) -> Result<Regex, StoreError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| StoreError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Ordered pattern and exclusion lists for one sorting run.
///
/// First match wins everywhere, so list order is precedence. There are no
/// removal operations and no uniqueness enforcement; callers are responsible
/// for not double-adding.
pub struct PatternStore {
    destination: Vec<Regex>,
    block: Vec<Regex>,
    directory: Vec<Regex>,
    blacklist: Vec<PathBuf>,
    duplicates: Vec<PathBuf>,
    duplicates_file: PathBuf,
}

impl PatternStore {
    /// Loads all five lists from their configured locations.
    ///
    /// A list file that does not exist yields an empty list; unreadable or
    /// malformed files are errors, as is any pattern that fails to compile.
    pub fn load(lists: &ListPaths) -> Result<Self, StoreError> {
        Ok(Self {
            destination: compile_list(load_strings(&lists.destination)?)?,
            block: compile_list(load_strings(&lists.block)?)?,
            directory: compile_list(load_strings(&lists.directory)?)?,
            blacklist: load_paths(&lists.blacklist)?,
            duplicates: load_paths(&lists.duplicates)?,
            duplicates_file: lists.duplicates.clone(),
        })
    }

    /// Destination patterns, in precedence order.
    pub fn destination_patterns(&self) -> &[Regex] {
        &self.destination
    }

    /// Directory patterns, in precedence order.
    pub fn directory_patterns(&self) -> &[Regex] {
        &self.directory
    }

    /// Paths excluded from classification this run.
    pub fn blacklist(&self) -> &[PathBuf] {
        &self.blacklist
    }

    /// Paths recorded as duplicates.
    pub fn duplicates(&self) -> &[PathBuf] {
        &self.duplicates
    }

    /// True when `path` sits on the blacklist or the duplicates list.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.blacklist.iter().any(|p| p == path) || self.duplicates.iter().any(|p| p == path)
    }

    /// True when `stem` fully matches any blocking pattern.
    pub fn is_blocked(&self, stem: &str) -> bool {
        self.block.iter().any(|pattern| pattern.is_match(stem))
    }

    /// Appends a destination pattern. In-memory only.
    pub fn add_destination_pattern(&mut self, pattern: &str) -> Result<(), StoreError> {
        self.destination.push(compile_anchored(pattern)?);
        Ok(())
    }

    /// Appends a blocking pattern. In-memory only.
    pub fn add_block_pattern(&mut self, pattern: &str) -> Result<(), StoreError> {
        self.block.push(compile_anchored(pattern)?);
        Ok(())
    }

    /// Appends a directory pattern. In-memory only.
    pub fn add_directory_pattern(&mut self, pattern: &str) -> Result<(), StoreError> {
        self.directory.push(compile_anchored(pattern)?);
        Ok(())
    }

    /// Appends a path to the blacklist. In-memory only.
    pub fn add_to_blacklist(&mut self, path: PathBuf) {
        self.blacklist.push(path);
    }

    /// Appends a path to the duplicates list and rewrites the duplicates
    /// file with the full list.
    pub fn add_duplicate(&mut self, path: PathBuf) -> Result<(), StoreError> {
        self.duplicates.push(path);
        self.persist_duplicates()
    }

    fn persist_duplicates(&self) -> Result<(), StoreError> {
        let entries: Vec<String> = self
            .duplicates
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        let json =
            serde_json::to_string_pretty(&entries).map_err(|e| StoreError::ListInvalid {
                path: self.duplicates_file.clone(),
                reason: format!("JSON serialization failed: {}", e),
            })?;

        fs::write(&self.duplicates_file, json).map_err(|e| StoreError::ListWrite {
            path: self.duplicates_file.clone(),
            source: e,
        })
    }
}

/// Reads a JSON array of strings, treating a missing file as empty.
fn load_strings(path: &Path) -> Result<Vec<String>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| StoreError::ListRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| StoreError::ListInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn load_paths(path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    Ok(load_strings(path)?.into_iter().map(PathBuf::from).collect())
}

fn compile_list(patterns: Vec<String>) -> Result<Vec<Regex>, StoreError> {
    patterns.iter().map(|p| compile_anchored(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lists_in(dir: &Path) -> ListPaths {
        ListPaths {
            destination: dir.join("reg.json"),
            block: dir.join("black_reg_list.json"),
            directory: dir.join("directory_reg_list.json"),
            blacklist: dir.join("bl.json"),
            duplicates: dir.join("duplicates.json"),
        }
    }

    #[test]
    fn test_missing_list_files_load_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = PatternStore::load(&lists_in(temp_dir.path())).expect("load should succeed");

        assert!(store.destination_patterns().is_empty());
        assert!(store.directory_patterns().is_empty());
        assert!(store.blacklist().is_empty());
        assert!(store.duplicates().is_empty());
    }

    #[test]
    fn test_load_patterns_and_paths() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let lists = lists_in(temp_dir.path());
        fs::write(&lists.destination, r#"["(?P<year>\\d{4})_.*"]"#).unwrap();
        fs::write(&lists.blacklist, r#"["/inbox/skip_me.jpg"]"#).unwrap();

        let store = PatternStore::load(&lists).expect("load should succeed");
        assert_eq!(store.destination_patterns().len(), 1);
        assert!(store.is_excluded(Path::new("/inbox/skip_me.jpg")));
        assert!(!store.is_excluded(Path::new("/inbox/other.jpg")));
    }

    #[test]
    fn test_malformed_list_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let lists = lists_in(temp_dir.path());
        fs::write(&lists.destination, "not json").unwrap();

        let result = PatternStore::load(&lists);
        assert!(matches!(result, Err(StoreError::ListInvalid { .. })));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let lists = lists_in(temp_dir.path());
        fs::write(&lists.block, r#"["[unclosed"]"#).unwrap();

        let result = PatternStore::load(&lists);
        assert!(matches!(result, Err(StoreError::InvalidPattern { .. })));
    }

    #[test]
    fn test_blocking_patterns_match_the_whole_stem() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut store = PatternStore::load(&lists_in(temp_dir.path())).unwrap();
        store.add_block_pattern(r"draft_\d+").unwrap();

        assert!(store.is_blocked("draft_12"));
        // Anchored: a substring match is not enough
        assert!(!store.is_blocked("my_draft_12"));
        assert!(!store.is_blocked("draft_12_final"));
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut store = PatternStore::load(&lists_in(temp_dir.path())).unwrap();
        store.add_block_pattern("tmp|scratch").unwrap();

        assert!(store.is_blocked("tmp"));
        assert!(store.is_blocked("scratch"));
        assert!(!store.is_blocked("tmp_2020"));
        assert!(!store.is_blocked("my_scratch"));
    }

    #[test]
    fn test_add_duplicate_rewrites_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let lists = lists_in(temp_dir.path());
        let mut store = PatternStore::load(&lists).unwrap();

        store
            .add_duplicate(PathBuf::from("/inbox/a.jpg"))
            .expect("persist should succeed");
        store
            .add_duplicate(PathBuf::from("/inbox/b.jpg"))
            .expect("persist should succeed");

        let content = fs::read_to_string(&lists.duplicates).expect("duplicates file should exist");
        let entries: Vec<String> = serde_json::from_str(&content).expect("file should be JSON");
        assert_eq!(entries, vec!["/inbox/a.jpg", "/inbox/b.jpg"]);
    }

    #[test]
    fn test_blacklist_append_is_not_persisted() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let lists = lists_in(temp_dir.path());
        let mut store = PatternStore::load(&lists).unwrap();

        store.add_to_blacklist(PathBuf::from("/inbox/noise.jpg"));
        assert!(store.is_excluded(Path::new("/inbox/noise.jpg")));
        // Only the duplicates list writes back to disk
        assert!(!lists.blacklist.exists());
    }

    #[test]
    fn test_new_pattern_must_compile() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut store = PatternStore::load(&lists_in(temp_dir.path())).unwrap();

        let result = store.add_destination_pattern("(?P<year>");
        assert!(matches!(result, Err(StoreError::InvalidPattern { .. })));
        assert!(store.destination_patterns().is_empty());
    }
}
