//! Run configuration for the sorter.
//!
//! Configuration is stored in TOML and names the archive layout, the location
//! of the JSON-backed pattern and exclusion lists, and the accepted year
//! range for extracted dates.
//!
//! # Configuration File Format
//!
//! ```toml
//! [archive]
//! root = "/mnt/pictures"
//! by_date = "pictures_by_date"
//! inbox = "to_be_sorted"
//!
//! [lists]
//! destination = "reg.json"
//! block = "black_reg_list.json"
//! directory = "directory_reg_list.json"
//! blacklist = "bl.json"
//! duplicates = "duplicates.json"
//!
//! [rules]
//! start_year = 1970
//! end_year = 2022
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    /// Archive directory layout.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Locations of the JSON-backed pattern and exclusion lists.
    #[serde(default)]
    pub lists: ListPaths,

    /// Validation rules for extracted date fields.
    #[serde(default)]
    pub rules: RuleConfig,
}

/// Archive directory layout: one root containing the dated archive and the
/// inbox of unsorted entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory containing both the archive and the inbox.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Subdirectory of `root` holding the date-structured archive.
    #[serde(default = "default_by_date")]
    pub by_date: String,

    /// Subdirectory of `root` holding entries waiting to be sorted.
    #[serde(default = "default_inbox")]
    pub inbox: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_by_date() -> String {
    "pictures_by_date".to_string()
}

fn default_inbox() -> String {
    "to_be_sorted".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            by_date: default_by_date(),
            inbox: default_inbox(),
        }
    }
}

/// Locations of the five persisted lists, each a JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPaths {
    /// Destination patterns (regexes with named date captures).
    #[serde(default = "default_destination_list")]
    pub destination: PathBuf,

    /// Blocking patterns; a matching entry is skipped outright.
    #[serde(default = "default_block_list")]
    pub block: PathBuf,

    /// Directory patterns; a matching directory is bulk-moved.
    #[serde(default = "default_directory_list")]
    pub directory: PathBuf,

    /// Paths permanently excluded from classification.
    #[serde(default = "default_blacklist")]
    pub blacklist: PathBuf,

    /// Paths recorded as duplicates of already-archived entries.
    #[serde(default = "default_duplicates_list")]
    pub duplicates: PathBuf,
}

fn default_destination_list() -> PathBuf {
    PathBuf::from("reg.json")
}

fn default_block_list() -> PathBuf {
    PathBuf::from("black_reg_list.json")
}

fn default_directory_list() -> PathBuf {
    PathBuf::from("directory_reg_list.json")
}

fn default_blacklist() -> PathBuf {
    PathBuf::from("bl.json")
}

fn default_duplicates_list() -> PathBuf {
    PathBuf::from("duplicates.json")
}

impl Default for ListPaths {
    fn default() -> Self {
        Self {
            destination: default_destination_list(),
            block: default_block_list(),
            directory: default_directory_list(),
            blacklist: default_blacklist(),
            duplicates: default_duplicates_list(),
        }
    }
}

/// Validation rules for extracted date fields.
///
/// A captured year must fall strictly between `start_year` and `end_year`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_start_year")]
    pub start_year: i32,

    #[serde(default = "default_end_year")]
    pub end_year: i32,
}

fn default_start_year() -> i32 {
    1970
}

fn default_end_year() -> i32 {
    2022
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            end_year: default_end_year(),
        }
    }
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.picsortrc.toml` in the current directory
    /// 3. Look for `~/.config/picsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        // If explicitly specified, load from that path
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try current directory
        let local_config = PathBuf::from(".picsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try home directory
        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("picsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        // Fall back to defaults
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// The date-structured archive directory.
    pub fn archive_dir(&self) -> PathBuf {
        self.archive.root.join(&self.archive.by_date)
    }

    /// The inbox directory of entries waiting to be sorted.
    pub fn inbox_dir(&self) -> PathBuf {
        self.archive.root.join(&self.archive.inbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_year_bounds() {
        let config = SortConfig::default();
        assert_eq!(config.rules.start_year, 1970);
        assert_eq!(config.rules.end_year, 2022);
    }

    #[test]
    fn test_default_list_locations() {
        let config = SortConfig::default();
        assert_eq!(config.lists.destination, PathBuf::from("reg.json"));
        assert_eq!(config.lists.blacklist, PathBuf::from("bl.json"));
        assert_eq!(config.lists.duplicates, PathBuf::from("duplicates.json"));
    }

    #[test]
    fn test_archive_and_inbox_dirs() {
        let config = SortConfig::default();
        assert_eq!(config.archive_dir(), PathBuf::from("./pictures_by_date"));
        assert_eq!(config.inbox_dir(), PathBuf::from("./to_be_sorted"));
    }

    #[test]
    fn test_parse_partial_config_fills_defaults() {
        let config: SortConfig = toml::from_str(
            r#"
            [archive]
            root = "/mnt/pictures"

            [rules]
            end_year = 2030
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.archive.root, PathBuf::from("/mnt/pictures"));
        assert_eq!(config.archive.by_date, "pictures_by_date");
        assert_eq!(config.rules.start_year, 1970);
        assert_eq!(config.rules.end_year, 2030);
        assert_eq!(config.lists.block, PathBuf::from("black_reg_list.json"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = SortConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[archive\nroot = 3").expect("Failed to write config");

        let result = SortConfig::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }
}
