//! Ingestion configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `MESH_*` environment variables. Command-line flags are applied on top by
//! the binary.
//!
//! ```toml
//! delimiter = ";"
//! null_tokens = ["", "NaN", " "]
//! database = "mesh.db"
//! policy = "all-or-nothing"
//! on_conflict = "fail"
//!
//! [vocabulary]
//! trames = ["T2 Ra1 M2 E2", "T2 Ra1 M4 E2", "T2 Ra1 M4 E3"]
//! colors = ["white", "blue"]
//! ```

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Defaults
// ============================================================================

/// Field separator of the input file.
pub const DEFAULT_DELIMITER: char = ';';

/// Cell values read as null.
///
/// Only these spellings are null. Other common markers such as `NA`, `N/A`,
/// `null` or lowercase `nan` stay text and fail the field they appear in;
/// list them in `null_tokens` to read them as missing.
pub const DEFAULT_NULL_TOKENS: &[&str] = &["", "NaN", " "];

/// SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "mesh.db";

/// Accepted weaving pattern codes.
pub const DEFAULT_TRAMES: &[&str] = &["T2 Ra1 M2 E2", "T2 Ra1 M4 E2", "T2 Ra1 M4 E3"];

/// Accepted color names.
pub const DEFAULT_COLORS: &[&str] = &[
    "white", "yellow", "green", "purple", "red", "blue", "orange", "magenta", "dark", "grey",
    "cyan",
];

/// Spellings read as `true`, compared case-insensitively.
pub const DEFAULT_TRUE_VALUES: &[&str] = &["vrai", "true", "1"];

/// Spellings read as `false`, compared case-insensitively.
pub const DEFAULT_FALSE_VALUES: &[&str] = &["faux", "false", "0"];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// What to do with the surviving rows when some rows were rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PersistPolicy {
    /// Any rejected row suppresses persistence for the whole batch
    #[default]
    AllOrNothing,
    /// Persist the valid rows regardless of rejected ones
    ValidOnly,
}

impl std::str::FromStr for PersistPolicy {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "all-or-nothing" | "strict" => Ok(PersistPolicy::AllOrNothing),
            "valid-only" | "partial" => Ok(PersistPolicy::ValidOnly),
            _ => Err(IngestError::config(format!("Invalid persistence policy: {}", s))),
        }
    }
}

impl std::fmt::Display for PersistPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistPolicy::AllOrNothing => f.write_str("all-or-nothing"),
            PersistPolicy::ValidOnly => f.write_str("valid-only"),
        }
    }
}

/// Behaviour when a codename already exists in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictMode {
    /// Abort and roll back the whole batch
    #[default]
    Fail,
    /// Overwrite the stored row
    Replace,
}

impl std::str::FromStr for ConflictMode {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail" | "abort" => Ok(ConflictMode::Fail),
            "replace" | "upsert" => Ok(ConflictMode::Replace),
            _ => Err(IngestError::config(format!("Invalid conflict mode: {}", s))),
        }
    }
}

/// Closed value sets the field validators check against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub trames: Vec<String>,
    pub colors: Vec<String>,
    pub true_values: Vec<String>,
    pub false_values: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            trames: owned(DEFAULT_TRAMES),
            colors: owned(DEFAULT_COLORS),
            true_values: owned(DEFAULT_TRUE_VALUES),
            false_values: owned(DEFAULT_FALSE_VALUES),
        }
    }
}

/// Settings for one ingestion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub delimiter: char,
    pub null_tokens: Vec<String>,
    pub database: PathBuf,
    pub policy: PersistPolicy,
    pub on_conflict: ConflictMode,
    pub vocabulary: Vocabulary,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            null_tokens: owned(DEFAULT_NULL_TOKENS),
            database: PathBuf::from(DEFAULT_DATABASE_PATH),
            policy: PersistPolicy::default(),
            on_conflict: ConflictMode::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}

impl IngestConfig {
    /// Defaults, overlaid with `file` when given, overlaid with the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env()
    }

    /// Parse a TOML configuration file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| IngestError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| IngestError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `MESH_DATABASE`, `MESH_DELIMITER`, `MESH_POLICY` and `MESH_ON_CONFLICT`
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(database) = std::env::var("MESH_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Ok(delimiter) = std::env::var("MESH_DELIMITER") {
            self.delimiter = parse_delimiter(&delimiter)?;
        }
        if let Ok(policy) = std::env::var("MESH_POLICY") {
            self.policy = policy.parse()?;
        }
        if let Ok(mode) = std::env::var("MESH_ON_CONFLICT") {
            self.on_conflict = mode.parse()?;
        }
        Ok(self)
    }

    /// Reject settings the reader or validators cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(IngestError::config(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }

        let vocab = &self.vocabulary;
        for (name, values) in [
            ("trames", &vocab.trames),
            ("colors", &vocab.colors),
            ("true_values", &vocab.true_values),
            ("false_values", &vocab.false_values),
        ] {
            if values.is_empty() {
                return Err(IngestError::config(format!("Vocabulary '{}' cannot be empty", name)));
            }
        }

        if let Some(both) = vocab
            .true_values
            .iter()
            .find(|t| vocab.false_values.iter().any(|f| f.eq_ignore_ascii_case(t)))
        {
            return Err(IngestError::config(format!(
                "'{}' is listed as both a true and a false value",
                both
            )));
        }

        if self.database.as_os_str().is_empty() {
            return Err(IngestError::config("Database path cannot be empty"));
        }

        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII; fall back to the default otherwise
        u8::try_from(self.delimiter).unwrap_or(DEFAULT_DELIMITER as u8)
    }
}

/// Parse a delimiter given on the command line or in the environment.
///
/// Accepts a single character, or `tab` / `\t` for a tab.
pub fn parse_delimiter(raw: &str) -> Result<char> {
    match raw {
        "tab" | "\\t" | "\t" => Ok('\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(IngestError::config(format!(
                    "Delimiter must be exactly one character, got '{}'",
                    raw
                ))),
            }
        },
    }
}
