//! Configuration for a normalization run.
//!
//! Loaded from a `clade.toml` when present; every section falls back to
//! sensible defaults so a bare run needs no file at all.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::NomCode;

pub const CONFIG_FILE: &str = "clade.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub dataset: DatasetConfig,
    pub insert: InsertConfig,
    pub store: StoreConfig,
    pub source: SourceConfig,
}

impl NormalizerConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load `clade.toml` from the given directory, or defaults when the
    /// file does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Dataset-level settings applied during interpretation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub title: Option<String>,
    /// Default nomenclatural code assumed when a record carries none.
    pub code: Option<NomCode>,
}

/// Insertion-phase settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertConfig {
    /// Records per batch; also the interrupt-check granularity.
    pub batch_size: usize,
    /// Fail the run on duplicate identifiers instead of flagging them.
    pub strict_ids: bool,
    /// Explicit delimiter for multi-valued identifier columns. When unset
    /// the common splitters are probed.
    pub id_delimiter: Option<String>,
}

impl Default for InsertConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            strict_ids: false,
            id_delimiter: None,
        }
    }
}

/// Payload store placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; unset means in-memory.
    pub path: Option<PathBuf>,
}

/// Where to find the source files inside the checklist directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub core_pattern: String,
    pub vernacular_pattern: String,
    pub distribution_pattern: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            core_pattern: "taxon*.txt".into(),
            vernacular_pattern: "vernacular*.txt".into(),
            distribution_pattern: "distribution*.txt".into(),
        }
    }
}
