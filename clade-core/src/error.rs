//! Error types for the engine.
//!
//! Two channels exist: fatal errors abort the whole run and surface as
//! [`NormalizationError`] (or one of the infrastructure errors), while
//! data-quality findings are [`crate::types::Issue`]s attached to the
//! offending usage and never thrown.

use thiserror::Error;

use clade_graph::NodeId;

/// Top-level error wrapping every failure the engine can produce.
#[derive(Error, Debug)]
pub enum CladeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Graph(#[from] clade_graph::GraphError),
}

/// Payload store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("payload serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usage stored for node {0}")]
    MissingUsage(NodeId),

    #[error("corrupt row in payload store: {0}")]
    Corrupt(String),
}

/// Failures reading the source checklist.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("unreadable path while scanning source files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("no core data file matched '{0}'")]
    NoCoreFile(String),

    #[error("file {file} has no usable header: {reason}")]
    InvalidHeader { file: String, reason: String },
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The fatal channel: any of these aborts the normalization run.
#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("identifier '{0}' is not unique")]
    NotUnique(String),

    #[error("required data missing on node {node}: {what}")]
    MissingData { node: NodeId, what: String },

    #[error("normalization interrupted")]
    Interrupted,

    #[error("source structurally invalid: {0}")]
    SourceInvalid(String),
}

pub type Result<T> = std::result::Result<T, CladeError>;
