//! Error types for recon.
//!
//! Uses `thiserror` for ergonomic error definitions, one enum per layer.

use std::path::PathBuf;
use thiserror::Error;

/// Synchronous failures of a dispatch call. Per-target failures never surface here.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown scan category: {0}")]
    UnknownCategory(String),
}

/// Failure to run the external scanning tool.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("failed to start '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{tool}' exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("cannot create output folder {path}: {source}")]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the state store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("state store unavailable")]
    Unavailable,

    #[error("failed to load state from {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("failed to save state: {0}")]
    SaveFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level errors for CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Target(#[from] crate::types::TargetError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for tool invocation.
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
