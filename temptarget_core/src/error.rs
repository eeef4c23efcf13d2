//! Error types for the temptarget_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for temptarget_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Enact or save was asked for a target with no duration
    #[error("Invalid duration: {0} minutes (must be a finite number greater than zero)")]
    InvalidDuration(f64),

    /// The effective target is not a finite number
    #[error("Invalid target: {0}")]
    InvalidTarget(f64),

    /// No preset with the given id
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    /// A preset with the given id is already stored
    #[error("Duplicate preset id: {0}")]
    DuplicatePreset(String),

    /// The activation ledger was read before it was seeded
    #[error("Activation ledger is empty")]
    EmptyLedger,

    /// Generic error
    #[error("{0}")]
    Other(String),
}
