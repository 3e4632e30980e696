//! Error types shared by the network engine and the trainer.

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, running or evolving networks
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A neuron, connection or unit handle does not resolve
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A vector does not match the layer or genome it is applied to
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// Trainer or network parameters are unusable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A connection can only be gated by one neuron
    #[error("connection {connection} is already gated by neuron {gater}")]
    AlreadyGated { connection: u64, gater: u64 },

    /// The trainer has no population yet
    #[error("no population: call create_population first")]
    NoPopulation,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}
