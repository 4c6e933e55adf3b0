//! Error types for the pit limit engine.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, UplError>;

/// Unified error type for loading, valuation, graph construction and solving.
///
/// Empty pits and empty plan periods are not errors; they are reported through
/// [`crate::optimizer::UplOutcome`] and [`crate::analytics::ExtractionOutcome`].
#[derive(Error, Debug)]
pub enum UplError {
    /// Malformed row, non-numeric field, non-positive tonnage, bad pricing or rule line
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Negative capacity or missing terminals in a flow network
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// Solver stopped at the caller supplied deadline
    #[error("Computation aborted: {0}")]
    ComputationAborted(String),

    /// Configuration file could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl UplError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        UplError::InvalidInput(message.into())
    }

    pub fn invalid_graph(message: impl Into<String>) -> Self {
        UplError::InvalidGraph(message.into())
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        UplError::ComputationAborted(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        UplError::Config(message.into())
    }
}

impl From<toml::de::Error> for UplError {
    fn from(err: toml::de::Error) -> Self {
        UplError::Config(err.to_string())
    }
}
