// Typed errors with thiserror. Only placement exhaustion is a classified engine failure;
// everything else here is about bad input crossing the JS boundary.

use thiserror::Error;

use crate::types::Position;

/// Engine error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No overlap-free candidate within the retry budget. Carries the last
    /// sampled candidate so callers can fall back to it.
    #[error("Placement exhausted after {attempts} attempts (fallback at {fallback})")]
    PlacementExhausted { attempts: u32, fallback: Position },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
