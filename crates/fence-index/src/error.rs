//! Index error types.

use fence_core::errors::CoreError;
use thiserror::Error;

/// Errors emitted by the spatial index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Configuration values that cannot be used (e.g., non-positive cell size).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A position was rejected (non-finite coordinate).
    #[error(transparent)]
    Position(#[from] CoreError),

    /// A coverage map built on one grid was queried through an index on another.
    #[error("Zone coverage uses grid size {coverage} but the index uses {index}")]
    GridMismatch { coverage: f64, index: f64 },
}
