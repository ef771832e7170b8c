//! Error types for fence-engine.

use std::path::Path;
use std::time::Duration;

use fence_core::errors::CoreError;
use fence_core::ids::{EntityId, ZoneId};
use fence_index::IndexError;
use thiserror::Error;

/// Errors surfaced by an epoch or by engine construction.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The zone source could not be read; the epoch produced nothing.
    #[error("Registry load failed: {0}")]
    RegistryLoad(anyhow::Error),

    /// The position feed could not be read; the epoch produced nothing.
    #[error("Position feed failed: {0}")]
    PositionFeed(anyhow::Error),

    /// Persisted counters could not be read; the epoch produced nothing.
    #[error("Counter load failed: {0}")]
    CounterLoad(anyhow::Error),

    /// The cross-process epoch lock could not be taken or inspected.
    #[error("Epoch lock error at {path}: {reason}")]
    Lock { path: String, reason: String },

    /// A write to an assignment or counter sink failed or timed out.
    #[error("Sink write failed ({operation} for {vehicle_id}): {reason}")]
    SinkWrite {
        operation: &'static str,
        vehicle_id: EntityId,
        reason: String,
    },

    /// The evaluation worker panicked or was cancelled by the runtime.
    #[error("Evaluation worker failed: {0}")]
    Worker(String),

    /// The rayon pool could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EngineError {
    pub(crate) fn lock(path: &Path, reason: impl Into<String>) -> Self {
        Self::Lock {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn sink_timeout(
        operation: &'static str,
        vehicle_id: &EntityId,
        after: Duration,
    ) -> Self {
        Self::SinkWrite {
            operation,
            vehicle_id: vehicle_id.clone(),
            reason: format!("timed out after {}ms", after.as_millis()),
        }
    }

    pub(crate) fn sink_failed(
        operation: &'static str,
        vehicle_id: &EntityId,
        error: &anyhow::Error,
    ) -> Self {
        Self::SinkWrite {
            operation,
            vehicle_id: vehicle_id.clone(),
            reason: format!("{error:#}"),
        }
    }
}

/// Counter invariant violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CounterError {
    /// The same pair was incremented twice within one epoch.
    #[error("Duplicate increment of ({vehicle_id}, zone {zone_id}) in epoch {seq}")]
    DuplicateIncrement {
        vehicle_id: EntityId,
        zone_id: ZoneId,
        seq: u64,
    },
}
