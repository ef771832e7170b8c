//! Cross-cutting error types for Fenceline.
//!
//! Geometry and position validation errors originate here because every crate
//! that touches coordinates needs them. Crate-specific errors (`IndexError`,
//! `EngineError`, `DatabaseError`) live in their crates and wrap `CoreError`
//! where they surface validation failures.

use thiserror::Error;

use crate::ids::{EntityId, ZoneId};

/// Errors that can be raised by any Fenceline crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A zone ring is malformed (too few vertices, non-finite coordinates,
    /// unsupported geometry type).
    #[error("Invalid geometry{}: {reason}", zone_label(.zone))]
    InvalidGeometry {
        zone: Option<ZoneId>,
        reason: String,
    },

    /// An entity reported a non-finite coordinate.
    #[error("Invalid position for {entity}: ({longitude}, {latitude})")]
    InvalidPosition {
        entity: EntityId,
        longitude: f64,
        latitude: f64,
    },

    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for an `InvalidGeometry` error without a known zone id.
    #[must_use]
    pub fn geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            zone: None,
            reason: reason.into(),
        }
    }

    /// Attach a zone id to an `InvalidGeometry` error. Other variants pass through.
    #[must_use]
    pub fn for_zone(self, id: ZoneId) -> Self {
        match self {
            Self::InvalidGeometry { reason, .. } => Self::InvalidGeometry {
                zone: Some(id),
                reason,
            },
            other => other,
        }
    }
}

fn zone_label(zone: &Option<ZoneId>) -> String {
    zone.map(|id| format!(" for zone {id}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_error_mentions_zone_when_known() {
        let err = CoreError::geometry("ring has 2 vertices").for_zone(ZoneId(4));
        assert_eq!(
            err.to_string(),
            "Invalid geometry for zone 4: ring has 2 vertices"
        );
        let anonymous = CoreError::geometry("empty ring");
        assert_eq!(anonymous.to_string(), "Invalid geometry: empty ring");
    }
}
