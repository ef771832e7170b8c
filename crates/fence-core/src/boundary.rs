//! Narrow interfaces between the engine and its collaborators.
//!
//! The engine pulls positions, zones, and persisted counters once per epoch
//! and pushes assignments and counters after it. Implementations live in `fence-db` (libSQL) and
//! `fence-engine::memory` (tests, embedding). Errors are opaque at this seam:
//! the engine only logs and counts them.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::entities::{Counter, VehiclePosition, ZoneRecord};
use crate::ids::{EntityId, ZoneId};

/// Source of the current vehicle positions.
pub trait PositionFeed: Send + Sync {
    /// All vehicles with their latest position. Called once per epoch.
    fn list_current_positions(
        &self,
    ) -> impl Future<Output = anyhow::Result<Vec<VehiclePosition>>> + Send;
}

/// Source of zone definitions.
pub trait ZoneSource: Send + Sync {
    /// All zones with raw GeoJSON geometry. Called once per epoch.
    fn list_zones(&self) -> impl Future<Output = anyhow::Result<Vec<ZoneRecord>>> + Send;
}

/// Destination for per-vehicle epoch outcomes.
pub trait AssignmentSink: Send + Sync {
    fn record_assignment(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn record_no_match(
        &self,
        vehicle_id: &EntityId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Source of persisted counters.
pub trait CounterSource: Send + Sync {
    /// Every persisted counter. Called once per epoch so tallies written by
    /// another runner over the same store are picked up before incrementing.
    fn list_counters(&self) -> impl Future<Output = anyhow::Result<Vec<Counter>>> + Send;
}

/// Destination for counter values after each increment.
pub trait CounterSink: Send + Sync {
    fn upsert_counter(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        count: u64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}
