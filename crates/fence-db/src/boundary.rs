//! Boundary trait implementations so the engine can run against the database.

use chrono::{DateTime, Utc};
use fence_core::boundary::{AssignmentSink, CounterSink, CounterSource, PositionFeed, ZoneSource};
use fence_core::entities::{Counter, VehiclePosition, ZoneRecord};
use fence_core::ids::{EntityId, ZoneId};
use tracing::debug;

use crate::service::FenceStore;

impl PositionFeed for FenceStore {
    async fn list_current_positions(&self) -> anyhow::Result<Vec<VehiclePosition>> {
        Ok(self.list_vehicles().await?)
    }
}

impl ZoneSource for FenceStore {
    async fn list_zones(&self) -> anyhow::Result<Vec<ZoneRecord>> {
        Ok(Self::list_zones(self).await?)
    }
}

impl AssignmentSink for FenceStore {
    async fn record_assignment(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        Self::record_assignment(self, vehicle_id, zone_id, at).await?;
        Ok(())
    }

    /// No-match outcomes are not persisted.
    async fn record_no_match(&self, vehicle_id: &EntityId, at: DateTime<Utc>) -> anyhow::Result<()> {
        debug!(vehicle = %vehicle_id, %at, "no zone matched");
        Ok(())
    }
}

impl CounterSource for FenceStore {
    async fn list_counters(&self) -> anyhow::Result<Vec<Counter>> {
        Ok(Self::list_counters(self).await?)
    }
}

impl CounterSink for FenceStore {
    async fn upsert_counter(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        count: u64,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        Self::upsert_counter(self, vehicle_id, zone_id, count, at).await?;
        Ok(())
    }
}
