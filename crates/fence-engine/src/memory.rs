//! In-process store implementing every boundary trait.
//!
//! Test backing for the runner and scheduler, compiled only for this crate's
//! tests or with the `test-support` feature. Faults can be injected per
//! concern.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use anyhow::bail;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fence_core::boundary::{AssignmentSink, CounterSink, CounterSource, PositionFeed, ZoneSource};
use fence_core::entities::{Assignment, Counter, VehiclePosition, ZoneRecord};
use fence_core::ids::{EntityId, ZoneId};

#[derive(Debug, Default)]
struct Faults {
    zones: AtomicBool,
    positions: AtomicBool,
    counters: AtomicBool,
    sinks: AtomicBool,
    sink_delay_ms: AtomicU64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    positions: DashMap<EntityId, VehiclePosition>,
    zones: RwLock<BTreeMap<ZoneId, ZoneRecord>>,
    assignments: Mutex<Vec<Assignment>>,
    no_matches: Mutex<Vec<(EntityId, DateTime<Utc>)>>,
    counters: DashMap<(EntityId, ZoneId), Counter>,
    faults: Faults,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position report, stamped now.
    pub fn report_position(&self, vehicle_id: impl Into<EntityId>, longitude: f64, latitude: f64) {
        let vehicle_id = vehicle_id.into();
        self.positions.insert(
            vehicle_id.clone(),
            VehiclePosition {
                vehicle_id,
                longitude,
                latitude,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn remove_vehicle(&self, vehicle_id: &EntityId) -> bool {
        self.positions.remove(vehicle_id).is_some()
    }

    pub fn put_zone(&self, record: ZoneRecord) {
        self.zones
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.zone_id, record);
    }

    /// Store a polygon zone from raw (lon, lat) pairs. The ring is not
    /// validated here; bad rings surface when an epoch loads them.
    pub fn put_polygon(&self, zone_id: i64, name: &str, ring: &[(f64, f64)]) {
        let coordinates: Vec<[f64; 2]> = ring.iter().map(|&(lon, lat)| [lon, lat]).collect();
        self.put_zone(ZoneRecord {
            zone_id: ZoneId(zone_id),
            name: name.to_string(),
            geometry: serde_json::json!({
                "type": "Polygon",
                "coordinates": [coordinates],
            }),
        });
    }

    pub fn remove_zone(&self, zone_id: ZoneId) -> bool {
        self.zones
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&zone_id)
            .is_some()
    }

    /// Assignment history in write order.
    #[must_use]
    pub fn assignments(&self) -> Vec<Assignment> {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Vehicles reported as matching no zone, in write order.
    #[must_use]
    pub fn no_matches(&self) -> Vec<(EntityId, DateTime<Utc>)> {
        self.no_matches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn counter(&self, vehicle_id: &EntityId, zone_id: ZoneId) -> Option<Counter> {
        self.counters
            .get(&(vehicle_id.clone(), zone_id))
            .map(|c| c.value().clone())
    }

    /// Persisted counters ordered by (vehicle, zone).
    #[must_use]
    pub fn counters(&self) -> Vec<Counter> {
        let mut out: Vec<Counter> = self.counters.iter().map(|c| c.value().clone()).collect();
        out.sort_by(|a, b| (&a.vehicle_id, a.zone_id).cmp(&(&b.vehicle_id, b.zone_id)));
        out
    }

    pub fn fail_zone_source(&self, fail: bool) {
        self.faults.zones.store(fail, Ordering::Relaxed);
    }

    pub fn fail_position_feed(&self, fail: bool) {
        self.faults.positions.store(fail, Ordering::Relaxed);
    }

    pub fn fail_counter_source(&self, fail: bool) {
        self.faults.counters.store(fail, Ordering::Relaxed);
    }

    pub fn fail_sinks(&self, fail: bool) {
        self.faults.sinks.store(fail, Ordering::Relaxed);
    }

    /// Delay every sink write by `delay`.
    pub fn set_sink_delay(&self, delay: Duration) {
        self.faults.sink_delay_ms.store(
            u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
    }

    async fn sink_gate(&self) -> anyhow::Result<()> {
        let delay = self.faults.sink_delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.faults.sinks.load(Ordering::Relaxed) {
            bail!("sink unavailable");
        }
        Ok(())
    }
}

impl PositionFeed for MemoryStore {
    async fn list_current_positions(&self) -> anyhow::Result<Vec<VehiclePosition>> {
        if self.faults.positions.load(Ordering::Relaxed) {
            bail!("position feed unavailable");
        }
        let mut out: Vec<VehiclePosition> = self.positions.iter().map(|p| p.value().clone()).collect();
        out.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        Ok(out)
    }
}

impl ZoneSource for MemoryStore {
    async fn list_zones(&self) -> anyhow::Result<Vec<ZoneRecord>> {
        if self.faults.zones.load(Ordering::Relaxed) {
            bail!("zone source unavailable");
        }
        Ok(self
            .zones
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }
}

impl AssignmentSink for MemoryStore {
    async fn record_assignment(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.sink_gate().await?;
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Assignment {
                vehicle_id: vehicle_id.clone(),
                zone_id,
                assigned_at: at,
            });
        Ok(())
    }

    async fn record_no_match(&self, vehicle_id: &EntityId, at: DateTime<Utc>) -> anyhow::Result<()> {
        self.sink_gate().await?;
        self.no_matches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((vehicle_id.clone(), at));
        Ok(())
    }
}

impl CounterSource for MemoryStore {
    async fn list_counters(&self) -> anyhow::Result<Vec<Counter>> {
        if self.faults.counters.load(Ordering::Relaxed) {
            bail!("counter source unavailable");
        }
        Ok(self.counters())
    }
}

impl CounterSink for MemoryStore {
    async fn upsert_counter(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        count: u64,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.sink_gate().await?;
        self.counters.insert(
            (vehicle_id.clone(), zone_id),
            Counter {
                vehicle_id: vehicle_id.clone(),
                zone_id,
                count,
                last_counted: at,
            },
        );
        Ok(())
    }
}
