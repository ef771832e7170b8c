//! One evaluation epoch, end to end.
//!
//! Pull zones, pull positions, catch up with persisted counters, sync the
//! spatial index, evaluate on a blocking thread, then flush events to the
//! sinks under a per-write timeout. Only a failed read from the store aborts
//! the epoch; everything else is folded into the [`EpochSummary`].
//!
//! At most one epoch runs per runner. With a lock file configured, at most
//! one runs per store across processes.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use fence_config::FenceConfig;
use fence_core::boundary::{AssignmentSink, CounterSink, CounterSource, PositionFeed, ZoneSource};
use fence_core::entities::VehiclePosition;
use fence_core::epoch::{AssignmentEvent, EpochStamp, EpochSummary, SkipReason};
use fence_core::ids::EntityId;
use fence_index::{Grid, SpatialIndex};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::counters::CounterStore;
use crate::engine::AssignmentEngine;
use crate::error::EngineError;
use crate::lock::EpochLock;
use crate::registry::ZoneRegistry;

/// Summary plus the per-vehicle events, sorted by vehicle id.
#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub summary: EpochSummary,
    pub events: Vec<AssignmentEvent>,
}

/// Result of asking for an epoch.
#[derive(Debug, Clone)]
pub enum EpochRun {
    Completed(EpochReport),
    /// Another epoch was in flight, in this runner or in another process
    /// holding the lock file; nothing was done.
    AlreadyRunning,
}

/// Clears the in-progress flag when the epoch future completes or is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives epochs for a store implementing every boundary trait.
#[derive(Debug)]
pub struct EpochRunner<S> {
    store: Arc<S>,
    registry: Arc<ZoneRegistry>,
    index: Arc<SpatialIndex>,
    counters: Arc<CounterStore>,
    engine: Arc<AssignmentEngine>,
    sink_timeout: Duration,
    running: AtomicBool,
    lock_path: Option<PathBuf>,
    cancel: Arc<AtomicBool>,
    seq: AtomicU64,
}

impl<S> EpochRunner<S>
where
    S: PositionFeed + ZoneSource + CounterSource + AssignmentSink + CounterSink + 'static,
{
    /// # Errors
    ///
    /// Returns an error if the configured grid, shard count, or worker pool
    /// cannot be built.
    pub fn new(store: Arc<S>, config: &FenceConfig) -> Result<Self, EngineError> {
        let grid = Grid::new(config.index.grid_size)?;
        Ok(Self {
            store,
            registry: Arc::new(ZoneRegistry::new(grid, config.index.max_cells_per_zone)),
            index: Arc::new(SpatialIndex::new(grid, config.index.shards)?),
            counters: Arc::new(CounterStore::new()),
            engine: Arc::new(AssignmentEngine::new(config.epoch.workers)?),
            sink_timeout: config.epoch.sink_timeout(),
            running: AtomicBool::new(false),
            lock_path: None,
            cancel: Arc::new(AtomicBool::new(false)),
            seq: AtomicU64::new(0),
        })
    }

    /// Take the lock file at `path` around every epoch, so runners in other
    /// processes over the same store never overlap.
    #[must_use]
    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn lock_file(&self) -> Option<&Path> {
        self.lock_path.as_deref()
    }

    #[must_use]
    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// The live index. Position updates may be pushed here between epochs;
    /// each epoch re-syncs it from the feed.
    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    #[must_use]
    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether an epoch is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Interrupt the in-flight epoch (if any) and every later one.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run one epoch unless one is already in flight.
    ///
    /// # Errors
    ///
    /// Returns `RegistryLoad`, `PositionFeed`, or `CounterLoad` if the store
    /// cannot be read, `Lock` if the lock file is unusable, `Index` on a grid
    /// mismatch, and `Worker` if the evaluation thread dies.
    /// Per-zone, per-vehicle, and sink failures are reported in the summary.
    pub async fn run_epoch(&self) -> Result<EpochRun, EngineError> {
        if self.running.swap(true, Ordering::AcqRel) {
            debug!("epoch already running, request rejected");
            return Ok(EpochRun::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);
        let _lock = match self.lock_path.as_deref() {
            Some(path) => match EpochLock::try_acquire(path)? {
                Some(lock) => Some(lock),
                None => {
                    debug!(path = %path.display(), "epoch running in another process, request rejected");
                    return Ok(EpochRun::AlreadyRunning);
                }
            },
            None => None,
        };

        let started = Instant::now();
        let stamp = EpochStamp {
            seq: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
            at: Utc::now(),
        };

        let result = self.execute(stamp, started).await;
        match &result {
            Ok(report) => {
                let s = &report.summary;
                info!(
                    seq = s.seq,
                    processed = s.processed,
                    assigned = s.assigned,
                    unassigned = s.unassigned,
                    skipped = s.skipped,
                    zones_loaded = s.zones_loaded,
                    zones_skipped = s.zones_skipped,
                    sink_failures = s.sink_failures,
                    interrupted = s.interrupted,
                    duration_ms = s.duration_ms,
                    "epoch complete"
                );
            }
            Err(error) => error!(seq = stamp.seq, %error, "epoch aborted"),
        }
        result.map(EpochRun::Completed)
    }

    async fn execute(
        &self,
        stamp: EpochStamp,
        started: Instant,
    ) -> Result<EpochReport, EngineError> {
        let records = self
            .store
            .list_zones()
            .await
            .map_err(EngineError::RegistryLoad)?;
        let load = self.registry.refresh(&records);

        let positions = self
            .store
            .list_current_positions()
            .await
            .map_err(EngineError::PositionFeed)?;

        let persisted = self
            .store
            .list_counters()
            .await
            .map_err(EngineError::CounterLoad)?;
        let caught_up = self.counters.reconcile(persisted);
        if caught_up > 0 {
            debug!(caught_up, "counters raised from store");
        }

        let mut events = self.sync_index(&positions);

        let zones = self.registry.snapshot();
        let index = Arc::clone(&self.index);
        let counters = Arc::clone(&self.counters);
        let engine = Arc::clone(&self.engine);
        let cancel = Arc::clone(&self.cancel);
        let evaluated = tokio::task::spawn_blocking(move || {
            let snapshot = index.snapshot();
            engine.evaluate(&snapshot, &zones, &index, &counters, stamp, &cancel)
        })
        .await
        .map_err(|e| EngineError::Worker(e.to_string()))??;

        events.extend(evaluated);
        events.sort_by(|a, b| a.vehicle_id().cmp(b.vehicle_id()));

        let sink_failures = self.flush(&events).await;

        let mut summary = EpochSummary::from_events(stamp, &events);
        summary.zones_loaded = saturating_u32(load.loaded);
        summary.zones_skipped = saturating_u32(load.skipped.len());
        summary.sink_failures = sink_failures;
        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(EpochReport { summary, events })
    }

    /// Make the index mirror the feed. Vehicles absent from the feed, or
    /// reported at a non-finite position, are dropped from the index; the
    /// latter also produce a skip event.
    fn sync_index(
        &self,
        positions: &[VehiclePosition],
    ) -> Vec<AssignmentEvent> {
        let mut skipped = Vec::new();
        let mut seen: HashSet<&EntityId> = HashSet::with_capacity(positions.len());

        for position in positions {
            match self.index.upsert(
                &position.vehicle_id,
                position.point(),
                position.updated_at,
            ) {
                Ok(_) => {
                    seen.insert(&position.vehicle_id);
                }
                Err(error) => {
                    warn!(vehicle = %position.vehicle_id, %error, "skipping vehicle");
                    self.index.remove(&position.vehicle_id);
                    skipped.push(AssignmentEvent::Skipped {
                        vehicle_id: position.vehicle_id.clone(),
                        reason: SkipReason::InvalidPosition(error.to_string()),
                    });
                }
            }
        }

        for stale in self.index.tracked_ids() {
            if !seen.contains(&stale) {
                self.index.remove(&stale);
            }
        }
        skipped
    }

    /// Write events to the sinks. Returns the number of failed writes.
    async fn flush(&self, events: &[AssignmentEvent]) -> u32 {
        let mut failures = 0;
        for event in events {
            match event {
                AssignmentEvent::Assigned {
                    vehicle_id,
                    zone_id,
                    at,
                    count,
                } => {
                    let recorded = self
                        .bounded(
                            "record_assignment",
                            vehicle_id,
                            self.store.record_assignment(vehicle_id, *zone_id, *at),
                        )
                        .await;
                    let counted = self
                        .bounded(
                            "upsert_counter",
                            vehicle_id,
                            self.store.upsert_counter(vehicle_id, *zone_id, *count, *at),
                        )
                        .await;
                    failures += u32::from(!recorded) + u32::from(!counted);
                }
                AssignmentEvent::Unassigned { vehicle_id, at } => {
                    let ok = self
                        .bounded(
                            "record_no_match",
                            vehicle_id,
                            self.store.record_no_match(vehicle_id, *at),
                        )
                        .await;
                    failures += u32::from(!ok);
                }
                AssignmentEvent::Skipped { .. } => {}
            }
        }
        failures
    }

    async fn bounded(
        &self,
        operation: &'static str,
        vehicle_id: &EntityId,
        write: impl Future<Output = anyhow::Result<()>>,
    ) -> bool {
        let error = match tokio::time::timeout(self.sink_timeout, write).await {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => EngineError::sink_failed(operation, vehicle_id, &e),
            Err(_) => EngineError::sink_timeout(operation, vehicle_id, self.sink_timeout),
        };
        warn!(%error, "sink write failed");
        false
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
