//! Per-entity zone resolution for one epoch.

use std::sync::atomic::{AtomicBool, Ordering};

use fence_core::epoch::{AssignmentEvent, EpochStamp, SkipReason};
use fence_core::geometry::Point;
use fence_core::ids::ZoneId;
use fence_index::{IndexError, IndexedPosition, SpatialIndex};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::counters::CounterStore;
use crate::error::EngineError;
use crate::registry::ZoneSnapshot;

/// Resolves positions to zones. Owns no state beyond its worker pool.
#[derive(Debug)]
pub struct AssignmentEngine {
    pool: Option<ThreadPool>,
}

impl AssignmentEngine {
    /// `workers == 0` runs on rayon's global pool (one thread per core).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ThreadPool` if a dedicated pool cannot be built.
    pub fn new(workers: usize) -> Result<Self, EngineError> {
        let pool = if workers == 0 {
            None
        } else {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("fence-epoch-{i}"))
                    .build()?,
            )
        };
        Ok(Self { pool })
    }

    /// Winning zone for `point`: the lowest-id candidate whose ring contains it.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::GridMismatch` if the snapshot coverage was built on
    /// a different grid than `index`.
    pub fn resolve(
        zones: &ZoneSnapshot,
        index: &SpatialIndex,
        point: Point,
    ) -> Result<Option<ZoneId>, IndexError> {
        // candidates arrive ascending, so the first hit is the lowest id
        Ok(index
            .query_candidate_zones(point, zones.coverage())?
            .into_iter()
            .find(|&zone_id| zones.contains(zone_id, point)))
    }

    /// Evaluate every position, incrementing counters for each assignment.
    ///
    /// Events come back in the order of `positions`. Once `cancel` is set,
    /// the remaining entities are reported as interrupted skips; increments
    /// already applied stay applied.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Index` if the snapshot and index disagree on the
    /// grid. No counter is touched in that case.
    pub fn evaluate(
        &self,
        positions: &[IndexedPosition],
        zones: &ZoneSnapshot,
        index: &SpatialIndex,
        counters: &CounterStore,
        stamp: EpochStamp,
        cancel: &AtomicBool,
    ) -> Result<Vec<AssignmentEvent>, EngineError> {
        if zones.coverage().grid() != index.grid() {
            return Err(IndexError::GridMismatch {
                coverage: zones.coverage().grid().size(),
                index: index.grid().size(),
            }
            .into());
        }

        let run = || {
            positions
                .par_iter()
                .map(|position| Self::evaluate_one(position, zones, index, counters, stamp, cancel))
                .collect::<Result<Vec<_>, IndexError>>()
        };
        let events = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }?;
        Ok(events)
    }

    fn evaluate_one(
        position: &IndexedPosition,
        zones: &ZoneSnapshot,
        index: &SpatialIndex,
        counters: &CounterStore,
        stamp: EpochStamp,
        cancel: &AtomicBool,
    ) -> Result<AssignmentEvent, IndexError> {
        let vehicle_id = position.vehicle_id.clone();
        if cancel.load(Ordering::Relaxed) {
            return Ok(AssignmentEvent::Skipped {
                vehicle_id,
                reason: SkipReason::Interrupted,
            });
        }

        let event = match Self::resolve(zones, index, position.point)? {
            Some(zone_id) => match counters.increment(&vehicle_id, zone_id, stamp) {
                Ok(counter) => AssignmentEvent::Assigned {
                    vehicle_id,
                    zone_id,
                    at: stamp.at,
                    count: counter.count,
                },
                Err(error) => AssignmentEvent::Skipped {
                    vehicle_id,
                    reason: SkipReason::DuplicateIncrement(error.to_string()),
                },
            },
            None => AssignmentEvent::Unassigned {
                vehicle_id,
                at: stamp.at,
            },
        };

        debug!(
            vehicle = %position.vehicle_id,
            lon = position.point.lon,
            lat = position.point.lat,
            zone = ?event.zone_id(),
            "resolved"
        );
        Ok(event)
    }
}
