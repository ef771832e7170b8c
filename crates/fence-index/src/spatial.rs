//! Sharded spatial hash over vehicle positions.
//!
//! Two independently locked structures:
//! - `entities`: vehicle id → current cell, point, timestamp (a `DashMap`,
//!   sharded by id).
//! - `cells`: a fixed array of `RwLock`ed shards, each mapping cell keys to the
//!   set of vehicle ids in that cell.
//!
//! Lock order is always entity entry → cell shard(s), and a move between two
//! cells takes both cell shard locks in ascending shard order. An entity is
//! therefore in exactly one cell set whenever no write is in progress, and no
//! reader can observe it in zero or two cells.

use std::collections::hash_map::RandomState;
use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fence_core::errors::CoreError;
use fence_core::geometry::Point;
use fence_core::ids::{EntityId, ZoneId};
use tracing::trace;

use crate::coverage::ZoneCoverage;
use crate::error::IndexError;
use crate::grid::{CellKey, Grid};

type CellShard = HashMap<CellKey, HashSet<EntityId>>;

#[derive(Debug, Clone, Copy)]
struct Tracked {
    cell: CellKey,
    point: Point,
    updated_at: DateTime<Utc>,
}

/// One tracked vehicle as seen by a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPosition {
    pub vehicle_id: EntityId,
    pub point: Point,
    pub cell: CellKey,
    pub updated_at: DateTime<Utc>,
}

/// What an [`SpatialIndex::upsert`] did to cell membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Inserted(CellKey),
    Moved { from: CellKey, to: CellKey },
    /// Same cell; only the stored point and timestamp changed.
    Unchanged(CellKey),
}

/// Grid spatial hash over vehicle positions.
#[derive(Debug)]
pub struct SpatialIndex {
    grid: Grid,
    entities: DashMap<EntityId, Tracked>,
    cells: Box<[RwLock<CellShard>]>,
    hasher: RandomState,
}

impl SpatialIndex {
    /// Create an index on `grid` with `shards` cell lock shards.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::InvalidConfig` if `shards` is zero.
    pub fn new(grid: Grid, shards: usize) -> Result<Self, IndexError> {
        if shards == 0 {
            return Err(IndexError::InvalidConfig(
                "shard count must be at least 1".into(),
            ));
        }
        // dashmap requires a power of two greater than one
        let entity_shards = shards.next_power_of_two().max(2);
        Ok(Self {
            grid,
            entities: DashMap::with_shard_amount(entity_shards),
            cells: (0..shards).map(|_| RwLock::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        })
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Number of tracked vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Insert or move a vehicle.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Position` for a non-finite point; the index is
    /// left untouched.
    pub fn upsert(
        &self,
        vehicle_id: &EntityId,
        point: Point,
        at: DateTime<Utc>,
    ) -> Result<Movement, IndexError> {
        if !point.is_finite() {
            return Err(CoreError::InvalidPosition {
                entity: vehicle_id.clone(),
                longitude: point.lon,
                latitude: point.lat,
            }
            .into());
        }

        let cell = self.grid.cell_of(point);
        let tracked = Tracked {
            cell,
            point,
            updated_at: at,
        };

        let movement = match self.entities.entry(vehicle_id.clone()) {
            Entry::Occupied(mut entry) => {
                let from = entry.get().cell;
                if from != cell {
                    self.move_between(vehicle_id, from, cell);
                }
                entry.insert(tracked);
                if from == cell {
                    Movement::Unchanged(cell)
                } else {
                    Movement::Moved { from, to: cell }
                }
            }
            Entry::Vacant(entry) => {
                self.write_shard(cell)
                    .entry(cell)
                    .or_default()
                    .insert(vehicle_id.clone());
                entry.insert(tracked);
                Movement::Inserted(cell)
            }
        };

        trace!(vehicle = %vehicle_id, ?movement, "index upsert");
        Ok(movement)
    }

    /// Stop tracking a vehicle. Returns the cell it was removed from, if any.
    pub fn remove(&self, vehicle_id: &EntityId) -> Option<CellKey> {
        match self.entities.entry(vehicle_id.clone()) {
            Entry::Occupied(entry) => {
                let cell = entry.get().cell;
                self.detach(&mut self.write_shard(cell), cell, vehicle_id);
                entry.remove();
                Some(cell)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Cell currently holding the vehicle.
    #[must_use]
    pub fn cell_of(&self, vehicle_id: &EntityId) -> Option<CellKey> {
        self.entities.get(vehicle_id).map(|t| t.cell)
    }

    /// Last indexed position of the vehicle.
    #[must_use]
    pub fn position(&self, vehicle_id: &EntityId) -> Option<IndexedPosition> {
        self.entities.get(vehicle_id).map(|t| IndexedPosition {
            vehicle_id: vehicle_id.clone(),
            point: t.point,
            cell: t.cell,
            updated_at: t.updated_at,
        })
    }

    /// Vehicles in `cell`, sorted by id.
    #[must_use]
    pub fn cell_members(&self, cell: CellKey) -> Vec<EntityId> {
        let shard = self.cells[self.shard_for(cell)]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut members: Vec<EntityId> = shard
            .get(&cell)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Every tracked vehicle, sorted by id. Consistent per vehicle; concurrent
    /// upserts may or may not be reflected.
    #[must_use]
    pub fn snapshot(&self) -> Vec<IndexedPosition> {
        let mut out: Vec<IndexedPosition> = self
            .entities
            .iter()
            .map(|entry| IndexedPosition {
                vehicle_id: entry.key().clone(),
                point: entry.point,
                cell: entry.cell,
                updated_at: entry.updated_at,
            })
            .collect();
        out.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        out
    }

    /// Ids of every tracked vehicle (unordered).
    #[must_use]
    pub fn tracked_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.key().clone()).collect()
    }

    /// Candidate zones for `point`: zones whose coverage touches the point's
    /// cell or any of its eight neighbours, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::GridMismatch` if `coverage` was built on another grid.
    pub fn query_candidate_zones(
        &self,
        point: Point,
        coverage: &ZoneCoverage,
    ) -> Result<Vec<ZoneId>, IndexError> {
        if coverage.grid() != self.grid {
            return Err(IndexError::GridMismatch {
                coverage: coverage.grid().size(),
                index: self.grid.size(),
            });
        }
        Ok(coverage.candidates_near(self.grid.cell_of(point)))
    }

    // the remainder is below the shard count, so it fits a usize
    #[allow(clippy::cast_possible_truncation)]
    fn shard_for(&self, cell: CellKey) -> usize {
        (self.hasher.hash_one(cell) % self.cells.len() as u64) as usize
    }

    fn write_shard(&self, cell: CellKey) -> RwLockWriteGuard<'_, CellShard> {
        self.cells[self.shard_for(cell)]
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn move_between(&self, vehicle_id: &EntityId, from: CellKey, to: CellKey) {
        let (a, b) = (self.shard_for(from), self.shard_for(to));
        if a == b {
            let mut shard = self.write_shard(from);
            self.detach(&mut shard, from, vehicle_id);
            shard.entry(to).or_default().insert(vehicle_id.clone());
            return;
        }

        let (first, second) = (a.min(b), a.max(b));
        let mut low = self.cells[first]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut high = self.cells[second]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let (from_shard, to_shard) = if a < b {
            (&mut low, &mut high)
        } else {
            (&mut high, &mut low)
        };
        self.detach(from_shard, from, vehicle_id);
        to_shard.entry(to).or_default().insert(vehicle_id.clone());
    }

    #[allow(clippy::unused_self)]
    fn detach(&self, shard: &mut CellShard, cell: CellKey, vehicle_id: &EntityId) {
        if let Some(set) = shard.get_mut(&cell) {
            set.remove(vehicle_id);
            if set.is_empty() {
                shard.remove(&cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn index() -> SpatialIndex {
        SpatialIndex::new(Grid::new(1.0).unwrap(), 8).unwrap()
    }

    fn id(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn insert_then_move_keeps_single_membership() {
        let idx = index();
        let now = Utc::now();
        assert_eq!(
            idx.upsert(&id("a"), Point::new(0.5, 0.5), now).unwrap(),
            Movement::Inserted(CellKey::new(0, 0))
        );
        assert_eq!(
            idx.upsert(&id("a"), Point::new(2.5, 0.5), now).unwrap(),
            Movement::Moved {
                from: CellKey::new(0, 0),
                to: CellKey::new(2, 0)
            }
        );
        assert!(idx.cell_members(CellKey::new(0, 0)).is_empty());
        assert_eq!(idx.cell_members(CellKey::new(2, 0)), vec![id("a")]);
        assert_eq!(idx.occupied_cells(), 1);
    }

    #[test]
    fn same_cell_upsert_only_refreshes_position() {
        let idx = index();
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(30);
        idx.upsert(&id("a"), Point::new(0.1, 0.1), first).unwrap();
        let movement = idx.upsert(&id("a"), Point::new(0.9, 0.9), later).unwrap();

        assert_eq!(movement, Movement::Unchanged(CellKey::new(0, 0)));
        let pos = idx.position(&id("a")).unwrap();
        assert_eq!(pos.point, Point::new(0.9, 0.9));
        assert_eq!(pos.updated_at, later);
        assert_eq!(idx.cell_members(CellKey::new(0, 0)), vec![id("a")]);
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let idx = index();
        assert_eq!(idx.remove(&id("ghost")), None);
        assert!(idx.is_empty());
    }

    #[test]
    fn remove_then_reinsert_matches_never_removed() {
        let idx = index();
        let now = Utc::now();
        let p = Point::new(3.2, -1.7);
        idx.upsert(&id("a"), p, now).unwrap();
        let before = (idx.cell_of(&id("a")), idx.occupied_cells());

        assert_eq!(idx.remove(&id("a")), Some(CellKey::new(3, -2)));
        assert_eq!(idx.occupied_cells(), 0);
        idx.upsert(&id("a"), p, now).unwrap();

        assert_eq!((idx.cell_of(&id("a")), idx.occupied_cells()), before);
        assert_eq!(idx.cell_members(CellKey::new(3, -2)), vec![id("a")]);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn non_finite_point_rejected_without_side_effects() {
        let idx = index();
        let err = idx
            .upsert(&id("a"), Point::new(f64::NAN, 1.0), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::Position(CoreError::InvalidPosition { .. })
        ));
        assert!(idx.is_empty());
        assert_eq!(idx.occupied_cells(), 0);
    }

    #[test]
    fn snapshot_is_sorted_by_id() {
        let idx = index();
        let now = Utc::now();
        for name in ["c", "a", "b"] {
            idx.upsert(&id(name), Point::new(0.0, 0.0), now).unwrap();
        }
        let ids: Vec<_> = idx.snapshot().into_iter().map(|p| p.vehicle_id).collect();
        assert_eq!(ids, vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn candidate_query_rejects_foreign_grid() {
        let idx = index();
        let coverage = ZoneCoverage::empty(Grid::new(0.5).unwrap());
        assert!(matches!(
            idx.query_candidate_zones(Point::new(0.0, 0.0), &coverage),
            Err(IndexError::GridMismatch { .. })
        ));
    }
}
