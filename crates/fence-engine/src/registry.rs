//! Zone registry: the validated polygon set for the current epoch.
//!
//! The zone set is held as an immutable [`ZoneSnapshot`] behind an
//! `RwLock<Arc<_>>`. Readers clone the `Arc` and evaluate against it without
//! holding the lock; a load builds a fresh snapshot and swaps it in under the
//! write lock, so an epoch that already took its snapshot is unaffected.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use fence_config::IndexConfig;
use fence_core::entities::{Zone, ZoneRecord};
use fence_core::errors::CoreError;
use fence_core::geometry::Point;
use fence_core::ids::ZoneId;
use fence_index::{Grid, IndexError, ZoneCoverage};
use tracing::{debug, warn};

/// Immutable zone arena, sorted by zone id, with its cell coverage.
#[derive(Debug, Clone)]
pub struct ZoneSnapshot {
    zones: Vec<Zone>,
    coverage: ZoneCoverage,
}

impl ZoneSnapshot {
    fn build(mut zones: Vec<Zone>, grid: Grid, max_cells_per_zone: usize) -> Self {
        zones.sort_by_key(|z| z.zone_id);
        let coverage = ZoneCoverage::build(
            grid,
            zones.iter().map(|z| (z.zone_id, z.ring.bounds())),
            max_cells_per_zone,
        );
        Self { zones, coverage }
    }

    /// Zone by id.
    #[must_use]
    pub fn get(&self, zone_id: ZoneId) -> Option<&Zone> {
        self.zones
            .binary_search_by_key(&zone_id, |z| z.zone_id)
            .ok()
            .map(|slot| &self.zones[slot])
    }

    /// Exact containment with inclusive boundary. Unknown zones never contain.
    #[must_use]
    pub fn contains(&self, zone_id: ZoneId, point: Point) -> bool {
        self.get(zone_id).is_some_and(|z| z.contains(point))
    }

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub const fn coverage(&self) -> &ZoneCoverage {
        &self.coverage
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Outcome of a lenient [`ZoneRegistry::refresh`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    /// One `InvalidGeometry` (or duplicate-id `Validation`) error per
    /// skipped record.
    pub skipped: Vec<CoreError>,
}

/// Holds the zone set used for containment tests.
#[derive(Debug)]
pub struct ZoneRegistry {
    grid: Grid,
    max_cells_per_zone: usize,
    current: RwLock<Arc<ZoneSnapshot>>,
}

impl ZoneRegistry {
    /// Empty registry whose coverage is built on `grid`.
    #[must_use]
    pub fn new(grid: Grid, max_cells_per_zone: usize) -> Self {
        Self {
            grid,
            max_cells_per_zone,
            current: RwLock::new(Arc::new(ZoneSnapshot::build(
                Vec::new(),
                grid,
                max_cells_per_zone,
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns `IndexError::InvalidConfig` for an unusable grid size.
    pub fn from_config(config: &IndexConfig) -> Result<Self, IndexError> {
        Ok(Self::new(
            Grid::new(config.grid_size)?,
            config.max_cells_per_zone,
        ))
    }

    /// Replace the zone set, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidGeometry` encountered, or `Validation` for a
    /// repeated zone id. The previous zone set stays installed.
    pub fn load(&self, records: &[ZoneRecord]) -> Result<usize, CoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut zones = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.zone_id) {
                return Err(duplicate(record.zone_id));
            }
            zones.push(record.to_zone()?);
        }
        Ok(self.install(zones))
    }

    /// Replace the zone set, skipping records that fail validation.
    pub fn refresh(&self, records: &[ZoneRecord]) -> LoadReport {
        let mut seen = HashSet::with_capacity(records.len());
        let mut zones = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for record in records {
            if !seen.insert(record.zone_id) {
                skipped.push(duplicate(record.zone_id));
                continue;
            }
            match record.to_zone() {
                Ok(zone) => zones.push(zone),
                Err(error) => {
                    warn!(zone = %record.zone_id, name = %record.name, %error, "skipping zone");
                    skipped.push(error);
                }
            }
        }

        let loaded = self.install(zones);
        LoadReport { loaded, skipped }
    }

    /// Install already-validated zones. Returns the zone count.
    pub fn install(&self, zones: Vec<Zone>) -> usize {
        let snapshot = Arc::new(ZoneSnapshot::build(
            zones,
            self.grid,
            self.max_cells_per_zone,
        ));
        let loaded = snapshot.len();
        debug!(
            zones = loaded,
            wide = snapshot.coverage().wide_zone_count(),
            "zone snapshot installed"
        );
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        loaded
    }

    /// The snapshot readers should evaluate against.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ZoneSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn contains(&self, zone_id: ZoneId, point: Point) -> bool {
        self.snapshot().contains(zone_id, point)
    }

    /// Every zone, ascending by id.
    #[must_use]
    pub fn all(&self) -> Vec<Zone> {
        self.snapshot().zones().to_vec()
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }
}

fn duplicate(zone_id: ZoneId) -> CoreError {
    CoreError::Validation(format!("duplicate zone id {zone_id}"))
}
