//! Zone coverage: which zones could contain a point in a given cell.
//!
//! Each zone's bounding box is quantized to a [`CellRect`]. Zones spanning at
//! most `max_cells_per_zone` cells are inverted into a cell → zones map; larger
//! zones stay in a short list matched by rectangle overlap so a continent-sized
//! polygon does not allocate millions of cell entries.
//!
//! Queries always look at the 3×3 neighbourhood of the point's cell. The
//! result may contain zones that do not contain the point; it never omits one
//! that does.

use std::collections::HashMap;

use fence_core::geometry::BoundingBox;
use fence_core::ids::ZoneId;

use crate::grid::{CellKey, CellRect, Grid};

/// Precomputed cell coverage for one zone snapshot.
#[derive(Debug, Clone)]
pub struct ZoneCoverage {
    grid: Grid,
    by_cell: HashMap<CellKey, Vec<ZoneId>>,
    wide: Vec<(ZoneId, CellRect)>,
    zones: usize,
}

impl ZoneCoverage {
    /// Build coverage for `zones` on `grid`.
    pub fn build(
        grid: Grid,
        zones: impl IntoIterator<Item = (ZoneId, BoundingBox)>,
        max_cells_per_zone: usize,
    ) -> Self {
        let mut by_cell: HashMap<CellKey, Vec<ZoneId>> = HashMap::new();
        let mut wide = Vec::new();
        let mut count = 0;

        for (zone_id, bounds) in zones {
            count += 1;
            let rect = grid.rect_of(bounds);
            if rect.cell_count() > max_cells_per_zone as u128 {
                wide.push((zone_id, rect));
                continue;
            }
            for cell in rect.cells() {
                by_cell.entry(cell).or_default().push(zone_id);
            }
        }

        Self {
            grid,
            by_cell,
            wide,
            zones: count,
        }
    }

    /// Empty coverage (no zones loaded yet).
    #[must_use]
    pub fn empty(grid: Grid) -> Self {
        Self::build(grid, std::iter::empty(), 0)
    }

    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// Number of zones in the snapshot.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.zones
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.zones == 0
    }

    /// Zones matched by rectangle overlap rather than per-cell entries.
    #[must_use]
    pub fn wide_zone_count(&self) -> usize {
        self.wide.len()
    }

    /// Candidate zones for a point in `cell`, ascending by id, without duplicates.
    #[must_use]
    pub fn candidates_near(&self, cell: CellKey) -> Vec<ZoneId> {
        let neighborhood = cell.neighborhood();
        let mut out: Vec<ZoneId> = neighborhood
            .cells()
            .filter_map(|c| self.by_cell.get(&c))
            .flatten()
            .copied()
            .collect();
        out.extend(
            self.wide
                .iter()
                .filter(|(_, rect)| rect.intersects(&neighborhood))
                .map(|(id, _)| *id),
        );
        out.sort_unstable();
        out.dedup();
        out
    }
}
