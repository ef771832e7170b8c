//! Cell quantization.

use fence_core::geometry::{BoundingBox, Point};

use crate::error::IndexError;

/// Fixed-size square grid over (lon, lat) degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    size: f64,
}

impl Grid {
    /// # Errors
    ///
    /// Returns `IndexError::InvalidConfig` unless `size` is positive and finite.
    pub fn new(size: f64) -> Result<Self, IndexError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(IndexError::InvalidConfig(format!(
                "grid size must be positive and finite, got {size}"
            )));
        }
        Ok(Self { size })
    }

    #[must_use]
    pub const fn size(self) -> f64 {
        self.size
    }

    /// `(floor(lon / size), floor(lat / size))`. Out-of-range values saturate.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(self, p: Point) -> CellKey {
        CellKey {
            x: (p.lon / self.size).floor() as i64,
            y: (p.lat / self.size).floor() as i64,
        }
    }

    /// Cells spanned by a bounding box, inclusive on both corners.
    #[must_use]
    pub fn rect_of(self, bounds: BoundingBox) -> CellRect {
        CellRect {
            min: self.cell_of(bounds.min),
            max: self.cell_of(bounds.max),
        }
    }
}

/// Integer grid coordinates of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The 3×3 block centred on this cell.
    #[must_use]
    pub const fn neighborhood(self) -> CellRect {
        CellRect {
            min: Self::new(self.x.saturating_sub(1), self.y.saturating_sub(1)),
            max: Self::new(self.x.saturating_add(1), self.y.saturating_add(1)),
        }
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min: CellKey,
    pub max: CellKey,
}

impl CellRect {
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Number of cells covered, saturating at `u128::MAX`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn cell_count(&self) -> u128 {
        let w = (self.max.x as i128 - self.min.x as i128 + 1) as u128;
        let h = (self.max.y as i128 - self.min.y as i128 + 1) as u128;
        w.saturating_mul(h)
    }

    /// Every cell in the rectangle, row by row.
    pub fn cells(self) -> impl Iterator<Item = CellKey> {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| CellKey::new(x, y)))
    }
}
