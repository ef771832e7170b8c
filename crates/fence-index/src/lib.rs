//! # fence-index
//!
//! Grid-based spatial hash for Fenceline.
//!
//! - [`Grid`] quantizes positions to integer cell keys.
//! - [`SpatialIndex`] tracks which cell every vehicle occupies, with sharded
//!   locking so feed updates and parallel epoch workers do not contend on one
//!   global lock.
//! - [`ZoneCoverage`] maps cells to the zones whose bounding boxes overlap
//!   them, giving a candidate prefilter for the exact containment test.

mod coverage;
mod error;
mod grid;
mod spatial;

pub use coverage::ZoneCoverage;
pub use error::IndexError;
pub use grid::{CellKey, CellRect, Grid};
pub use spatial::{IndexedPosition, Movement, SpatialIndex};
