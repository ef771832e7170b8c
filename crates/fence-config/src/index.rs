//! Spatial index configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default grid cell edge, in degrees (roughly 1.1 km at the equator).
const fn default_grid_size() -> f64 {
    0.01
}

const fn default_shards() -> usize {
    64
}

const fn default_max_cells_per_zone() -> usize {
    4096
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Edge length of a grid cell in degrees. Too small inflates cell
    /// bookkeeping; too large degrades the prefilter toward a full scan.
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,

    /// Number of lock shards for cell and entity maps.
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Zones whose bounding box covers more cells than this are matched by
    /// rectangle overlap instead of being expanded into every cell.
    #[serde(default = "default_max_cells_per_zone")]
    pub max_cells_per_zone: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            shards: default_shards(),
            max_cells_per_zone: default_max_cells_per_zone(),
        }
    }
}

impl IndexConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ConfigError::invalid(
                "index.grid_size",
                format!("must be a positive finite number, got {}", self.grid_size),
            ));
        }
        if self.shards == 0 {
            return Err(ConfigError::invalid("index.shards", "must be at least 1"));
        }
        Ok(())
    }
}
