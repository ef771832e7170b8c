use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::geojson;
use crate::geometry::{Point, Ring};
use crate::ids::ZoneId;

/// A zone as stored: raw GeoJSON geometry, not yet validated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ZoneRecord {
    pub zone_id: ZoneId,
    pub name: String,
    pub geometry: serde_json::Value,
}

impl ZoneRecord {
    /// Validate the geometry and produce a [`Zone`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidGeometry` tagged with this zone's id.
    pub fn to_zone(&self) -> Result<Zone, CoreError> {
        let ring = geojson::polygon_ring(&self.geometry).map_err(|e| e.for_zone(self.zone_id))?;
        Ok(Zone {
            zone_id: self.zone_id,
            name: self.name.clone(),
            ring,
        })
    }
}

/// A named polygonal region with validated geometry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Zone {
    pub zone_id: ZoneId,
    pub name: String,
    #[schemars(with = "Vec<Point>")]
    pub ring: Ring,
}

impl Zone {
    /// Build a zone from `(lon, lat)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidGeometry` tagged with `zone_id`.
    pub fn from_pairs(
        zone_id: ZoneId,
        name: impl Into<String>,
        pairs: &[(f64, f64)],
    ) -> Result<Self, CoreError> {
        let ring = Ring::from_pairs(pairs).map_err(|e| e.for_zone(zone_id))?;
        Ok(Self {
            zone_id,
            name: name.into(),
            ring,
        })
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.ring.contains(point)
    }
}
