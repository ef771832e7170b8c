use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::geometry::Point;
use crate::ids::EntityId;

/// Latest reported position of a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct VehiclePosition {
    pub vehicle_id: EntityId,
    pub longitude: f64,
    pub latitude: f64,
    pub updated_at: DateTime<Utc>,
}

impl VehiclePosition {
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    /// Reject non-finite coordinates.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPosition` if either coordinate is NaN or infinite.
    pub fn validate(&self) -> Result<Point, CoreError> {
        let point = self.point();
        if point.is_finite() {
            Ok(point)
        } else {
            Err(CoreError::InvalidPosition {
                entity: self.vehicle_id.clone(),
                longitude: self.longitude,
                latitude: self.latitude,
            })
        }
    }
}
