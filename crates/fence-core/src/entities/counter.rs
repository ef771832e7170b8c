use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, ZoneId};

/// Cumulative number of epochs in which a vehicle was confirmed inside a zone.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Counter {
    pub vehicle_id: EntityId,
    pub zone_id: ZoneId,
    pub count: u64,
    pub last_counted: DateTime<Utc>,
}
