use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, ZoneId};

/// A confirmed containment: vehicle was inside zone at this epoch.
///
/// History accumulates; there is at most one assignment per vehicle per epoch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Assignment {
    pub vehicle_id: EntityId,
    pub zone_id: ZoneId,
    pub assigned_at: DateTime<Utc>,
}

/// One line of the mapping report: an assignment joined with its zone name
/// and the current counter for the pair.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MappingRow {
    pub vehicle_id: EntityId,
    pub place: String,
    pub counter: u64,
}
