//! Serialized entity shapes validated against their generated JSON Schemas.

use chrono::Utc;
use fence_core::entities::*;
use fence_core::epoch::*;
use fence_core::ids::{EntityId, ZoneId};
use schemars::schema_for;
use serde_json::json;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! conforms_to_schema {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

conforms_to_schema!(
    vehicle_position_schema,
    VehiclePosition,
    VehiclePosition {
        vehicle_id: EntityId::new("taxi-1"),
        longitude: 106.845_13,
        latitude: -6.214_62,
        updated_at: Utc::now(),
    }
);

conforms_to_schema!(
    zone_schema,
    Zone,
    Zone::from_pairs(ZoneId(1), "Depot", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).unwrap()
);

conforms_to_schema!(
    zone_record_schema,
    ZoneRecord,
    ZoneRecord {
        zone_id: ZoneId(2),
        name: "Airport".into(),
        geometry: json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]}),
    }
);

conforms_to_schema!(
    counter_schema,
    Counter,
    Counter {
        vehicle_id: EntityId::new("taxi-1"),
        zone_id: ZoneId(1),
        count: 12,
        last_counted: Utc::now(),
    }
);

conforms_to_schema!(
    mapping_row_schema,
    MappingRow,
    MappingRow {
        vehicle_id: EntityId::new("taxi-1"),
        place: "Depot".into(),
        counter: 3,
    }
);

conforms_to_schema!(
    skipped_event_schema,
    AssignmentEvent,
    AssignmentEvent::Skipped {
        vehicle_id: EntityId::new("taxi-2"),
        reason: SkipReason::Interrupted,
    }
);

conforms_to_schema!(
    summary_schema,
    EpochSummary,
    EpochSummary {
        seq: 4,
        started_at: Some(Utc::now()),
        processed: 10,
        assigned: 6,
        unassigned: 3,
        skipped: 1,
        zones_loaded: 5,
        zones_skipped: 1,
        sink_failures: 0,
        interrupted: false,
        duration_ms: 12,
    }
);

#[test]
fn zone_ring_deserialization_revalidates() {
    let raw = json!({
        "zone_id": 9,
        "name": "Line",
        "ring": [{"lon": 0.0, "lat": 0.0}, {"lon": 1.0, "lat": 1.0}]
    });
    assert!(serde_json::from_value::<Zone>(raw).is_err());
}
