//! Shared test utilities for fence-db unit tests.

use crate::service::FenceStore;

/// In-memory store with the schema applied.
pub async fn test_store() -> FenceStore {
    FenceStore::new_local(":memory:").await.unwrap()
}

/// GeoJSON for an axis-aligned square.
pub fn square(min: f64, max: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [[[min, min], [max, min], [max, max], [min, max], [min, min]]]
    })
}
