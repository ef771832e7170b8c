//! Mapping report: which vehicles have been assigned where, with their tallies.

use fence_core::entities::MappingRow;
use fence_core::ids::EntityId;

use crate::error::DatabaseError;
use crate::helpers::get_count;
use crate::service::FenceStore;

impl FenceStore {
    /// One row per (vehicle, zone) pair that has assignment history and a
    /// counter, ordered by vehicle then zone. Empty when nothing was assigned.
    pub async fn mapping(&self) -> Result<Vec<MappingRow>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT DISTINCT a.vehicle_id, z.name, c.count, z.zone_id \
                 FROM assignments a \
                 JOIN zones z ON a.zone_id = z.zone_id \
                 JOIN counters c ON a.vehicle_id = c.vehicle_id AND a.zone_id = c.zone_id \
                 ORDER BY a.vehicle_id, z.zone_id",
                (),
            )
            .await?;

        let mut mapping = Vec::new();
        while let Some(row) = rows.next().await? {
            mapping.push(MappingRow {
                vehicle_id: EntityId::new(row.get::<String>(0)?),
                place: row.get(1)?,
                counter: get_count(&row, 2)?,
            });
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{square, test_store};

    #[tokio::test]
    async fn empty_store_yields_empty_mapping() {
        let store = test_store().await;
        assert!(store.mapping().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_assignments_collapse_to_one_row() {
        let store = test_store().await;
        let depot = store.create_zone("depot", &square(0.0, 1.0)).await.unwrap();
        let taxi = EntityId::new("taxi-1");
        for count in 1..=3 {
            let now = Utc::now();
            store.record_assignment(&taxi, depot.zone_id, now).await.unwrap();
            store.upsert_counter(&taxi, depot.zone_id, count, now).await.unwrap();
        }

        assert_eq!(
            store.mapping().await.unwrap(),
            vec![MappingRow {
                vehicle_id: taxi,
                place: "depot".into(),
                counter: 3,
            }]
        );
    }
}
