//! Visit counter repository.

use chrono::{DateTime, Utc};
use fence_core::entities::Counter;
use fence_core::ids::{EntityId, ZoneId};

use crate::error::DatabaseError;
use crate::helpers::{count_param, get_count, parse_datetime};
use crate::service::FenceStore;

const SELECT_COLS: &str = "vehicle_id, zone_id, count, last_counted";

fn row_to_counter(row: &libsql::Row) -> Result<Counter, DatabaseError> {
    Ok(Counter {
        vehicle_id: EntityId::new(row.get::<String>(0)?),
        zone_id: ZoneId(row.get(1)?),
        count: get_count(row, 2)?,
        last_counted: parse_datetime(&row.get::<String>(3)?)?,
    })
}

impl FenceStore {
    /// Write the tally for a pair, creating the row on first visit.
    ///
    /// The stored count never moves backwards: a write below the current
    /// value (from a runner that has not caught up yet) leaves the row as it
    /// is. Returns the row as stored.
    pub async fn upsert_counter(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        count: u64,
        at: DateTime<Utc>,
    ) -> Result<Counter, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "INSERT INTO counters (vehicle_id, zone_id, count, last_counted)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(vehicle_id, zone_id) DO UPDATE SET
                        count = MAX(counters.count, excluded.count),
                        last_counted = CASE
                            WHEN excluded.count >= counters.count THEN excluded.last_counted
                            ELSE counters.last_counted
                        END
                     RETURNING {SELECT_COLS}"
                ),
                libsql::params![
                    vehicle_id.as_str(),
                    zone_id.get(),
                    count_param(count),
                    at.to_rfc3339()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_counter(&row)
    }

    pub async fn get_counter(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
    ) -> Result<Option<Counter>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM counters WHERE vehicle_id = ?1 AND zone_id = ?2"),
                libsql::params![vehicle_id.as_str(), zone_id.get()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_counter(&row)?)),
            None => Ok(None),
        }
    }

    /// Every counter ordered by (vehicle, zone). Used to seed the engine.
    pub async fn list_counters(&self) -> Result<Vec<Counter>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM counters ORDER BY vehicle_id, zone_id"),
                (),
            )
            .await?;

        let mut counters = Vec::new();
        while let Some(row) = rows.next().await? {
            counters.push(row_to_counter(&row)?);
        }
        Ok(counters)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{square, test_store};

    #[tokio::test]
    async fn upsert_overwrites_count_and_timestamp() {
        let store = test_store().await;
        let zone = store.create_zone("depot", &square(0.0, 1.0)).await.unwrap();
        let taxi = EntityId::new("taxi-1");
        let first: DateTime<Utc> = "2026-02-08T12:00:00Z".parse().unwrap();
        let second: DateTime<Utc> = "2026-02-08T12:05:00Z".parse().unwrap();

        store.upsert_counter(&taxi, zone.zone_id, 1, first).await.unwrap();
        store.upsert_counter(&taxi, zone.zone_id, 2, second).await.unwrap();

        let counter = store.get_counter(&taxi, zone.zone_id).await.unwrap().unwrap();
        assert_eq!(counter.count, 2);
        assert_eq!(counter.last_counted, second);
        assert_eq!(store.list_counters().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lower_count_never_overwrites_higher() {
        let store = test_store().await;
        let zone = store.create_zone("depot", &square(0.0, 1.0)).await.unwrap();
        let taxi = EntityId::new("taxi-1");
        let newer: DateTime<Utc> = "2026-02-08T12:10:00Z".parse().unwrap();
        let older: DateTime<Utc> = "2026-02-08T12:05:00Z".parse().unwrap();

        store.upsert_counter(&taxi, zone.zone_id, 3, newer).await.unwrap();
        let stored = store.upsert_counter(&taxi, zone.zone_id, 2, older).await.unwrap();

        assert_eq!(stored.count, 3);
        assert_eq!(stored.last_counted, newer);
        let counter = store.get_counter(&taxi, zone.zone_id).await.unwrap().unwrap();
        assert_eq!(counter.count, 3);
        assert_eq!(counter.last_counted, newer);
    }

    #[tokio::test]
    async fn missing_counter_is_none() {
        let store = test_store().await;
        assert!(store
            .get_counter(&EntityId::new("taxi-1"), ZoneId(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn deleting_zone_drops_its_counters() {
        let store = test_store().await;
        let zone = store.create_zone("depot", &square(0.0, 1.0)).await.unwrap();
        let taxi = EntityId::new("taxi-1");
        store.upsert_counter(&taxi, zone.zone_id, 4, Utc::now()).await.unwrap();

        store.delete_zone(zone.zone_id).await.unwrap();

        assert!(store.list_counters().await.unwrap().is_empty());
    }
}
