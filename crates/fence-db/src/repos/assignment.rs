//! Assignment history repository.

use chrono::{DateTime, Utc};
use fence_core::entities::Assignment;
use fence_core::ids::{EntityId, ZoneId};

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::service::FenceStore;

const SELECT_COLS: &str = "vehicle_id, zone_id, assigned_at";

fn row_to_assignment(row: &libsql::Row) -> Result<Assignment, DatabaseError> {
    Ok(Assignment {
        vehicle_id: EntityId::new(row.get::<String>(0)?),
        zone_id: ZoneId(row.get(1)?),
        assigned_at: parse_datetime(&row.get::<String>(2)?)?,
    })
}

impl FenceStore {
    pub async fn record_assignment(
        &self,
        vehicle_id: &EntityId,
        zone_id: ZoneId,
        at: DateTime<Utc>,
    ) -> Result<Assignment, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO assignments (vehicle_id, zone_id, assigned_at) VALUES (?1, ?2, ?3)",
                libsql::params![vehicle_id.as_str(), zone_id.get(), at.to_rfc3339()],
            )
            .await?;
        Ok(Assignment {
            vehicle_id: vehicle_id.clone(),
            zone_id,
            assigned_at: at,
        })
    }

    /// Most recent assignments first, optionally for one vehicle.
    pub async fn list_assignments(
        &self,
        vehicle_id: Option<&EntityId>,
        limit: u32,
    ) -> Result<Vec<Assignment>, DatabaseError> {
        let mut rows = match vehicle_id {
            Some(id) => {
                self.conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM assignments WHERE vehicle_id = ?1 \
                             ORDER BY assigned_at DESC, id DESC LIMIT ?2"
                        ),
                        libsql::params![id.as_str(), i64::from(limit)],
                    )
                    .await?
            }
            None => {
                self.conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM assignments \
                             ORDER BY assigned_at DESC, id DESC LIMIT ?1"
                        ),
                        [i64::from(limit)],
                    )
                    .await?
            }
        };

        let mut assignments = Vec::new();
        while let Some(row) = rows.next().await? {
            assignments.push(row_to_assignment(&row)?);
        }
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{square, test_store};

    #[tokio::test]
    async fn history_accumulates_newest_first() {
        let store = test_store().await;
        let zone = store.create_zone("depot", &square(0.0, 1.0)).await.unwrap();
        let taxi = EntityId::new("taxi-1");
        let other = EntityId::new("taxi-2");
        let t0: DateTime<Utc> = "2026-02-08T12:00:00Z".parse().unwrap();

        for i in 0..3 {
            store
                .record_assignment(&taxi, zone.zone_id, t0 + Duration::minutes(5 * i))
                .await
                .unwrap();
        }
        store.record_assignment(&other, zone.zone_id, t0).await.unwrap();

        let mine = store.list_assignments(Some(&taxi), 10).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert_eq!(mine[0].assigned_at, t0 + Duration::minutes(10));

        let all = store.list_assignments(None, 2).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn assignment_to_unknown_zone_fails() {
        let store = test_store().await;
        let result = store
            .record_assignment(&EntityId::new("taxi-1"), ZoneId(404), Utc::now())
            .await;
        assert!(result.is_err());
    }
}
