//! Vehicle repository: position reports and CRUD.

use chrono::{DateTime, Utc};
use fence_core::entities::VehiclePosition;
use fence_core::ids::EntityId;

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::service::FenceStore;

const SELECT_COLS: &str = "vehicle_id, longitude, latitude, updated_at";

fn row_to_vehicle(row: &libsql::Row) -> Result<VehiclePosition, DatabaseError> {
    Ok(VehiclePosition {
        vehicle_id: EntityId::new(row.get::<String>(0)?),
        longitude: row.get(1)?,
        latitude: row.get(2)?,
        updated_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

fn checked(
    vehicle_id: &EntityId,
    longitude: f64,
    latitude: f64,
    at: DateTime<Utc>,
) -> Result<VehiclePosition, DatabaseError> {
    let position = VehiclePosition {
        vehicle_id: vehicle_id.clone(),
        longitude,
        latitude,
        updated_at: at,
    };
    position.validate()?;
    Ok(position)
}

impl FenceStore {
    /// Insert a vehicle. Returns `false` if it already existed (left untouched).
    pub async fn create_vehicle(
        &self,
        vehicle_id: &EntityId,
        longitude: f64,
        latitude: f64,
    ) -> Result<bool, DatabaseError> {
        let position = checked(vehicle_id, longitude, latitude, Utc::now())?;
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO vehicles (vehicle_id, longitude, latitude, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    vehicle_id.as_str(),
                    position.longitude,
                    position.latitude,
                    position.updated_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(inserted > 0)
    }

    /// Record a position report, creating the vehicle if needed.
    pub async fn report_position(
        &self,
        vehicle_id: &EntityId,
        longitude: f64,
        latitude: f64,
        at: DateTime<Utc>,
    ) -> Result<VehiclePosition, DatabaseError> {
        let position = checked(vehicle_id, longitude, latitude, at)?;
        self.conn()
            .execute(
                "INSERT INTO vehicles (vehicle_id, longitude, latitude, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(vehicle_id) DO UPDATE SET
                    longitude = excluded.longitude,
                    latitude = excluded.latitude,
                    updated_at = excluded.updated_at",
                libsql::params![
                    vehicle_id.as_str(),
                    longitude,
                    latitude,
                    at.to_rfc3339()
                ],
            )
            .await?;
        Ok(position)
    }

    /// Move an existing vehicle.
    pub async fn update_vehicle(
        &self,
        vehicle_id: &EntityId,
        longitude: f64,
        latitude: f64,
    ) -> Result<VehiclePosition, DatabaseError> {
        let position = checked(vehicle_id, longitude, latitude, Utc::now())?;
        let updated = self
            .conn()
            .execute(
                "UPDATE vehicles SET longitude = ?1, latitude = ?2, updated_at = ?3
                 WHERE vehicle_id = ?4",
                libsql::params![
                    longitude,
                    latitude,
                    position.updated_at.to_rfc3339(),
                    vehicle_id.as_str()
                ],
            )
            .await?;
        if updated == 0 {
            return Err(DatabaseError::not_found("Vehicle", vehicle_id));
        }
        Ok(position)
    }

    pub async fn get_vehicle(&self, vehicle_id: &EntityId) -> Result<VehiclePosition, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM vehicles WHERE vehicle_id = ?1"),
                [vehicle_id.as_str()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Vehicle", vehicle_id))?;
        row_to_vehicle(&row)
    }

    pub async fn list_vehicles(&self) -> Result<Vec<VehiclePosition>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM vehicles ORDER BY vehicle_id"),
                (),
            )
            .await?;

        let mut vehicles = Vec::new();
        while let Some(row) = rows.next().await? {
            vehicles.push(row_to_vehicle(&row)?);
        }
        Ok(vehicles)
    }

    pub async fn delete_vehicle(&self, vehicle_id: &EntityId) -> Result<(), DatabaseError> {
        let deleted = self
            .conn()
            .execute(
                "DELETE FROM vehicles WHERE vehicle_id = ?1",
                [vehicle_id.as_str()],
            )
            .await?;
        if deleted == 0 {
            return Err(DatabaseError::not_found("Vehicle", vehicle_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fence_core::errors::CoreError;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::test_store;

    #[tokio::test]
    async fn create_vehicle_ignores_existing() {
        let store = test_store().await;
        let id = EntityId::new("taxi-1");

        assert!(store.create_vehicle(&id, 1.0, 2.0).await.unwrap());
        assert!(!store.create_vehicle(&id, 9.0, 9.0).await.unwrap());

        let fetched = store.get_vehicle(&id).await.unwrap();
        assert_eq!((fetched.longitude, fetched.latitude), (1.0, 2.0));
    }

    #[tokio::test]
    async fn report_position_upserts() {
        let store = test_store().await;
        let id = EntityId::new("taxi-1");
        let at: DateTime<Utc> = "2026-02-08T12:00:00Z".parse().unwrap();

        store.report_position(&id, 1.0, 1.0, at).await.unwrap();
        store.report_position(&id, 3.0, 4.0, at).await.unwrap();

        let vehicles = store.list_vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!((vehicles[0].longitude, vehicles[0].latitude), (3.0, 4.0));
        assert_eq!(vehicles[0].updated_at, at);
    }

    #[tokio::test]
    async fn update_missing_vehicle_is_not_found() {
        let store = test_store().await;
        let err = store
            .update_vehicle(&EntityId::new("ghost"), 0.0, 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn non_finite_position_never_reaches_sql() {
        let store = test_store().await;
        let err = store
            .report_position(&EntityId::new("taxi-1"), f64::INFINITY, 0.0, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Invalid(CoreError::InvalidPosition { .. })
        ));
        assert!(store.list_vehicles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_vehicle_then_get_fails() {
        let store = test_store().await;
        let id = EntityId::new("taxi-1");
        store.create_vehicle(&id, 0.0, 0.0).await.unwrap();
        store.delete_vehicle(&id).await.unwrap();
        assert!(matches!(
            store.get_vehicle(&id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(store.delete_vehicle(&id).await.is_err());
    }
}
