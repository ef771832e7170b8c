//! Zone repository: polygon CRUD.
//!
//! Geometry is stored as GeoJSON text exactly as given, after checking that it
//! yields a usable polygon ring.

use fence_core::entities::ZoneRecord;
use fence_core::geojson;
use fence_core::ids::ZoneId;
use serde_json::Value;

use crate::error::DatabaseError;
use crate::helpers::parse_json;
use crate::service::FenceStore;

const SELECT_COLS: &str = "zone_id, name, geometry";

fn row_to_zone(row: &libsql::Row) -> Result<ZoneRecord, DatabaseError> {
    Ok(ZoneRecord {
        zone_id: ZoneId(row.get(0)?),
        name: row.get(1)?,
        geometry: parse_json(&row.get::<String>(2)?)?,
    })
}

/// Partial zone update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ZoneUpdate {
    pub name: Option<String>,
    pub geometry: Option<Value>,
}

impl FenceStore {
    /// Insert a zone and return it with its assigned id.
    pub async fn create_zone(&self, name: &str, geometry: &Value) -> Result<ZoneRecord, DatabaseError> {
        geojson::polygon_ring(geometry)?;

        let mut rows = self
            .conn()
            .query(
                "INSERT INTO zones (name, geometry) VALUES (?1, ?2) RETURNING zone_id",
                libsql::params![name, geometry.to_string()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;

        Ok(ZoneRecord {
            zone_id: ZoneId(row.get(0)?),
            name: name.to_string(),
            geometry: geometry.clone(),
        })
    }

    pub async fn get_zone(&self, zone_id: ZoneId) -> Result<ZoneRecord, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM zones WHERE zone_id = ?1"),
                [zone_id.get()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Zone", zone_id))?;
        row_to_zone(&row)
    }

    /// Every stored zone, ascending by id. Geometry is returned unvalidated.
    pub async fn list_zones(&self) -> Result<Vec<ZoneRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM zones ORDER BY zone_id"), ())
            .await?;

        let mut zones = Vec::new();
        while let Some(row) = rows.next().await? {
            zones.push(row_to_zone(&row)?);
        }
        Ok(zones)
    }

    pub async fn update_zone(
        &self,
        zone_id: ZoneId,
        update: ZoneUpdate,
    ) -> Result<ZoneRecord, DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(name) = update.name {
            sets.push(format!("name = ?{idx}"));
            params.push(name.into());
            idx += 1;
        }
        if let Some(geometry) = update.geometry {
            geojson::polygon_ring(&geometry)?;
            sets.push(format!("geometry = ?{idx}"));
            params.push(geometry.to_string().into());
            idx += 1;
        }

        if sets.is_empty() {
            return self.get_zone(zone_id).await;
        }

        params.push(zone_id.get().into());
        let sql = format!("UPDATE zones SET {} WHERE zone_id = ?{idx}", sets.join(", "));
        let updated = self
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if updated == 0 {
            return Err(DatabaseError::not_found("Zone", zone_id));
        }

        self.get_zone(zone_id).await
    }

    /// Delete a zone. Its assignment history and counters go with it.
    pub async fn delete_zone(&self, zone_id: ZoneId) -> Result<(), DatabaseError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM zones WHERE zone_id = ?1", [zone_id.get()])
            .await?;
        if deleted == 0 {
            return Err(DatabaseError::not_found("Zone", zone_id));
        }
        Ok(())
    }
}
