//! Camp persistence
//!
//! The [`CampRepository`] trait is the storage contract the engine and
//! services depend on; [`MySqlCampRepository`] is the production
//! implementation. Occupancy mutation goes through a single conditional
//! update so the capacity check and the write are indivisible.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use super::types::{Camp, CampResources, CampStatus};
use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Outcome of a conditional occupancy update
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    /// The update applied; carries the post-update camp row
    Reserved(Camp),
    /// The capacity (or floor) check failed at write time, or the camp is gone
    Conflict,
}

/// Storage contract for camps
#[async_trait]
pub trait CampRepository: Send + Sync {
    async fn insert(&self, camp: &Camp) -> Result<()>;

    async fn fetch(&self, camp_id: Uuid) -> Result<Option<Camp>>;

    async fn fetch_by_name(&self, name: &str) -> Result<Option<Camp>>;

    async fn list(&self) -> Result<Vec<Camp>>;

    /// Camps whose status permits intake and whose free capacity is at least
    /// `required_space`, in stable creation order
    async fn find_eligible(&self, required_space: u32) -> Result<Vec<Camp>>;

    /// Persist descriptive fields and status
    ///
    /// `current_occupancy` is only ever written through [`Self::adjust_occupancy`],
    /// and connections only through [`Self::connect`].
    async fn update(&self, camp: &Camp) -> Result<()>;

    async fn remove(&self, camp_id: Uuid) -> Result<()>;

    /// Apply `delta` to the camp's occupancy iff the result stays within
    /// `[0, capacity]` — one atomic check-and-write
    async fn adjust_occupancy(&self, camp_id: Uuid, delta: i64) -> Result<ReserveOutcome>;

    async fn set_status(&self, camp_id: Uuid, status: CampStatus) -> Result<()>;

    /// Insert both directions of the `camp_id <-> other` edge, idempotently;
    /// both sides land or neither does
    async fn connect(&self, camp_id: Uuid, other: Uuid) -> Result<()>;
}

/// MySQL-backed camp repository
pub struct MySqlCampRepository {
    pool: MySqlPool,
}

impl MySqlCampRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_connections(&self, camp_id: &str) -> Result<Vec<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT connected_camp_id FROM camp_connections WHERE camp_id = ?
            "#,
        )
        .bind(camp_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|(id,)| parse_uuid(&id)).collect()
    }

    async fn load_connection_map(&self) -> Result<HashMap<String, Vec<Uuid>>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT camp_id, connected_camp_id FROM camp_connections
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<String, Vec<Uuid>> = HashMap::new();
        for (camp_id, connected) in rows {
            map.entry(camp_id).or_default().push(parse_uuid(&connected)?);
        }
        Ok(map)
    }

    async fn attach_connections(&self, rows: Vec<CampRow>) -> Result<Vec<Camp>> {
        let mut connections = self.load_connection_map().await?;
        rows.into_iter()
            .map(|row| {
                let connected = connections.remove(&row.camp_id).unwrap_or_default();
                row.into_camp(connected)
            })
            .collect()
    }
}

#[async_trait]
impl CampRepository for MySqlCampRepository {
    async fn insert(&self, camp: &Camp) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO camps
                (camp_id, name, address, latitude, longitude, capacity, current_occupancy,
                 food, water, medical, shelter, facilities, status, managed_by,
                 contact_number, established_at)
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(camp.camp_id.to_string())
        .bind(&camp.name)
        .bind(&camp.address)
        .bind(camp.coordinate.latitude)
        .bind(camp.coordinate.longitude)
        .bind(camp.capacity)
        .bind(camp.current_occupancy)
        .bind(camp.resources.food)
        .bind(camp.resources.water)
        .bind(camp.resources.medical)
        .bind(camp.resources.shelter)
        .bind(serde_json::to_value(&camp.facilities)?)
        .bind(camp.status.to_string())
        .bind(&camp.managed_by)
        .bind(&camp.contact_number)
        .bind(camp.established_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, camp_id: Uuid) -> Result<Option<Camp>> {
        let row = sqlx::query_as::<_, CampRow>(
            r#"
            SELECT camp_id, name, address, latitude, longitude, capacity, current_occupancy,
                   food, water, medical, shelter, facilities, status, managed_by,
                   contact_number, established_at
            FROM camps
            WHERE camp_id = ?
            "#,
        )
        .bind(camp_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let connected = self.load_connections(&row.camp_id).await?;
                Ok(Some(row.into_camp(connected)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_by_name(&self, name: &str) -> Result<Option<Camp>> {
        let row = sqlx::query_as::<_, CampRow>(
            r#"
            SELECT camp_id, name, address, latitude, longitude, capacity, current_occupancy,
                   food, water, medical, shelter, facilities, status, managed_by,
                   contact_number, established_at
            FROM camps
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let connected = self.load_connections(&row.camp_id).await?;
                Ok(Some(row.into_camp(connected)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Camp>> {
        let rows = sqlx::query_as::<_, CampRow>(
            r#"
            SELECT camp_id, name, address, latitude, longitude, capacity, current_occupancy,
                   food, water, medical, shelter, facilities, status, managed_by,
                   contact_number, established_at
            FROM camps
            ORDER BY established_at, camp_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.attach_connections(rows).await
    }

    async fn find_eligible(&self, required_space: u32) -> Result<Vec<Camp>> {
        let rows = sqlx::query_as::<_, CampRow>(
            r#"
            SELECT camp_id, name, address, latitude, longitude, capacity, current_occupancy,
                   food, water, medical, shelter, facilities, status, managed_by,
                   contact_number, established_at
            FROM camps
            WHERE status IN ('Active', 'Emergency')
              AND capacity - current_occupancy >= ?
            ORDER BY established_at, camp_id
            "#,
        )
        .bind(required_space)
        .fetch_all(&self.pool)
        .await?;

        self.attach_connections(rows).await
    }

    async fn update(&self, camp: &Camp) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE camps SET
                name = ?,
                address = ?,
                latitude = ?,
                longitude = ?,
                capacity = ?,
                food = ?,
                water = ?,
                medical = ?,
                shelter = ?,
                facilities = ?,
                status = ?,
                managed_by = ?,
                contact_number = ?
            WHERE camp_id = ?
            "#,
        )
        .bind(&camp.name)
        .bind(&camp.address)
        .bind(camp.coordinate.latitude)
        .bind(camp.coordinate.longitude)
        .bind(camp.capacity)
        .bind(camp.resources.food)
        .bind(camp.resources.water)
        .bind(camp.resources.medical)
        .bind(camp.resources.shelter)
        .bind(serde_json::to_value(&camp.facilities)?)
        .bind(camp.status.to_string())
        .bind(&camp.managed_by)
        .bind(&camp.contact_number)
        .bind(camp.camp_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, camp_id: Uuid) -> Result<()> {
        let id = camp_id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM camp_connections WHERE camp_id = ? OR connected_camp_id = ?
            "#,
        )
        .bind(&id)
        .bind(&id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM camps WHERE camp_id = ?
            "#,
        )
        .bind(&id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn adjust_occupancy(&self, camp_id: Uuid, delta: i64) -> Result<ReserveOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE camps
            SET current_occupancy = CAST(CAST(current_occupancy AS SIGNED) + ? AS UNSIGNED)
            WHERE camp_id = ?
              AND CAST(current_occupancy AS SIGNED) + ? >= 0
              AND CAST(current_occupancy AS SIGNED) + ? <= capacity
            "#,
        )
        .bind(delta)
        .bind(camp_id.to_string())
        .bind(delta)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(ReserveOutcome::Conflict);
        }

        let camp = self.fetch(camp_id).await?.ok_or_else(|| {
            Error::Internal(format!("camp {camp_id} vanished after occupancy update"))
        })?;
        Ok(ReserveOutcome::Reserved(camp))
    }

    async fn set_status(&self, camp_id: Uuid, status: CampStatus) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE camps SET status = ? WHERE camp_id = ?
            "#,
        )
        .bind(status.to_string())
        .bind(camp_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn connect(&self, camp_id: Uuid, other: Uuid) -> Result<()> {
        let a = camp_id.to_string();
        let b = other.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT IGNORE INTO camp_connections (camp_id, connected_camp_id) VALUES (?, ?)
            "#,
        )
        .bind(&a)
        .bind(&b)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT IGNORE INTO camp_connections (camp_id, connected_camp_id) VALUES (?, ?)
            "#,
        )
        .bind(&b)
        .bind(&a)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("invalid id in storage: {e}")))
}

/// DB row mapping struct
#[derive(sqlx::FromRow)]
struct CampRow {
    camp_id: String,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    capacity: u32,
    current_occupancy: u32,
    food: u32,
    water: u32,
    medical: u32,
    shelter: u32,
    facilities: serde_json::Value,
    status: String,
    managed_by: String,
    contact_number: Option<String>,
    established_at: NaiveDateTime,
}

impl CampRow {
    fn into_camp(self, connected_camps: Vec<Uuid>) -> Result<Camp> {
        Ok(Camp {
            camp_id: parse_uuid(&self.camp_id)?,
            name: self.name,
            address: self.address,
            coordinate: Coordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            capacity: self.capacity,
            current_occupancy: self.current_occupancy,
            resources: CampResources {
                food: self.food,
                water: self.water,
                medical: self.medical,
                shelter: self.shelter,
            },
            facilities: serde_json::from_value(self.facilities).unwrap_or_default(),
            connected_camps,
            status: CampStatus::from(self.status.as_str()),
            managed_by: self.managed_by,
            contact_number: self.contact_number,
            established_at: DateTime::<Utc>::from_naive_utc_and_offset(self.established_at, Utc),
        })
    }
}
