//! Refugee persistence

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use super::types::{Gender, Refugee, RefugeeStatus};
use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Storage contract for refugees
#[async_trait]
pub trait RefugeeRepository: Send + Sync {
    async fn insert(&self, refugee: &Refugee) -> Result<()>;

    async fn fetch(&self, refugee_id: Uuid) -> Result<Option<Refugee>>;

    async fn list(&self) -> Result<Vec<Refugee>>;

    async fn update(&self, refugee: &Refugee) -> Result<()>;

    async fn remove(&self, refugee_id: Uuid) -> Result<()>;

    /// Number of refugee records currently assigned to `camp_id`
    async fn count_assigned_to(&self, camp_id: Uuid) -> Result<u64>;
}

/// MySQL-backed refugee repository
pub struct MySqlRefugeeRepository {
    pool: MySqlPool,
}

impl MySqlRefugeeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefugeeRepository for MySqlRefugeeRepository {
    async fn insert(&self, refugee: &Refugee) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refugees
                (refugee_id, name, age, gender, contact_number, address, latitude, longitude,
                 family_members, medical_conditions, assigned_camp, status, registered_at)
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(refugee.refugee_id.to_string())
        .bind(&refugee.name)
        .bind(refugee.age)
        .bind(refugee.gender.to_string())
        .bind(&refugee.contact_number)
        .bind(&refugee.address)
        .bind(refugee.coordinate.latitude)
        .bind(refugee.coordinate.longitude)
        .bind(refugee.family_members)
        .bind(&refugee.medical_conditions)
        .bind(refugee.assigned_camp.map(|id| id.to_string()))
        .bind(refugee.status.to_string())
        .bind(refugee.registered_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, refugee_id: Uuid) -> Result<Option<Refugee>> {
        let row = sqlx::query_as::<_, RefugeeRow>(
            r#"
            SELECT refugee_id, name, age, gender, contact_number, address, latitude, longitude,
                   family_members, medical_conditions, assigned_camp, status, registered_at
            FROM refugees
            WHERE refugee_id = ?
            "#,
        )
        .bind(refugee_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RefugeeRow::into_refugee).transpose()
    }

    async fn list(&self) -> Result<Vec<Refugee>> {
        let rows = sqlx::query_as::<_, RefugeeRow>(
            r#"
            SELECT refugee_id, name, age, gender, contact_number, address, latitude, longitude,
                   family_members, medical_conditions, assigned_camp, status, registered_at
            FROM refugees
            ORDER BY registered_at, refugee_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RefugeeRow::into_refugee).collect()
    }

    async fn update(&self, refugee: &Refugee) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE refugees SET
                name = ?,
                age = ?,
                gender = ?,
                contact_number = ?,
                address = ?,
                latitude = ?,
                longitude = ?,
                family_members = ?,
                medical_conditions = ?,
                assigned_camp = ?,
                status = ?
            WHERE refugee_id = ?
            "#,
        )
        .bind(&refugee.name)
        .bind(refugee.age)
        .bind(refugee.gender.to_string())
        .bind(&refugee.contact_number)
        .bind(&refugee.address)
        .bind(refugee.coordinate.latitude)
        .bind(refugee.coordinate.longitude)
        .bind(refugee.family_members)
        .bind(&refugee.medical_conditions)
        .bind(refugee.assigned_camp.map(|id| id.to_string()))
        .bind(refugee.status.to_string())
        .bind(refugee.refugee_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, refugee_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM refugees WHERE refugee_id = ?
            "#,
        )
        .bind(refugee_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_assigned_to(&self, camp_id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM refugees WHERE assigned_camp = ?
            "#,
        )
        .bind(camp_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}

/// DB row mapping struct
#[derive(sqlx::FromRow)]
struct RefugeeRow {
    refugee_id: String,
    name: String,
    age: u32,
    gender: String,
    contact_number: Option<String>,
    address: String,
    latitude: f64,
    longitude: f64,
    family_members: u32,
    medical_conditions: String,
    assigned_camp: Option<String>,
    status: String,
    registered_at: NaiveDateTime,
}

impl RefugeeRow {
    fn into_refugee(self) -> Result<Refugee> {
        let assigned_camp = self
            .assigned_camp
            .as_deref()
            .map(parse_uuid)
            .transpose()?;

        Ok(Refugee {
            refugee_id: parse_uuid(&self.refugee_id)?,
            name: self.name,
            age: self.age,
            gender: Gender::from(self.gender.as_str()),
            contact_number: self.contact_number,
            address: self.address,
            coordinate: Coordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            family_members: self.family_members,
            medical_conditions: self.medical_conditions,
            assigned_camp,
            status: RefugeeStatus::from(self.status.as_str()),
            registered_at: DateTime::<Utc>::from_naive_utc_and_offset(self.registered_at, Utc),
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("invalid id in storage: {e}")))
}
