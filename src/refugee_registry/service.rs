//! RefugeeRegistry Service - refugee record CRUD
//!
//! Record removal is not here: deletion must return reserved camp capacity
//! first, so it lives in the assignment engine's discharge flow.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::repository::RefugeeRepository;
use super::types::{CreateRefugeeRequest, Refugee, UpdateRefugeeRequest};
use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// RefugeeRegistry Service
pub struct RefugeeRegistryService {
    repo: Arc<dyn RefugeeRepository>,
}

impl RefugeeRegistryService {
    pub fn new(repo: Arc<dyn RefugeeRepository>) -> Self {
        Self { repo }
    }

    /// Register a refugee without assigning a camp
    pub async fn create(&self, req: CreateRefugeeRequest, coordinate: Coordinate) -> Result<Refugee> {
        req.validate().map_err(Error::Validation)?;

        let refugee = req.into_refugee(coordinate);
        self.repo.insert(&refugee).await?;

        info!(
            refugee_id = %refugee.refugee_id,
            family_members = refugee.family_members,
            "Refugee registered"
        );
        Ok(refugee)
    }

    pub async fn get(&self, refugee_id: Uuid) -> Result<Refugee> {
        self.repo
            .fetch(refugee_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("refugee {refugee_id}")))
    }

    pub async fn list(&self) -> Result<Vec<Refugee>> {
        self.repo.list().await
    }

    pub async fn update(&self, refugee_id: Uuid, req: UpdateRefugeeRequest) -> Result<Refugee> {
        let mut refugee = self.get(refugee_id).await?;
        req.apply(&mut refugee)?;
        self.repo.update(&refugee).await?;

        info!(refugee_id = %refugee.refugee_id, "Refugee updated");
        Ok(refugee)
    }
}
