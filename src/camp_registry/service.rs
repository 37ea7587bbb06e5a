//! CampRegistry Service - camp CRUD and policies

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::occupancy::derive_status;
use super::repository::CampRepository;
use super::types::{Camp, CreateCampRequest, UpdateCampRequest};
use crate::error::{Error, Result};
use crate::refugee_registry::repository::RefugeeRepository;

/// CampRegistry Service
pub struct CampRegistryService {
    repo: Arc<dyn CampRepository>,
    refugees: Arc<dyn RefugeeRepository>,
}

impl CampRegistryService {
    pub fn new(repo: Arc<dyn CampRepository>, refugees: Arc<dyn RefugeeRepository>) -> Self {
        Self { repo, refugees }
    }

    /// Register a new camp
    pub async fn create(&self, req: CreateCampRequest) -> Result<Camp> {
        req.validate().map_err(Error::Validation)?;

        if self.repo.fetch_by_name(&req.name).await?.is_some() {
            return Err(Error::Conflict(format!(
                "Camp with name '{}' already exists",
                req.name
            )));
        }

        let camp = req.into_camp()?;
        self.repo.insert(&camp).await?;

        info!(camp_id = %camp.camp_id, name = %camp.name, capacity = camp.capacity, "Camp registered");
        Ok(camp)
    }

    pub async fn get(&self, camp_id: Uuid) -> Result<Camp> {
        self.repo
            .fetch(camp_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("camp {camp_id}")))
    }

    pub async fn list(&self) -> Result<Vec<Camp>> {
        self.repo.list().await
    }

    /// Camps open for intake with any free space
    pub async fn list_available(&self) -> Result<Vec<Camp>> {
        self.repo.find_eligible(1).await
    }

    /// Field-wise update; the capacity-derived status rule is re-applied
    /// after the merge so an operator override cannot mask a full camp
    pub async fn update(&self, camp_id: Uuid, req: UpdateCampRequest) -> Result<Camp> {
        let mut camp = self.get(camp_id).await?;

        if let Some(name) = &req.name {
            if *name != camp.name && self.repo.fetch_by_name(name).await?.is_some() {
                return Err(Error::Conflict(format!(
                    "Camp with name '{}' already exists",
                    name
                )));
            }
        }

        req.apply(&mut camp)?;
        camp.status = derive_status(camp.status, camp.current_occupancy, camp.capacity);
        self.repo.update(&camp).await?;

        info!(camp_id = %camp.camp_id, status = %camp.status, "Camp updated");
        Ok(camp)
    }

    /// Delete a camp
    ///
    /// Rejected while refugees are still assigned to it; unassign or relocate
    /// them first.
    pub async fn delete(&self, camp_id: Uuid) -> Result<()> {
        let camp = self.get(camp_id).await?;

        let assigned = self.refugees.count_assigned_to(camp_id).await?;
        if assigned > 0 {
            return Err(Error::Conflict(format!(
                "Camp '{}' still has {} assigned refugee(s)",
                camp.name, assigned
            )));
        }

        self.repo.remove(camp_id).await?;
        info!(camp_id = %camp_id, name = %camp.name, "Camp deleted");
        Ok(())
    }
}
