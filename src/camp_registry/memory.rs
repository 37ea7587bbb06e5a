//! In-memory [`CampRepository`] backing the test suite
//!
//! Insertion order is the natural return order. The conditional occupancy
//! update runs inside a single write-lock critical section, giving the same
//! indivisible check-and-write the MySQL implementation gets from its
//! conditional UPDATE.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{CampRepository, ReserveOutcome};
use super::types::{Camp, CampStatus};
use crate::error::Result;

#[derive(Default)]
pub struct InMemoryCampRepository {
    camps: RwLock<Vec<Camp>>,
}

impl InMemoryCampRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampRepository for InMemoryCampRepository {
    async fn insert(&self, camp: &Camp) -> Result<()> {
        self.camps.write().await.push(camp.clone());
        Ok(())
    }

    async fn fetch(&self, camp_id: Uuid) -> Result<Option<Camp>> {
        Ok(self
            .camps
            .read()
            .await
            .iter()
            .find(|c| c.camp_id == camp_id)
            .cloned())
    }

    async fn fetch_by_name(&self, name: &str) -> Result<Option<Camp>> {
        Ok(self
            .camps
            .read()
            .await
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Camp>> {
        Ok(self.camps.read().await.clone())
    }

    async fn find_eligible(&self, required_space: u32) -> Result<Vec<Camp>> {
        Ok(self
            .camps
            .read()
            .await
            .iter()
            .filter(|c| c.accepts_intake() && c.available_capacity() >= required_space)
            .cloned()
            .collect())
    }

    async fn update(&self, camp: &Camp) -> Result<()> {
        let mut camps = self.camps.write().await;
        if let Some(existing) = camps.iter_mut().find(|c| c.camp_id == camp.camp_id) {
            let current_occupancy = existing.current_occupancy;
            let connected_camps = existing.connected_camps.clone();
            *existing = camp.clone();
            existing.current_occupancy = current_occupancy;
            existing.connected_camps = connected_camps;
        }
        Ok(())
    }

    async fn remove(&self, camp_id: Uuid) -> Result<()> {
        let mut camps = self.camps.write().await;
        camps.retain(|c| c.camp_id != camp_id);
        for camp in camps.iter_mut() {
            camp.connected_camps.retain(|id| *id != camp_id);
        }
        Ok(())
    }

    async fn adjust_occupancy(&self, camp_id: Uuid, delta: i64) -> Result<ReserveOutcome> {
        let mut camps = self.camps.write().await;
        let Some(camp) = camps.iter_mut().find(|c| c.camp_id == camp_id) else {
            return Ok(ReserveOutcome::Conflict);
        };

        let next = i64::from(camp.current_occupancy) + delta;
        if next < 0 || next > i64::from(camp.capacity) {
            return Ok(ReserveOutcome::Conflict);
        }
        camp.current_occupancy = next as u32;
        Ok(ReserveOutcome::Reserved(camp.clone()))
    }

    async fn set_status(&self, camp_id: Uuid, status: CampStatus) -> Result<()> {
        let mut camps = self.camps.write().await;
        if let Some(camp) = camps.iter_mut().find(|c| c.camp_id == camp_id) {
            camp.status = status;
        }
        Ok(())
    }

    async fn connect(&self, camp_id: Uuid, other: Uuid) -> Result<()> {
        let mut camps = self.camps.write().await;
        for (own, peer) in [(camp_id, other), (other, camp_id)] {
            if let Some(camp) = camps.iter_mut().find(|c| c.camp_id == own) {
                if !camp.connected_camps.contains(&peer) {
                    camp.connected_camps.push(peer);
                }
            }
        }
        Ok(())
    }
}
