//! In-memory [`RefugeeRepository`] backing the test suite

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::RefugeeRepository;
use super::types::Refugee;
use crate::error::Result;

#[derive(Default)]
pub struct InMemoryRefugeeRepository {
    refugees: RwLock<Vec<Refugee>>,
}

impl InMemoryRefugeeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefugeeRepository for InMemoryRefugeeRepository {
    async fn insert(&self, refugee: &Refugee) -> Result<()> {
        self.refugees.write().await.push(refugee.clone());
        Ok(())
    }

    async fn fetch(&self, refugee_id: Uuid) -> Result<Option<Refugee>> {
        Ok(self
            .refugees
            .read()
            .await
            .iter()
            .find(|r| r.refugee_id == refugee_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Refugee>> {
        Ok(self.refugees.read().await.clone())
    }

    async fn update(&self, refugee: &Refugee) -> Result<()> {
        let mut refugees = self.refugees.write().await;
        if let Some(existing) = refugees
            .iter_mut()
            .find(|r| r.refugee_id == refugee.refugee_id)
        {
            *existing = refugee.clone();
        }
        Ok(())
    }

    async fn remove(&self, refugee_id: Uuid) -> Result<()> {
        self.refugees
            .write()
            .await
            .retain(|r| r.refugee_id != refugee_id);
        Ok(())
    }

    async fn count_assigned_to(&self, camp_id: Uuid) -> Result<u64> {
        Ok(self
            .refugees
            .read()
            .await
            .iter()
            .filter(|r| r.assigned_camp == Some(camp_id))
            .count() as u64)
    }
}
