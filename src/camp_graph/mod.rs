//! CampGraph - camp-to-camp connectivity
//!
//! A simple undirected relation over camp ids used for resource-sharing
//! topology. Edges have no weights; meshes and cycles are valid. No
//! traversal here - the graph is maintained, not walked.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::camp_registry::repository::CampRepository;
use crate::camp_registry::types::Camp;
use crate::error::{Error, Result};

/// CampGraph Service
pub struct CampGraphService {
    camps: Arc<dyn CampRepository>,
}

impl CampGraphService {
    pub fn new(camps: Arc<dyn CampRepository>) -> Self {
        Self { camps }
    }

    /// Connect two camps for resource sharing
    ///
    /// Both edge directions are inserted as one logical operation, and
    /// re-connecting an already-connected pair is a no-op. Returns the
    /// refreshed pair.
    pub async fn connect(&self, camp_id: Uuid, target_id: Uuid) -> Result<(Camp, Camp)> {
        if camp_id == target_id {
            return Err(Error::SameCamp);
        }

        if self.camps.fetch(camp_id).await?.is_none() {
            return Err(Error::NotFound(format!("camp {camp_id}")));
        }
        if self.camps.fetch(target_id).await?.is_none() {
            return Err(Error::NotFound(format!("camp {target_id}")));
        }

        self.camps.connect(camp_id, target_id).await?;
        info!(camp_id = %camp_id, target_id = %target_id, "Camps connected");

        let camp = self
            .camps
            .fetch(camp_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("camp {camp_id} vanished after connect")))?;
        let target = self
            .camps
            .fetch(target_id)
            .await?
            .ok_or_else(|| Error::Internal(format!("camp {target_id} vanished after connect")))?;
        Ok((camp, target))
    }
}
