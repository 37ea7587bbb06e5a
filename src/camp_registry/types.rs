//! CampRegistry type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// Default managing authority for new camps
pub const DEFAULT_MANAGED_BY: &str = "Disaster Management Authority";

/// Camp operating status
///
/// `Active`/`Full` are capacity-derived (see [`super::occupancy`]);
/// `Inactive`/`Emergency` are set by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampStatus {
    Active,
    Full,
    Inactive,
    Emergency,
}

impl std::fmt::Display for CampStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Full => write!(f, "Full"),
            Self::Inactive => write!(f, "Inactive"),
            Self::Emergency => write!(f, "Emergency"),
        }
    }
}

impl From<&str> for CampStatus {
    fn from(s: &str) -> Self {
        match s {
            "Full" => Self::Full,
            "Inactive" => Self::Inactive,
            "Emergency" => Self::Emergency,
            _ => Self::Active,
        }
    }
}

/// Relief stock counters tracked per camp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampResources {
    #[serde(default)]
    pub food: u32,
    #[serde(default)]
    pub water: u32,
    #[serde(default)]
    pub medical: u32,
    #[serde(default)]
    pub shelter: u32,
}

/// A managed relief site with finite capacity
///
/// Invariant: `0 <= current_occupancy <= capacity`. Occupancy is only ever
/// written through the repository's conditional update, driven by the
/// assignment engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camp {
    pub camp_id: Uuid,
    pub name: String,
    pub address: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub capacity: u32,
    pub current_occupancy: u32,
    pub resources: CampResources,
    pub facilities: Vec<String>,
    pub connected_camps: Vec<Uuid>,
    pub status: CampStatus,
    pub managed_by: String,
    pub contact_number: Option<String>,
    pub established_at: DateTime<Utc>,
}

impl Camp {
    /// Free space left in the camp
    pub fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_occupancy)
    }

    /// Whether the camp's status permits intake
    pub fn accepts_intake(&self) -> bool {
        matches!(self.status, CampStatus::Active | CampStatus::Emergency)
    }
}

/// Camp registration request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampRequest {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: u32,
    #[serde(default)]
    pub resources: CampResources,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default = "default_managed_by")]
    pub managed_by: String,
    #[serde(default)]
    pub contact_number: Option<String>,
}

fn default_managed_by() -> String {
    DEFAULT_MANAGED_BY.to_string()
}

impl CreateCampRequest {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("camp name must not be empty".to_string());
        }
        if self.capacity < 1 {
            return Err("capacity must be at least 1".to_string());
        }
        Ok(())
    }

    /// Build the camp record; coordinate validation happens here
    pub fn into_camp(self) -> crate::Result<Camp> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)?;
        Ok(Camp {
            camp_id: Uuid::new_v4(),
            name: self.name,
            address: self.address,
            coordinate,
            capacity: self.capacity,
            current_occupancy: 0,
            resources: self.resources,
            facilities: self.facilities,
            connected_camps: Vec::new(),
            status: CampStatus::Active,
            managed_by: self.managed_by,
            contact_number: self.contact_number,
            established_at: Utc::now(),
        })
    }
}

/// Field-wise camp update
///
/// Occupancy and connections are not writable here; they belong to the
/// assignment engine and the camp graph respectively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: Option<u32>,
    pub resources: Option<CampResources>,
    pub facilities: Option<Vec<String>>,
    pub status: Option<CampStatus>,
    pub managed_by: Option<String>,
    pub contact_number: Option<String>,
}

impl UpdateCampRequest {
    /// Merge the requested changes into `camp`
    pub fn apply(&self, camp: &mut Camp) -> crate::Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(crate::Error::Validation(
                    "camp name must not be empty".to_string(),
                ));
            }
            camp.name = name.clone();
        }
        if let Some(address) = &self.address {
            camp.address = address.clone();
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => camp.coordinate = Coordinate::new(lat, lon)?,
            (None, None) => {}
            _ => {
                return Err(crate::Error::Validation(
                    "latitude and longitude must be updated together".to_string(),
                ));
            }
        }
        if let Some(capacity) = self.capacity {
            if capacity < 1 {
                return Err(crate::Error::Validation(
                    "capacity must be at least 1".to_string(),
                ));
            }
            if capacity < camp.current_occupancy {
                return Err(crate::Error::Validation(format!(
                    "capacity {} below current occupancy {}",
                    capacity, camp.current_occupancy
                )));
            }
            camp.capacity = capacity;
        }
        if let Some(resources) = self.resources {
            camp.resources = resources;
        }
        if let Some(facilities) = &self.facilities {
            camp.facilities = facilities.clone();
        }
        if let Some(status) = self.status {
            camp.status = status;
        }
        if let Some(managed_by) = &self.managed_by {
            camp.managed_by = managed_by.clone();
        }
        if let Some(contact_number) = &self.contact_number {
            camp.contact_number = Some(contact_number.clone());
        }
        Ok(())
    }
}
