//! RefugeeRegistry type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// Default free-text medical conditions
pub const DEFAULT_MEDICAL_CONDITIONS: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
            Self::Other => write!(f, "Other"),
        }
    }
}

impl From<&str> for Gender {
    fn from(s: &str) -> Self {
        match s {
            "Male" => Self::Male,
            "Female" => Self::Female,
            _ => Self::Other,
        }
    }
}

/// Assignment state of a refugee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefugeeStatus {
    Pending,
    Assigned,
    Relocated,
}

impl std::fmt::Display for RefugeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Assigned => write!(f, "Assigned"),
            Self::Relocated => write!(f, "Relocated"),
        }
    }
}

impl From<&str> for RefugeeStatus {
    fn from(s: &str) -> Self {
        match s {
            "Assigned" => Self::Assigned,
            "Relocated" => Self::Relocated,
            _ => Self::Pending,
        }
    }
}

/// A displaced-person record representing one family unit
///
/// Invariant: `assigned_camp` is `Some` iff `status == Assigned` (or
/// `Relocated` after movement). Both fields are mutated only by the
/// assignment engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refugee {
    pub refugee_id: Uuid,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact_number: Option<String>,
    pub address: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Family size - the weight consumed from camp capacity
    pub family_members: u32,
    pub medical_conditions: String,
    pub assigned_camp: Option<Uuid>,
    pub status: RefugeeStatus,
    pub registered_at: DateTime<Utc>,
}

/// Refugee registration request (attributes only; the coordinate is resolved
/// by the caller, either directly or through geocoding)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRefugeeRequest {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    #[serde(default)]
    pub contact_number: Option<String>,
    pub address: String,
    #[serde(default = "default_family_members")]
    pub family_members: u32,
    #[serde(default = "default_medical_conditions")]
    pub medical_conditions: String,
}

fn default_family_members() -> u32 {
    1
}

fn default_medical_conditions() -> String {
    DEFAULT_MEDICAL_CONDITIONS.to_string()
}

impl CreateRefugeeRequest {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("refugee name must not be empty".to_string());
        }
        if self.family_members < 1 {
            return Err("family_members must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn into_refugee(self, coordinate: Coordinate) -> Refugee {
        Refugee {
            refugee_id: Uuid::new_v4(),
            name: self.name,
            age: self.age,
            gender: self.gender,
            contact_number: self.contact_number,
            address: self.address,
            coordinate,
            family_members: self.family_members,
            medical_conditions: self.medical_conditions,
            assigned_camp: None,
            status: RefugeeStatus::Pending,
            registered_at: Utc::now(),
        }
    }
}

/// Field-wise refugee update
///
/// Assignment fields (`assigned_camp`, `status`) are not writable here, and
/// family size is frozen while a camp reservation depends on it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRefugeeRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub family_members: Option<u32>,
    pub medical_conditions: Option<String>,
}

impl UpdateRefugeeRequest {
    pub fn apply(&self, refugee: &mut Refugee) -> crate::Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(crate::Error::Validation(
                    "refugee name must not be empty".to_string(),
                ));
            }
            refugee.name = name.clone();
        }
        if let Some(age) = self.age {
            refugee.age = age;
        }
        if let Some(gender) = self.gender {
            refugee.gender = gender;
        }
        if let Some(contact_number) = &self.contact_number {
            refugee.contact_number = Some(contact_number.clone());
        }
        if let Some(address) = &self.address {
            refugee.address = address.clone();
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => refugee.coordinate = Coordinate::new(lat, lon)?,
            (None, None) => {}
            _ => {
                return Err(crate::Error::Validation(
                    "latitude and longitude must be updated together".to_string(),
                ));
            }
        }
        if let Some(family_members) = self.family_members {
            if family_members < 1 {
                return Err(crate::Error::Validation(
                    "family_members must be at least 1".to_string(),
                ));
            }
            if refugee.assigned_camp.is_some() && family_members != refugee.family_members {
                return Err(crate::Error::Validation(
                    "cannot change family size while assigned to a camp".to_string(),
                ));
            }
            refugee.family_members = family_members;
        }
        if let Some(medical_conditions) = &self.medical_conditions {
            refugee.medical_conditions = medical_conditions.clone();
        }
        Ok(())
    }
}
