//! CampRegistry - relief site management
//!
//! ## Responsibilities
//!
//! - Camp records: registration, lookup, update, deletion policy
//! - Occupancy-derived status (`occupancy`)
//! - Storage contract and MySQL implementation (`repository`)
//!
//! Occupancy itself is mutated only by the assignment engine, through the
//! repository's conditional update.

pub mod occupancy;
pub mod repository;
pub mod service;
pub mod types;

#[cfg(test)]
pub mod memory;

pub use repository::{CampRepository, MySqlCampRepository, ReserveOutcome};
pub use service::CampRegistryService;
pub use types::{Camp, CampResources, CampStatus, CreateCampRequest, UpdateCampRequest};
