//! RefugeeRegistry - displaced-person records
//!
//! ## Responsibilities
//!
//! - Refugee records: registration, lookup, update
//! - Storage contract and MySQL implementation (`repository`)
//!
//! Assignment fields (`assigned_camp`, `status`) are owned by the assignment
//! engine; deletion goes through its discharge flow.

pub mod repository;
pub mod service;
pub mod types;

#[cfg(test)]
pub mod memory;

pub use repository::{MySqlRefugeeRepository, RefugeeRepository};
pub use service::RefugeeRegistryService;
pub use types::{CreateRefugeeRequest, Gender, Refugee, RefugeeStatus, UpdateRefugeeRequest};
