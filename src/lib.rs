//! RMS Backend Library
//!
//! Refugee Management System - tracks displaced persons and relief camps and
//! assigns each family to the nearest camp with room.
//!
//! ## Components
//!
//! 1. GeoMath - haversine distance over validated coordinates
//! 2. NearestSiteSearch - distance ranking of candidate camps
//! 3. CampRegistry - camp records, occupancy-derived status, persistence
//! 4. RefugeeRegistry - displaced-person records, persistence
//! 5. AssignmentEngine - eligibility, selection, atomic capacity reservation
//! 6. CampGraph - symmetric camp-to-camp connectivity
//! 7. GeocoderClient - Nominatim address resolution
//! 8. WebAPI - REST API endpoints
//!
//! ## Design Principles
//!
//! - Occupancy has one writer: the assignment engine, through a conditional
//!   repository update that cannot overshoot capacity
//! - Camp status is derived, never cached independently of occupancy
//! - Storage sits behind repository traits; services depend on the contract

pub mod assignment_engine;
pub mod camp_graph;
pub mod camp_registry;
pub mod error;
pub mod geo;
pub mod geocoder;
pub mod models;
pub mod refugee_registry;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
