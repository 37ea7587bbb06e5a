//! Error handling for the RMS backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (duplicate camp name, occupied camp deletion)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Refugee already has a camp
    #[error("Refugee {0} is already assigned to a camp")]
    AlreadyAssigned(uuid::Uuid),

    /// Refugee has no camp to release
    #[error("Refugee {0} is not assigned to any camp")]
    RefugeeNotAssigned(uuid::Uuid),

    /// No camp accepts intake at all
    #[error("No available camps found")]
    NoCampsAvailable,

    /// Open camps exist but none can take the family
    #[error("No camps with sufficient capacity found")]
    NoCapacitySufficient,

    /// Camp connected to itself
    #[error("Cannot connect a camp to itself")]
    SameCamp,

    /// Address unresolvable
    #[error("Geocoding failed: {0}")]
    Geocode(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLx database error
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            Error::AlreadyAssigned(_) => (
                StatusCode::BAD_REQUEST,
                "ALREADY_ASSIGNED",
                self.to_string(),
            ),
            Error::RefugeeNotAssigned(_) => (
                StatusCode::BAD_REQUEST,
                "REFUGEE_NOT_ASSIGNED",
                self.to_string(),
            ),
            Error::NoCampsAvailable => (
                StatusCode::NOT_FOUND,
                "NO_CAMPS_AVAILABLE",
                self.to_string(),
            ),
            Error::NoCapacitySufficient => (
                StatusCode::NOT_FOUND,
                "NO_CAPACITY_SUFFICIENT",
                self.to_string(),
            ),
            Error::SameCamp => (StatusCode::BAD_REQUEST, "SAME_CAMP", self.to_string()),
            Error::Geocode(msg) => (StatusCode::BAD_REQUEST, "GEOCODE_FAILURE", msg.clone()),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Sqlx(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
