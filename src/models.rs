//! Shared models and types
//!
//! Types shared across multiple modules to avoid circular dependencies.

use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub db_connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_error_field() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_omits_data_field() {
        let json = serde_json::to_value(ApiResponse::<()>::error("boom")).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }
}
