use sea_orm::DbErr;
use serde_json::{json, Value};
use thiserror::Error;

/// A failed dispatch operation. Each variant maps onto the envelope's
/// `error_details` code and type.
#[derive(Debug, Error)]
pub enum DxlError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<Value>,
    },
    #[error("Authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{message}")]
    NotFound {
        message: String,
        details: Option<Value>,
    },
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Database(#[from] DbErr),
}

impl DxlError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        DxlError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request_with(message: impl Into<String>, details: Value) -> Self {
        DxlError::BadRequest {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DxlError::NotFound {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found_with(message: impl Into<String>, details: Value) -> Self {
        DxlError::NotFound {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        DxlError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    /// 422 listing the fields the operation needs.
    pub fn missing_fields(required: &[&str]) -> Self {
        Self::validation("Missing required fields", json!({ "required": required }))
    }

    pub fn invalid_operation() -> Self {
        Self::bad_request("Invalid operation")
    }

    pub fn code(&self) -> u16 {
        match self {
            DxlError::BadRequest { .. } => 400,
            DxlError::Unauthorized => 401,
            DxlError::Forbidden(_) => 403,
            DxlError::NotFound { .. } => 404,
            DxlError::Validation { .. } => 422,
            DxlError::Internal(_) | DxlError::Database(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DxlError::BadRequest { .. } => "BadRequest",
            DxlError::Unauthorized => "Unauthorized",
            DxlError::Forbidden(_) => "Forbidden",
            DxlError::NotFound { .. } => "NotFound",
            DxlError::Validation { .. } => "ValidationError",
            DxlError::Internal(_) | DxlError::Database(_) => "InternalError",
        }
    }

    pub fn into_details(self) -> Option<Value> {
        match self {
            DxlError::BadRequest { details, .. }
            | DxlError::NotFound { details, .. }
            | DxlError::Validation { details, .. } => details,
            _ => None,
        }
    }
}
