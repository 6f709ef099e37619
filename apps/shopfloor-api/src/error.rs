//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopfloor POS                          │
//! │                                                                         │
//! │  Handler: Result<T, ApiError>                                          │
//! │         │                                                               │
//! │         ├── ValidationError ─────────────────► 400 VALIDATION_ERROR    │
//! │         ├── CoreError::*NotFound ────────────► 404 NOT_FOUND           │
//! │         ├── CoreError::InsufficientStock ────► 400 INSUFFICIENT_STOCK  │
//! │         │                                      (+ available)            │
//! │         ├── DbError::Busy ───────────────────► 409 CONFLICT            │
//! │         └── DbError::{Query,Transaction,..} ─► 500 DATABASE_ERROR      │
//! │                                                (detail only in logs)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "error": "Insufficient stock for Sugar 1kg: available 3, requested 5",
//!   "code": "INSUFFICIENT_STOCK",
//!   "available": 3 }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use shopfloor_core::{CoreError, ValidationError};
use shopfloor_db::DbError;

/// API error returned from handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Machine-readable error code; also picks the HTTP status.
    pub code: ErrorCode,

    /// Human-readable error message for display.
    pub message: String,

    /// Live quantity, set only for stock shortfalls.
    pub available: Option<i64>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Caller identity missing (401)
    Unauthorized,

    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Not enough stock for a line (400)
    InsufficientStock,

    /// Write lock contention; resubmit (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationError | ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<i64>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            available: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a not found error with a fixed message.
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
            available: self.available,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Converts input validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StoreNotFound(_)
            | CoreError::CustomerNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::WarehouseProductNotFound(_) => ApiError::not_found(err.to_string()),
            CoreError::InsufficientStock { available, .. } => ApiError {
                code: ErrorCode::InsufficientStock,
                message: err.to_string(),
                available: Some(available),
            },
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(e) => e.into(),
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Busy(e) => {
                tracing::warn!("Database busy: {}", e);
                ApiError::new(
                    ErrorCode::Conflict,
                    "Another sale is in progress, please try again",
                )
            }
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConstraintViolation(e)
            | DbError::ConnectionFailed(e)
            | DbError::MigrationFailed(e)
            | DbError::QueryFailed(e)
            | DbError::TransactionFailed(e)
            | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}
