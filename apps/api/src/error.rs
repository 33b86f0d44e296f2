//! # Service Error Types
//!
//! The error taxonomy callers of the services see.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Conversion Flow                                │
//! │                                                                         │
//! │  ValidationError ─┐                                                    │
//! │  CoreError ───────┤                                                    │
//! │  DbError ─────────┼──► ServiceError ──► ErrorKind ──► HTTP status      │
//! │  CredentialError ─┤         │                                          │
//! │  TokenError ──────┤         └──► Display = safe message                │
//! │  Elapsed ─────────┘                                                    │
//! │                                                                         │
//! │  Storage and hashing details are logged where they are converted and   │
//! │  never reach the message.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kinds
//! | Kind                  | Status | Typical cause                          |
//! |-----------------------|--------|----------------------------------------|
//! | `validation_error`    | 400    | Bad email, short password, stock < 0   |
//! | `not_found`           | 404    | Update/delete matched zero rows        |
//! | `conflict`            | 409    | Duplicate email, unknown supplier      |
//! | `unauthorized`        | 401    | Bad login, expired or forged token     |
//! | `storage_unavailable` | 503    | Pool exhausted, deadline elapsed       |
//! | `internal_failure`    | 500    | Hashing failure, corrupt stored data   |

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;

use crate::auth::TokenError;
use crate::credentials::CredentialError;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable, machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    StorageUnavailable,
    Internal,
}

impl ErrorKind {
    /// Wire code used in the `kind` field of error responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::Internal => "internal_failure",
        }
    }

    /// HTTP status for this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// =============================================================================
// Service Error
// =============================================================================

/// Errors returned by [`AuthService`](crate::services::AuthService) and
/// [`InventoryService`](crate::services::InventoryService).
///
/// `Display` is the safe, user-facing message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input; the caller can fix it and retry.
    #[error("{0}")]
    Validation(String),

    /// A stock quantity would be negative.
    #[error("{field} must not be negative (got {value})")]
    InvalidQuantity { field: String, value: i64 },

    /// The target row does not exist (or was deleted).
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    /// Registration with an email that is already taken.
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// A product referenced a supplier that does not exist.
    #[error("Supplier {supplier_id} does not exist")]
    InvalidSupplier { supplier_id: i64 },

    /// The supplier still has products.
    #[error("Supplier {id} still has products and cannot be deleted")]
    SupplierInUse { id: i64 },

    /// Any other constraint violation.
    #[error("{0}")]
    Conflict(String),

    /// Login failed. Same message whether the account exists or not.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, expired, or forged session token.
    #[error("{0}")]
    Unauthorized(String),

    /// Storage could not serve the request in time; safe to retry later.
    #[error("Storage is temporarily unavailable, please retry")]
    StorageUnavailable,

    /// Unexpected failure, already logged.
    #[error("An internal error occurred")]
    Internal,
}

impl ServiceError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidQuantity { .. } => {
                ErrorKind::Validation
            }
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::DuplicateEmail
            | ServiceError::InvalidSupplier { .. }
            | ServiceError::SupplierInUse { .. }
            | ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::InvalidCredentials | ServiceError::Unauthorized(_) => {
                ErrorKind::Unauthorized
            }
            ServiceError::StorageUnavailable => ErrorKind::StorageUnavailable,
            ServiceError::Internal => ErrorKind::Internal,
        }
    }

    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Translate storage errors. Only the variant crosses over; the payload of
/// storage-level failures goes to the log.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::UniqueViolation { field, .. } => {
                ServiceError::Conflict(format!("{} already exists", field))
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(%message, "Foreign key violation reached the service layer");
                ServiceError::Conflict("A referenced record does not exist".to_string())
            }
            DbError::ConstraintViolation { message } => {
                warn!(%message, "Constraint violation");
                ServiceError::Conflict("The record violates a data constraint".to_string())
            }
            DbError::InvalidSupplier { supplier_id } => {
                ServiceError::InvalidSupplier { supplier_id }
            }
            DbError::InvalidQuantity { field, value } => {
                ServiceError::InvalidQuantity { field, value }
            }
            DbError::SupplierInUse { id } => ServiceError::SupplierInUse { id },
            other if other.is_unavailable() => {
                warn!(error = %other, "Storage unavailable");
                ServiceError::StorageUnavailable
            }
            other => {
                error!(error = %other, "Storage failure");
                ServiceError::Internal
            }
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        error!(error = %err, "Credential store failure");
        ServiceError::Internal
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ServiceError::Unauthorized("Session has expired".to_string()),
            TokenError::BadSignature | TokenError::Malformed => {
                ServiceError::Unauthorized("Invalid session token".to_string())
            }
            TokenError::Signing(msg) => {
                error!(error = %msg, "Token signing failed");
                ServiceError::Internal
            }
        }
    }
}

impl From<tokio::time::error::Elapsed> for ServiceError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        warn!("Operation deadline elapsed");
        ServiceError::StorageUnavailable
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

// =============================================================================
// HTTP Response
// =============================================================================

/// Renders `{"error": {"kind": "...", "message": "..."}}` with the kind's status.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = Json(json!({
            "error": {
                "kind": kind.as_str(),
                "message": self.to_string(),
            }
        }));

        (kind.status_code(), body).into_response()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
