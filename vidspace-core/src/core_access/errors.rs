//! Error taxonomy for access decisions

use super::storage::StoreError;
use thiserror::Error;

/// Result type for access operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Categorised failure of an access check or access-gated operation.
///
/// Every check returns the first unmet condition; failures are never aggregated.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Required context is missing or the request is structurally invalid
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller's identity could not be verified
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Identity verified, but role, ownership or level requirements are unmet
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The referenced resource does not exist in the caller's scope
    #[error("Not found: {0}")]
    NotFound(String),

    /// Collaborator failure unrelated to the caller's authorization
    #[error("Internal error: {0}")]
    Internal(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse classification used at the external boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Snake-case label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl AccessError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AccessError::InvalidArgument(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AccessError::Unauthenticated(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        AccessError::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AccessError::NotFound(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AccessError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AccessError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            AccessError::NotFound(_) => ErrorKind::NotFound,
            AccessError::Internal(_) | AccessError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to return to the caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AccessError::InvalidArgument(msg)
            | AccessError::Unauthenticated(msg)
            | AccessError::PermissionDenied(msg)
            | AccessError::NotFound(msg) => msg.clone(),
            AccessError::Internal(_) | AccessError::Storage(_) => "internal error".to_string(),
        }
    }
}
