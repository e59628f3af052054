use thiserror::Error;
use tonic::{Code, Status};
use tracing::error;
use vidspace_core::core_access::{AccessError, ErrorKind};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Auth configuration error: {0}")]
    AuthConfig(String),
}

impl ApiError {
    pub fn missing(field: &'static str) -> Self {
        ApiError::InvalidField { field, reason: "must not be empty".to_string() }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ApiError::InvalidField { field, reason: reason.into() }
    }
}

fn code_for(kind: ErrorKind) -> Code {
    match kind {
        ErrorKind::InvalidArgument => Code::InvalidArgument,
        ErrorKind::Unauthenticated => Code::Unauthenticated,
        ErrorKind::PermissionDenied => Code::PermissionDenied,
        ErrorKind::NotFound => Code::NotFound,
        ErrorKind::Internal => Code::Internal,
    }
}

impl From<ApiError> for Status {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Access(e) => {
                if e.kind() == ErrorKind::Internal {
                    error!(error = %e, "request failed");
                }
                Status::new(code_for(e.kind()), e.public_message())
            }
            ApiError::InvalidField { .. } => Status::new(Code::InvalidArgument, err.to_string()),
            ApiError::Join(e) => {
                error!(error = %e, "blocking task failed");
                Status::new(Code::Internal, "internal error")
            }
            ApiError::AuthConfig(msg) => {
                error!(%msg, "auth misconfigured");
                Status::new(Code::Internal, "internal error")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
