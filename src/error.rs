use thiserror::Error;

/// Error taxonomy for the whole daemon. Every variant maps to a stable wire
/// code and an HTTP status; the transport layer does the mapping, the domain
/// modules only pick the variant.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed, missing, or out-of-domain input. Also covers referenced
    /// entities that must exist for a write to be valid (e.g. a batch entry
    /// naming an unknown student).
    #[error("{0}")]
    Validation(String),

    /// The entity addressed by the request does not exist.
    #[error("{0}")]
    NotFound(String),

    /// No usable caller identity (missing or unknown bearer token).
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the caller's role does not permit the operation.
    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Db(_) => "db",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 422,
            ApiError::NotFound(_) => 404,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::Db(_) => 500,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
