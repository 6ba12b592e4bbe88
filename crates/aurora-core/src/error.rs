//! Error types for the Aurora tenancy core.

use thiserror::Error;

/// Error taxonomy shared by every core operation.
///
/// All variants are terminal for the calling request — nothing is
/// retried internally. Denials deliberately carry no detail about
/// which grant or membership field caused them; only the kind crosses
/// the boundary.
#[derive(Debug, Error)]
pub enum AuroraError {
    /// No authenticated identity on the request.
    #[error("unauthorized")]
    Unauthorized,

    /// Identity present but the grant layers all denied.
    #[error("forbidden")]
    Forbidden,

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// Invite token was already redeemed.
    #[error("invite already used")]
    InviteAlreadyUsed,

    /// Invite token is past its expiry timestamp.
    #[error("invite expired")]
    InviteExpired,

    #[error("rate limit exceeded")]
    RateLimited,

    /// Every resolution strategy was exhausted. Usually missing seed
    /// data, so this is an operational defect rather than a normal
    /// user-facing error.
    #[error("no active workspace could be resolved")]
    NoActiveWorkspace,

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl AuroraError {
    /// HTTP status code the boundary should translate this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            AuroraError::Unauthorized => 401,
            AuroraError::Forbidden => 403,
            AuroraError::NotFound { .. } => 404,
            AuroraError::AlreadyExists { .. } => 409,
            AuroraError::InviteAlreadyUsed | AuroraError::InviteExpired => 400,
            AuroraError::RateLimited => 429,
            AuroraError::Validation { .. } => 400,
            AuroraError::NoActiveWorkspace
            | AuroraError::Database(_)
            | AuroraError::Crypto(_) => 500,
        }
    }
}

pub type AuroraResult<T> = Result<T, AuroraError>;
