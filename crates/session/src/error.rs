use std::time::SystemTimeError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("system clock is before the unix epoch")]
    Clock(#[from] SystemTimeError),
}

impl AuthError {
    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::Malformed => "malformed",
            AuthError::MissingSecret => "missing_secret",
            AuthError::Encoding(_) => "encoding",
            AuthError::Clock(_) => "clock",
        }
    }
}
