//! JWT issuance and verification

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Lifetime of a session token in seconds
pub const SESSION_TTL_SECS: u64 = 60 * 60;

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identity of the caller
    pub email: String,
    /// Issued at (as UTC timestamp)
    pub iat: u64,
    /// Expiration time (as UTC timestamp)
    pub exp: u64,
}

/// Identity extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub expires_at: u64,
}

/// Issues and verifies session tokens with a single server-held secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        // Expiry is checked in `verify_at` against the caller's clock, without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Generate a token for `email`, expiring one hour from now
    pub fn issue(&self, email: &str) -> Result<String, AuthError> {
        self.issue_at(email, now()?)
    }

    pub fn issue_at(&self, email: &str, now: u64) -> Result<String, AuthError> {
        let claims = Claims {
            email: email.to_owned(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Encoding)
    }

    /// Validate and decode a token against the current time
    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        self.verify_at(token, now()?)
    }

    /// Validate and decode a token as seen at `now`.
    ///
    /// The signature is checked before the expiry, so a forged token is
    /// reported as `InvalidSignature` even when its claimed expiry has passed.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Session, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| classify(token, e))?;

        if now > token_data.claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(Session {
            email: token_data.claims.email,
            expires_at: token_data.claims.exp,
        })
    }
}

fn now() -> Result<u64, AuthError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Anything without a `.` cannot be a compact JWT and is `Malformed`.
/// A dotted string that fails verification is treated as a tampered token.
fn classify(token: &str, err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ if !token.contains('.') => AuthError::Malformed,
        _ => AuthError::InvalidSignature,
    }
}
