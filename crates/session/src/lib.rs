//! Session tokens
//!
//! Signed HS256 tokens carrying the caller's email, valid for one hour.
//! Nothing is stored server-side: a token stays valid until it expires.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, SESSION_TTL_SECS, Session, TokenService};
