//! Owner checks for identity-scoped booking data

use royella_session::Session;

use crate::error::AppError;

/// Field holding the owning identity of a booking
pub const OWNER_FIELD: &str = "email";

/// Reject unless `owner` is exactly the authenticated identity.
///
/// Runs before the store is queried with the owner, so a caller reusing
/// their own token cannot read someone else's records.
pub fn ensure_owner(session: &Session, owner: Option<&str>) -> Result<(), AppError> {
    if owner == Some(session.email.as_str()) {
        return Ok(());
    }

    tracing::warn!(
        email = %session.email,
        requested = owner.unwrap_or_default(),
        "Owner mismatch"
    );

    Err(AppError::Forbidden)
}
