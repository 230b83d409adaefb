//! Session lifecycle: minting a token on login and dropping the cookie on logout

use axum::{Json, extract::State};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppState;
use crate::error::AppError;
use crate::middleware::{clear_session_cookie, session_cookie};

/// Login body. Credentials are checked upstream; this only carries the identity.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(alias = "identity")]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub success: bool,
}

impl Acknowledgement {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// POST /session - Issue a session token and set it as a cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<LoginInput>, AppError>,
) -> Result<(CookieJar, Json<Acknowledgement>), AppError> {
    input.validate()?;

    let token = state.tokens.issue(&input.email)?;

    tracing::info!(email = %input.email, "Session issued");

    Ok((jar.add(session_cookie(token)), Acknowledgement::ok()))
}

/// POST /session/logout - Clear the session cookie
///
/// Tokens are stateless: a copy kept by the client stays valid until it expires.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Acknowledgement>) {
    tracing::info!(
        had_session = jar.get(crate::middleware::SESSION_COOKIE).is_some(),
        "Session cleared"
    );

    (jar.add(clear_session_cookie()), Acknowledgement::ok())
}
