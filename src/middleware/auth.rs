use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use royella_session::SESSION_TTL_SECS;

use crate::error::AppError;
use crate::routes::AppState;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Authentication middleware that validates the session token from the cookie
///
/// Rejects with 401 when the cookie is missing or the token does not verify.
/// On success the verified `Session` is inserted into the request extensions
/// before any handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value()) else {
        tracing::warn!(path = %req.uri().path(), "Missing session cookie");
        return Err(AppError::Unauthenticated);
    };

    let session = state.tokens.verify(token).map_err(|e| {
        tracing::warn!(
            path = %req.uri().path(),
            reason = e.kind(),
            "Rejected session token"
        );
        AppError::Unauthenticated
    })?;

    tracing::debug!(email = %session.email, "Session verified");

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// HTTP-only, secure, cross-site session cookie living as long as the token
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// Removal cookie for the session. Attributes match `session_cookie` so
/// browsers accept it in cross-site requests.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::ZERO)
        .build()
}
