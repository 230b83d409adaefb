pub mod auth;

pub use auth::{SESSION_COOKIE, auth_middleware, clear_session_cookie, session_cookie};
