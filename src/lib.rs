pub mod access_control;
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod routes;

pub use config::Config;
pub use routes::{AppState, router};
