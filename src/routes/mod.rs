use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use royella_session::TokenService;
use royella_store::DocumentStore;
use tower_http::trace::TraceLayer;

use crate::middleware::auth_middleware;

pub mod bookings;
pub mod health;
pub mod reviews;
pub mod rooms;
pub mod session;

/// Shared handler state. The store handle is owned by the process and
/// injected here rather than reached through a global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }
}

pub async fn index() -> &'static str {
    "Royella server is running!"
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/bookings", get(bookings::list).post(bookings::create))
        .route(
            "/bookings/{id}",
            get(bookings::show)
                .patch(bookings::change_date)
                .delete(bookings::cancel),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(index))
        // Health check endpoints (no auth required)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/session", post(session::login))
        .route("/session/logout", post(session::logout))
        .route("/rooms", get(rooms::list))
        .route("/rooms/price-range", get(rooms::by_price_range))
        .route(
            "/rooms/{id}",
            get(rooms::show).patch(rooms::change_availability),
        )
        .route("/reviews", get(reviews::list).post(reviews::create))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Document ids are ULIDs; anything else is rejected before touching the store
pub(crate) fn parse_id(id: &str) -> Result<String, crate::error::AppError> {
    ulid::Ulid::from_string(id)
        .map(|ulid| ulid.to_string())
        .map_err(|_| crate::error::AppError::InvalidId(id.to_string()))
}
