use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use royella_session::AuthError;
use royella_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized access")]
    Unauthenticated,

    #[error("Forbidden access")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),

    #[error(transparent)]
    QueryRejection(#[from] QueryRejection),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Token error: {0}")]
    TokenError(#[from] AuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidId(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::JsonRejection(rejection) => {
                tracing::warn!(detail = %rejection.body_text(), "Rejected request body");
                (rejection.status(), json_rejection_message(rejection).to_string())
            }
            AppError::QueryRejection(rejection) => {
                tracing::warn!(detail = %rejection.body_text(), "Rejected query string");
                (rejection.status(), "Invalid query parameters".to_string())
            }
            AppError::StoreError(e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }
            AppError::TokenError(e) => {
                tracing::error!(reason = e.kind(), "Token error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred. Please try again later.".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Client-facing text for a body rejection; serde's detail stays in the logs
fn json_rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        JsonRejection::BytesRejection(_) => "Failed to read request body",
        _ => "Invalid request body",
    }
}
