use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use royella_store::{Collection, Document, Filter, InsertOneResult, Sort};

use super::AppState;
use crate::error::AppError;

/// GET /reviews - newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    let reviews = state
        .store
        .find(
            Collection::Reviews,
            &Filter::all(),
            Some(Sort::desc("timestamp")),
        )
        .await?;

    Ok(Json(reviews))
}

/// POST /reviews
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(review), _): WithRejection<Json<Document>, AppError>,
) -> Result<Json<InsertOneResult>, AppError> {
    let result = state.store.insert_one(Collection::Reviews, review).await?;

    tracing::info!(review_id = %result.inserted_id, "Review posted");

    Ok(Json(result))
}
