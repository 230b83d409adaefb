//! Public room catalogue

use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use royella_store::{Collection, Document, Filter, UpdateResult};
use serde::Deserialize;
use serde_json::Value;

use super::{AppState, parse_id};
use crate::error::AppError;

const PRICE_FIELD: &str = "price_per_night";

/// GET /rooms
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Document>>, AppError> {
    let rooms = state
        .store
        .find(Collection::Rooms, &Filter::all(), None)
        .await?;

    Ok(Json(rooms))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

/// GET /rooms/price-range?minPrice=&maxPrice= - inclusive bounds, each optional
pub async fn by_price_range(
    State(state): State<AppState>,
    WithRejection(Query(range), _): WithRejection<Query<PriceRange>, AppError>,
) -> Result<Json<Vec<Document>>, AppError> {
    let filter = Filter::all().range(PRICE_FIELD, range.min_price, range.max_price);
    let rooms = state.store.find(Collection::Rooms, &filter, None).await?;

    Ok(Json(rooms))
}

/// GET /rooms/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let room = state
        .store
        .find_one(Collection::Rooms, &Filter::by_id(parse_id(&id)?))
        .await?
        .ok_or(AppError::NotFound("Room"))?;

    Ok(Json(room))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityChange {
    pub availability: Value,
}

/// PATCH /rooms/{id} - only `availability` is written
pub async fn change_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(change), _): WithRejection<Json<AvailabilityChange>, AppError>,
) -> Result<Json<UpdateResult>, AppError> {
    let filter = Filter::by_id(parse_id(&id)?);

    let mut set = Document::new();
    set.insert("availability".to_string(), change.availability);

    let result = state
        .store
        .update_one(Collection::Rooms, &filter, set)
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Room"));
    }

    tracing::info!(room_id = %id, "Room availability changed");

    Ok(Json(result))
}
