//! Bookings, readable and writable only by their owner
//!
//! Every route here sits behind `auth_middleware`, so a `Session` is always
//! present in the request extensions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use royella_session::Session;
use royella_store::{Collection, DeleteResult, Document, Filter, InsertOneResult, UpdateResult};
use serde::Deserialize;
use serde_json::Value;

use super::{AppState, parse_id};
use crate::access_control::{OWNER_FIELD, ensure_owner};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub email: Option<String>,
}

/// GET /bookings?email= - the caller's own bookings
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Query(query), _): WithRejection<Query<OwnerQuery>, AppError>,
) -> Result<Json<Vec<Document>>, AppError> {
    ensure_owner(&session, query.email.as_deref())?;

    let filter = Filter::all().eq(OWNER_FIELD, session.email.clone());
    let bookings = state.store.find(Collection::Bookings, &filter, None).await?;

    Ok(Json(bookings))
}

/// POST /bookings - the booking must name the caller as owner
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Json(booking), _): WithRejection<Json<Document>, AppError>,
) -> Result<Json<InsertOneResult>, AppError> {
    ensure_owner(&session, owner_of(&booking))?;

    let result = state.store.insert_one(Collection::Bookings, booking).await?;

    tracing::info!(
        email = %session.email,
        booking_id = %result.inserted_id,
        "Booking created"
    );

    Ok(Json(result))
}

/// GET /bookings/{id}
pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let (_, booking) = load_owned(&state, &session, &id).await?;

    Ok(Json(booking))
}

#[derive(Debug, Deserialize)]
pub struct DateChange {
    pub date: Value,
}

/// PATCH /bookings/{id} - only `date` is written
pub async fn change_date(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    WithRejection(Json(change), _): WithRejection<Json<DateChange>, AppError>,
) -> Result<Json<UpdateResult>, AppError> {
    let (filter, _) = load_owned(&state, &session, &id).await?;

    let mut set = Document::new();
    set.insert("date".to_string(), change.date);

    let result = state
        .store
        .update_one(Collection::Bookings, &filter, set)
        .await?;

    // Cancelled between the ownership check and the write.
    if result.matched_count == 0 {
        return Err(AppError::NotFound("Booking"));
    }

    tracing::info!(email = %session.email, booking_id = %id, "Booking date changed");

    Ok(Json(result))
}

/// DELETE /bookings/{id}
pub async fn cancel(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, AppError> {
    let (filter, _) = load_owned(&state, &session, &id).await?;

    let result = state
        .store
        .delete_one(Collection::Bookings, &filter)
        .await?;

    tracing::info!(email = %session.email, booking_id = %id, "Booking cancelled");

    Ok(Json(result))
}

fn owner_of(booking: &Document) -> Option<&str> {
    booking.get(OWNER_FIELD).and_then(Value::as_str)
}

/// Fetch a booking by id, failing with 404 when absent and 403 when owned by someone else
async fn load_owned(
    state: &AppState,
    session: &Session,
    id: &str,
) -> Result<(Filter, Document), AppError> {
    let filter = Filter::by_id(parse_id(id)?);

    let booking = state
        .store
        .find_one(Collection::Bookings, &filter)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;

    ensure_owner(session, owner_of(&booking))?;

    Ok((filter, booking))
}
