use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;
use aerobook_core::booking::{Booking, CreateBookingRequest};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking: Booking,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking).delete(delete_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = state.bookings.create_booking(req).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse { booking })))
}

async fn get_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.bookings.get_booking(id).await?;
    Ok(Json(BookingResponse { booking }))
}

async fn delete_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.bookings.delete_booking(id).await?;
    Ok(Json(json!({ "message": "Booking deleted successfully" })))
}
