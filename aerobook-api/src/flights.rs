use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;
use aerobook_core::flight::{Flight, FlightUpdateRequest, NewFlightRequest};
use aerobook_core::search::{FlightSearchRequest, FlightSearchResult};
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::AdminIdentity;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct FlightResponse {
    flight: Flight,
}

#[derive(Debug, Serialize)]
struct FlightListResponse {
    flights: Vec<Flight>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(list_flights).post(create_flight))
        .route("/v1/flights/search", get(search_flights))
        .route("/v1/flights/{id}", get(get_flight).put(update_flight).delete(delete_flight))
}

async fn create_flight(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewFlightRequest>,
) -> Result<(StatusCode, Json<FlightResponse>), AppError> {
    let flight = state.flights.create_flight(req).await?;
    Ok((StatusCode::CREATED, Json(FlightResponse { flight })))
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<FlightListResponse>, AppError> {
    let flights = state.flights.list_flights().await?;
    Ok(Json(FlightListResponse { flights }))
}

async fn search_flights(
    State(state): State<AppState>,
    AppQuery(req): AppQuery<FlightSearchRequest>,
) -> Result<Json<FlightSearchResult>, AppError> {
    Ok(Json(state.flights.search(req).await?))
}

async fn get_flight(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<FlightResponse>, AppError> {
    let flight = state.flights.get_flight(id).await?;
    Ok(Json(FlightResponse { flight }))
}

async fn update_flight(
    State(state): State<AppState>,
    AdminIdentity(admin_id): AdminIdentity,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<FlightUpdateRequest>,
) -> Result<Json<FlightResponse>, AppError> {
    let flight = state.flights.update_flight(id, req, admin_id).await?;
    Ok(Json(FlightResponse { flight }))
}

async fn delete_flight(
    State(state): State<AppState>,
    AdminIdentity(admin_id): AdminIdentity,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.flights.delete_flight(id, admin_id).await?;
    Ok(Json(json!({ "message": "Flight deleted successfully" })))
}
