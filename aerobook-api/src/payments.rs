use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use aerobook_core::payment::{CreateOrderRequest, GatewayOrder, PaymentConfirmation};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/orders", post(create_order))
        .route("/v1/payments/verify", post(verify_payment))
}

async fn create_order(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<GatewayOrder>), AppError> {
    let order = state.payments.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Relayed by the client after checkout; the signature proves the gateway
/// saw the payment.
async fn verify_payment(
    State(state): State<AppState>,
    AppJson(confirmation): AppJson<PaymentConfirmation>,
) -> Result<Json<Value>, AppError> {
    info!(order_id = %confirmation.order_id, "Verifying payment");
    let booking = state.payments.verify_payment(&confirmation).await?;
    Ok(Json(json!({
        "message": "Payment verified successfully",
        "booking": booking,
    })))
}
