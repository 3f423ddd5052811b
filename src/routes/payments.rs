use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    clients::razorpay::GatewayOrder,
    dto::payments::{CreateGatewayOrderRequest, GatewayErrorBody},
    services::payment_service::{self, ProxyError},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/create-order", post(create_order))
}

#[utoipa::path(
    post,
    path = "/api/razorpay/create-order",
    request_body = CreateGatewayOrderRequest,
    responses(
        (status = 200, description = "Gateway order object", body = GatewayOrder),
        (status = 400, description = "Invalid amount, currency or receipt", body = GatewayErrorBody),
        (status = 502, description = "Gateway rejected the request", body = GatewayErrorBody),
        (status = 504, description = "Gateway timed out", body = GatewayErrorBody),
    ),
    tag = "Payments"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateGatewayOrderRequest>, JsonRejection>,
) -> Result<Json<GatewayOrder>, ProxyError> {
    let Json(payload) = payload.map_err(|err| ProxyError::BadRequest(err.body_text()))?;
    let order = payment_service::create_gateway_order(&state, payload).await?;
    Ok(Json(order))
}
