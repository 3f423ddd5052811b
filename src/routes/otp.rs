use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::otp::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::otp_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(send_otp))
        .route("/verify", post(verify_otp))
}

#[utoipa::path(
    post,
    path = "/api/otp/send",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code sent", body = ApiResponse<SendOtpResponse>),
        (status = 422, description = "Invalid phone number"),
        (status = 429, description = "A code was sent less than 30 seconds ago"),
    ),
    tag = "OTP"
)]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> AppResult<Json<ApiResponse<SendOtpResponse>>> {
    let resp = otp_service::send_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Phone verified", body = ApiResponse<VerifyOtpResponse>),
        (status = 400, description = "No active or expired code"),
        (status = 422, description = "Incorrect code"),
        (status = 429, description = "Too many attempts"),
    ),
    tag = "OTP"
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<VerifyOtpResponse>>> {
    let resp = otp_service::verify_otp(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}
