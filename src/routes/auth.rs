use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::auth::{
        AuthorizeUrl, LoginRequest, LoginResponse, OAuthCallbackQuery, RegisterRequest,
        UpdateProfileRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me).put(update_me))
        .route("/google/authorize", get(google_authorize))
        .route("/google/callback", get(google_callback))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created and signed in", body = ApiResponse<LoginResponse>),
        (status = 409, description = "Email is already taken"),
        (status = 422, description = "Invalid fields"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid email or password"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 422, description = "Invalid fields"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/google/authorize",
    responses(
        (status = 200, description = "Provider URL to redirect to", body = ApiResponse<AuthorizeUrl>),
        (status = 503, description = "Google sign-in is not configured"),
    ),
    tag = "Auth"
)]
pub async fn google_authorize(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<AuthorizeUrl>>> {
    Ok(Json(auth_service::google_authorize(&state)?))
}

#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    params(
        ("code" = String, Query, description = "Authorization code from the provider"),
        ("state" = String, Query, description = "State issued by the authorize endpoint")
    ),
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid or expired state"),
        (status = 503, description = "Google sign-in is not configured"),
    ),
    tag = "Auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::google_callback(&state, query).await?;
    Ok(Json(resp))
}
