use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::enquiries::{CreateEnquiryRequest, EnquiryList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PriceEnquiry,
    response::ApiResponse,
    routes::params::Pagination,
    services::enquiry_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_enquiry))
        .route("/mine", get(list_my_enquiries))
}

#[utoipa::path(
    post,
    path = "/api/enquiries",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 200, description = "Price enquiry received", body = ApiResponse<PriceEnquiry>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid fields"),
    ),
    tag = "Enquiries"
)]
pub async fn create_enquiry(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<CreateEnquiryRequest>,
) -> AppResult<Json<ApiResponse<PriceEnquiry>>> {
    let resp = enquiry_service::create_enquiry(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/enquiries/mine",
    params(Pagination),
    responses(
        (status = 200, description = "Enquiries sent while signed in", body = ApiResponse<EnquiryList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Enquiries"
)]
pub async fn list_my_enquiries(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<EnquiryList>>> {
    let resp = enquiry_service::list_my_enquiries(&state, &user, pagination).await?;
    Ok(Json(resp))
}
