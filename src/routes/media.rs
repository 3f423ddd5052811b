use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    routing::{delete, get, post},
};
use utoipa::ToSchema;

use crate::{
    dto::media::{AssetSpecList, ResizePlanQuery, UploadForm, UploadResponse},
    error::{AppError, AppResult, FieldErrors},
    media::{AssetKind, ResizePlan},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::media_service,
    state::AppState,
};

/// Largest multipart body accepted on the upload route.
pub const UPLOAD_BODY_LIMIT: usize = 5 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new().route("/specs", get(list_specs))
}

/// Mounted under `/api/admin/media`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/plan", get(plan_resize))
        .route("/{bucket}/{file}", delete(delete_media))
}

/// Multipart layout of an upload, for the API docs.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadMultipart {
    kind: AssetKind,
    /// Width after the client-side resize.
    width: u32,
    height: u32,
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    get,
    path = "/api/media/specs",
    responses(
        (status = 200, description = "Size and dimension limits per asset kind", body = ApiResponse<AssetSpecList>)
    ),
    tag = "Media"
)]
pub async fn list_specs() -> Json<ApiResponse<AssetSpecList>> {
    Json(media_service::specs())
}

#[utoipa::path(
    get,
    path = "/api/admin/media/plan",
    params(
        ("kind" = AssetKind, Query, description = "Asset kind"),
        ("width" = u32, Query, description = "Source width in px"),
        ("height" = u32, Query, description = "Source height in px")
    ),
    responses(
        (status = 200, description = "Dimensions to resize to before upload", body = ApiResponse<ResizePlan>),
        (status = 422, description = "Invalid dimensions"),
    ),
    security(("bearer_auth" = [])),
    tag = "Media"
)]
pub async fn plan_resize(
    user: AuthUser,
    Query(query): Query<ResizePlanQuery>,
) -> AppResult<Json<ApiResponse<ResizePlan>>> {
    Ok(Json(media_service::plan(&user, query)?))
}

#[utoipa::path(
    post,
    path = "/api/admin/media",
    request_body(content = UploadMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored image and its public URL", body = ApiResponse<UploadResponse>),
        (status = 422, description = "Wrong type, too large or out of bounds"),
    ),
    security(("bearer_auth" = [])),
    tag = "Media"
)]
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadResponse>>> {
    let form = read_upload(multipart).await?;
    let resp = media_service::upload(&state, &user, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/media/{bucket}/{file}",
    params(
        ("bucket" = String, Path, description = "Bucket of the asset kind"),
        ("file" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "Deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Unknown bucket"),
    ),
    security(("bearer_auth" = [])),
    tag = "Media"
)]
pub async fn delete_media(
    State(state): State<AppState>,
    user: AuthUser,
    Path((bucket, file)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(media_service::delete(&state, &user, &bucket, &file).await?))
}

async fn read_upload(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut kind = None;
    let mut width = None;
    let mut height = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "kind" => {
                let text = field.text().await.map_err(multipart_error)?;
                kind = serde_json::from_value::<AssetKind>(serde_json::Value::String(text)).ok();
            }
            "width" => width = field.text().await.map_err(multipart_error)?.trim().parse::<u32>().ok(),
            "height" => height = field.text().await.map_err(multipart_error)?.trim().parse::<u32>().ok(),
            "file" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let mut errors = FieldErrors::new();
    if kind.is_none() {
        errors.add("kind", "must be one of brand_logo, category_image, product_image, banner");
    }
    if width.is_none() {
        errors.add("width", "is required");
    }
    if height.is_none() {
        errors.add("height", "is required");
    }
    if file.is_none() {
        errors.add("file", "is required");
    }

    match (kind, width, height, file) {
        (Some(kind), Some(width), Some(height), Some((content_type, bytes))) => Ok(UploadForm {
            kind,
            width,
            height,
            content_type,
            bytes,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}
