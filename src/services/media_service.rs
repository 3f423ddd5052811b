use crate::{
    audit,
    dto::media::{AssetSpecList, ResizePlanQuery, UploadForm, UploadResponse},
    error::{AppError, AppResult},
    media::{AssetKind, MediaStore, ResizePlan, plan_resize, validate_upload},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn store(state: &AppState) -> MediaStore {
    MediaStore::new(&state.config.media_root, state.config.public_base_url.as_str())
}

pub fn specs() -> ApiResponse<AssetSpecList> {
    let items = AssetKind::ALL.iter().map(|kind| kind.spec()).collect();
    ApiResponse::success("OK", AssetSpecList { items }, Some(Meta::empty()))
}

/// Target dimensions the client should resize to before uploading.
pub fn plan(user: &AuthUser, query: ResizePlanQuery) -> AppResult<ApiResponse<ResizePlan>> {
    ensure_admin(user)?;
    let plan = plan_resize(query.kind, query.width, query.height)?;
    Ok(ApiResponse::success("OK", plan, Some(Meta::empty())))
}

pub async fn upload(
    state: &AppState,
    user: &AuthUser,
    form: UploadForm,
) -> AppResult<ApiResponse<UploadResponse>> {
    ensure_admin(user)?;
    let size = form.bytes.len() as u64;
    let ext = validate_upload(form.kind, &form.content_type, size, form.width, form.height)?;
    let plan = plan_resize(form.kind, form.width, form.height)?;

    let stored = store(state)
        .save(form.kind, ext, &form.bytes)
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::from(err).context("storing upload")))?;

    tracing::info!(key = %stored.key, size, "media stored");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "media_upload",
        "media",
        serde_json::json!({ "key": stored.key, "size": size }),
    )
    .await;

    Ok(ApiResponse::success(
        "Uploaded",
        UploadResponse {
            key: stored.key,
            url: stored.url,
            kind: form.kind,
            size,
            plan,
        },
        Some(Meta::empty()),
    ))
}

/// Delete a stored object by its `<bucket>/<file>` key.
pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    bucket: &str,
    file: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let known = AssetKind::ALL.iter().any(|kind| kind.spec().bucket == bucket);
    if !known || file.contains('/') || file.starts_with('.') {
        return Err(AppError::NotFound);
    }

    let key = format!("{bucket}/{file}");
    store(state)
        .remove(&key)
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::from(err).context("removing upload")))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "media_delete",
        "media",
        serde_json::json!({ "key": key }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "key": key }),
        Some(Meta::empty()),
    ))
}
