use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::DisplayContext,
    slug::{slugify, unique_slug},
    state::AppState,
};

pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod enquiry_service;
pub mod favorite_service;
pub mod media_service;
pub mod order_service;
pub mod otp_service;
pub mod payment_service;
pub mod product_service;

pub(crate) fn display_context(state: &AppState) -> DisplayContext<'_> {
    DisplayContext {
        base_url: &state.config.public_base_url,
        low_stock_threshold: state.config.low_stock_threshold,
    }
}

/// Pick the slug for a write. An explicit slug must be free; a derived one is
/// suffixed (`-2`, `-3`, ...) until it is.
pub(crate) async fn resolve_slug<E, C>(
    conn: &C,
    slug_col: E::Column,
    id_col: E::Column,
    name: &str,
    requested: Option<&str>,
    exclude: Option<Uuid>,
) -> AppResult<String>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let requested = requested.map(str::trim).filter(|s| !s.is_empty());
    let base = slugify(requested.unwrap_or(name));

    let mut query = E::find()
        .select_only()
        .column(slug_col)
        .filter(slug_col.starts_with(base.as_str()));
    if let Some(id) = exclude {
        query = query.filter(id_col.ne(id));
    }
    let taken: Vec<String> = query.into_tuple().all(conn).await?;

    if requested.is_some() {
        if taken.iter().any(|s| *s == base) {
            return Err(AppError::Conflict(format!("slug {base} is already in use")));
        }
        return Ok(base);
    }
    Ok(unique_slug(&base, &taken))
}

/// Treat blank optional strings from forms as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
