use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::enquiries::{CreateEnquiryRequest, EnquiryList, UpdateEnquiryRequest},
    entity::{
        price_enquiries::{ActiveModel as EnquiryActive, Column as EnqCol, Entity as Enquiries},
        products::Entity as Products,
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    models::{EnquiryStatus, PriceEnquiry},
    phone::normalize_phone,
    response::{ApiResponse, Meta},
    routes::params::{EnquiryListQuery, Pagination},
    services::non_empty,
    state::AppState,
};

/// Anyone may ask for a quote on a B2B product; signed-in users get it
/// linked to their account.
pub async fn create_enquiry(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateEnquiryRequest,
) -> AppResult<ApiResponse<PriceEnquiry>> {
    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => err.into(),
    };
    let phone = match normalize_phone(&payload.phone) {
        Ok(phone) => Some(phone),
        Err(err) => {
            errors.add("phone", err.to_string());
            None
        }
    };
    errors.into_result()?;
    let phone = phone.ok_or_else(|| AppError::BadRequest("phone is required".into()))?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound)?;
    if !product.is_b2b {
        return Err(AppError::BadRequest(
            "this product can be bought directly, price enquiries are for quotation products".into(),
        ));
    }

    let now = Utc::now();
    let enquiry = EnquiryActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        user_id: Set(user.map(|u| u.user_id)),
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.trim().to_lowercase()),
        phone: Set(phone),
        company: Set(non_empty(payload.company)),
        quantity: Set(payload.quantity),
        message: Set(non_empty(payload.message)),
        status: Set(EnquiryStatus::New.as_str().to_string()),
        quoted_price: Set(None),
        admin_notes: Set(None),
        created_at: Set(now.into()),
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.map(|u| u.user_id),
        "enquiry_create",
        "price_enquiries",
        serde_json::json!({ "enquiry_id": enquiry.id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Enquiry received",
        PriceEnquiry::from_entity(enquiry, Some(&product)),
        Some(Meta::empty()),
    ))
}

pub async fn list_my_enquiries(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<EnquiryList>> {
    let condition = Condition::all().add(EnqCol::UserId.eq(user.user_id));
    list(state, condition, pagination).await
}

pub async fn admin_list_enquiries(
    state: &AppState,
    user: &AuthUser,
    query: EnquiryListQuery,
) -> AppResult<ApiResponse<EnquiryList>> {
    ensure_admin(user)?;
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: EnquiryStatus = status.parse().map_err(AppError::BadRequest)?;
        condition = condition.add(EnqCol::Status.eq(status.as_str()));
    }
    list(state, condition, query.pagination()).await
}

pub async fn admin_get_enquiry(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<PriceEnquiry>> {
    ensure_admin(user)?;
    let (enquiry, product) = Enquiries::find_by_id(id)
        .find_also_related(Products)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        PriceEnquiry::from_entity(enquiry, product.as_ref()),
        Some(Meta::empty()),
    ))
}

/// Moves the enquiry along its pipeline; quoting requires a price.
pub async fn admin_update_enquiry(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateEnquiryRequest,
) -> AppResult<ApiResponse<PriceEnquiry>> {
    ensure_admin(user)?;
    let (enquiry, product) = Enquiries::find_by_id(id)
        .find_also_related(Products)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: EnquiryStatus = enquiry
        .status
        .parse()
        .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;
    let next = payload.status.unwrap_or(current);
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "enquiry cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let quoted_price = payload.quoted_price.or(enquiry.quoted_price);
    quote_errors(next, payload.quoted_price, quoted_price).into_result()?;

    let mut active: EnquiryActive = enquiry.into();
    active.status = Set(next.as_str().to_string());
    active.quoted_price = Set(quoted_price);
    if let Some(notes) = payload.admin_notes {
        active.admin_notes = Set(non_empty(Some(notes)));
    }
    active.updated_at = Set(Utc::now().into());
    let enquiry = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "enquiry_update",
        "price_enquiries",
        serde_json::json!({ "enquiry_id": id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Enquiry updated",
        PriceEnquiry::from_entity(enquiry, product.as_ref()),
        Some(Meta::empty()),
    ))
}

/// A new price must be positive, and an enquiry cannot sit in `quoted`
/// without one.
fn quote_errors(next: EnquiryStatus, submitted: Option<i64>, effective: Option<i64>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(price) = submitted.filter(|p| *p <= 0) {
        errors.add("quoted_price", format!("must be greater than 0, got {price}"));
    }
    if next == EnquiryStatus::Quoted && effective.is_none() {
        errors.add("quoted_price", "is required to quote");
    }
    errors
}

async fn list(
    state: &AppState,
    condition: Condition,
    pagination: Pagination,
) -> AppResult<ApiResponse<EnquiryList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Enquiries::find()
        .filter(condition)
        .order_by_desc(EnqCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(enquiry, product)| PriceEnquiry::from_entity(enquiry, product.as_ref()))
        .collect();

    Ok(ApiResponse::success(
        "OK",
        EnquiryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_requires_a_price() {
        let errors = quote_errors(EnquiryStatus::Quoted, None, None);
        assert!(errors.contains("quoted_price"));
        assert!(quote_errors(EnquiryStatus::Quoted, Some(125_000), Some(125_000)).is_empty());
        // A price recorded earlier carries over.
        assert!(quote_errors(EnquiryStatus::Quoted, None, Some(125_000)).is_empty());
        assert!(quote_errors(EnquiryStatus::Contacted, None, None).is_empty());
    }

    #[test]
    fn quoted_prices_must_be_positive() {
        for price in [0, -1] {
            let errors = quote_errors(EnquiryStatus::Contacted, Some(price), Some(price));
            assert!(errors.contains("quoted_price"));
        }
    }
}
