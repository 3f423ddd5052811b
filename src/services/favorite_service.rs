use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::favorites::{WishlistEntry, WishlistRequest, WishlistToggle, WishlistView},
    entity::{
        favorites::{ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites, Model as FavoriteModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Favorite,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{display_context, product_service::hydrate_products},
    state::AppState,
};

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<WishlistView>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Favorites::find()
        .filter(FavCol::UserId.eq(user.user_id))
        .order_by_desc(FavCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let (favorites, products): (Vec<FavoriteModel>, Vec<ProductModel>) = rows
        .into_iter()
        .filter_map(|(fav, product)| product.map(|p| (fav, p)))
        .unzip();
    let products = hydrate_products(&state.orm, &display_context(state), products).await?;

    let items = favorites
        .into_iter()
        .zip(products)
        .map(|(fav, product)| WishlistEntry {
            id: fav.id,
            product,
            added_at: fav.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        WishlistView { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Adding a product that is already listed returns the existing entry.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: WishlistRequest,
) -> AppResult<ApiResponse<Favorite>> {
    ensure_product(state, payload.product_id).await?;

    if let Some(existing) = find_entry(state, user.user_id, payload.product_id).await? {
        return Ok(ApiResponse::success(
            "Already in wishlist",
            existing.into(),
            Some(Meta::empty()),
        ));
    }

    let favorite = insert_entry(state, user.user_id, payload.product_id).await?;
    audit::record(
        &state.pool,
        Some(user.user_id),
        "wishlist_add",
        "favorites",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::success("Added to wishlist", favorite.into(), Some(Meta::empty())))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Favorites::delete_many()
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(FavCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "wishlist_remove",
        "favorites",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({ "product_id": product_id }),
        Some(Meta::empty()),
    ))
}

/// Flip membership and report the new state.
pub async fn toggle_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: WishlistRequest,
) -> AppResult<ApiResponse<WishlistToggle>> {
    let in_wishlist = match find_entry(state, user.user_id, payload.product_id).await? {
        Some(existing) => {
            Favorites::delete_by_id(existing.id).exec(&state.orm).await?;
            false
        }
        None => {
            ensure_product(state, payload.product_id).await?;
            insert_entry(state, user.user_id, payload.product_id).await?;
            true
        }
    };

    audit::record(
        &state.pool,
        Some(user.user_id),
        "wishlist_toggle",
        "favorites",
        serde_json::json!({ "product_id": payload.product_id, "in_wishlist": in_wishlist }),
    )
    .await;

    let message = if in_wishlist {
        "Added to wishlist"
    } else {
        "Removed from wishlist"
    };
    Ok(ApiResponse::success(
        message,
        WishlistToggle {
            product_id: payload.product_id,
            in_wishlist,
        },
        Some(Meta::empty()),
    ))
}

async fn ensure_product(state: &AppState, product_id: Uuid) -> AppResult<()> {
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active)
        .map(|_| ())
        .ok_or(AppError::NotFound)
}

async fn find_entry(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<FavoriteModel>> {
    Ok(Favorites::find()
        .filter(FavCol::UserId.eq(user_id))
        .filter(FavCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?)
}

async fn insert_entry(state: &AppState, user_id: Uuid, product_id: Uuid) -> AppResult<FavoriteModel> {
    Ok(FavoriteActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        product_id: Set(product_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?)
}
