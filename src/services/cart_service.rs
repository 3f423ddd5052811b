use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartLineDto, CartView, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartItemModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    pricing::{CartLine, CartTotals},
    response::{ApiResponse, Meta},
    services::{display_context, product_service::hydrate_products},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let view = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

/// Adds to an existing line rather than replacing it.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity <= 0 {
        let mut errors = FieldErrors::new();
        errors.add("quantity", "must be greater than 0");
        return Err(errors.into());
    }

    let product = purchasable_product(state, payload.product_id).await?;
    let existing = find_line(state, user.user_id, payload.product_id).await?;
    let current = existing.as_ref().map(|line| line.quantity).unwrap_or(0);
    let quantity = current
        .checked_add(payload.quantity)
        .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
    ensure_in_stock(&product, quantity)?;

    match existing {
        Some(line) => {
            let mut active: CartActive = line.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product.id),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?;
        }
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": quantity }),
    )
    .await;

    let view = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("Added to cart", view, Some(Meta::empty())))
}

/// Sets the line to an absolute quantity; `0` removes it.
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    if payload.quantity < 0 {
        let mut errors = FieldErrors::new();
        errors.add("quantity", "must not be negative");
        return Err(errors.into());
    }
    if payload.quantity == 0 {
        return remove_from_cart(state, user, product_id).await;
    }

    let line = find_line(state, user.user_id, product_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = purchasable_product(state, product_id).await?;
    ensure_in_stock(&product, payload.quantity)?;

    let mut active: CartActive = line.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    let view = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("Cart updated", view, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ProductId.eq(product_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    let view = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("Removed from cart", view, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    let view = load_cart(state, user.user_id).await?;
    Ok(ApiResponse::success("Cart cleared", view, Some(Meta::empty())))
}

pub(crate) async fn load_cart(state: &AppState, user_id: Uuid) -> AppResult<CartView> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let (lines, products): (Vec<CartItemModel>, Vec<ProductModel>) = rows
        .into_iter()
        .filter_map(|(line, product)| product.map(|p| (line, p)))
        .unzip();

    let pricing_lines: Vec<CartLine> = lines
        .iter()
        .zip(products.iter())
        .map(|(line, product)| CartLine {
            unit_price: product.price,
            quantity: line.quantity,
        })
        .collect();
    let totals = CartTotals::compute(&pricing_lines, &state.config.pricing)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let products = hydrate_products(&state.orm, &display_context(state), products).await?;
    let items = lines
        .into_iter()
        .zip(products)
        .map(|(line, product)| CartLineDto {
            id: line.id,
            line_total: product.price.saturating_mul(i64::from(line.quantity)),
            product,
            quantity: line.quantity,
        })
        .collect();

    Ok(CartView { items, totals })
}

async fn find_line(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<CartItemModel>> {
    Ok(CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?)
}

async fn purchasable_product(state: &AppState, product_id: Uuid) -> AppResult<ProductModel> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active)
        .ok_or(AppError::NotFound)?;
    if product.is_b2b {
        return Err(AppError::BadRequest(
            "this product is sold on quotation only, send a price enquiry instead".into(),
        ));
    }
    Ok(product)
}

fn ensure_in_stock(product: &ProductModel, quantity: i32) -> AppResult<()> {
    if quantity > product.stock {
        let mut errors = FieldErrors::new();
        errors.add(
            "quantity",
            format!("only {} of {} in stock", product.stock.max(0), product.name),
        );
        return Err(errors.into());
    }
    Ok(())
}
