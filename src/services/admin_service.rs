use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, Func, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{DashboardStats, InventoryAdjustRequest, UpdateOrderStatusRequest, UpdateRoleRequest, UserList},
        orders::{OrderList, OrderWithItems},
        products::ProductList,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus, PaymentStatus, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, SortOrder, UserListQuery},
    services::{
        display_context,
        order_service::{mark_cancelled, with_items},
        product_service::{escape_like, hydrate_products},
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse().map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Cancelling puts the stock back; a cancelled order stays cancelled.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.status.clone();

    let order = if previous == payload.status.as_str() {
        existing
    } else if previous == OrderStatus::Cancelled.as_str() {
        return Err(AppError::Conflict("order is already cancelled".into()));
    } else if payload.status == OrderStatus::Cancelled {
        mark_cancelled(&txn, existing).await?
    } else {
        let now = Utc::now();
        let paid = payload.status == OrderStatus::Paid && existing.paid_at.is_none();
        let mut active: OrderActive = existing.into();
        active.status = Set(payload.status.as_str().to_string());
        if paid {
            active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
            active.paid_at = Set(Some(now.into()));
        }
        active.updated_at = Set(now.into());
        active.update(&txn).await?
    };

    let data = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "from": previous, "to": payload.status.as_str() }),
    )
    .await;

    Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())))
}

/// Reconcile cash-on-delivery and manual card orders once the money arrives.
pub async fn mark_payment_received(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if existing.status == OrderStatus::Cancelled.as_str() {
        return Err(AppError::Conflict("order is cancelled".into()));
    }
    if existing.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::Conflict("payment already recorded".into()));
    }

    let now = Utc::now();
    let advance = existing.status == OrderStatus::Pending.as_str()
        || existing.status == OrderStatus::Confirmed.as_str();
    let mut active: OrderActive = existing.into();
    active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
    active.paid_at = Set(Some(now.into()));
    if advance {
        active.status = Set(OrderStatus::Paid.as_str().to_string());
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    let data = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_payment_received",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Payment recorded", data, Some(Meta::empty())))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = hydrate_products(&state.orm, &display_context(state), models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product
        .stock
        .checked_add(payload.delta)
        .filter(|stock| *stock >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta, "stock": new_stock }),
    )
    .await;

    let mut products = hydrate_products(&state.orm, &display_context(state), vec![updated]).await?;
    let product = products.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Inventory updated", product, Some(Meta::empty())))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(UserCol::Email))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(UserCol::FullName))).like(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_user_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    if id == user.user_id && payload.role != Role::Admin {
        return Err(AppError::BadRequest("you cannot remove your own admin role".into()));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.role.clone();

    let mut active: UserActive = existing.into();
    active.role = Set(payload.role.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": id, "from": previous, "to": payload.role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success("Role updated", updated.into(), Some(Meta::empty())))
}

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products) AS products,
            (SELECT COUNT(*) FROM products WHERE is_active) AS active_products,
            (SELECT COUNT(*) FROM products WHERE is_active AND stock <= $1) AS low_stock,
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM orders) AS orders,
            (SELECT COUNT(*) FROM orders WHERE status IN ('pending', 'confirmed')) AS pending_orders,
            (SELECT COUNT(*) FROM price_enquiries WHERE status = 'new') AS new_enquiries,
            (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders WHERE payment_status = 'paid') AS revenue
        "#,
    )
    .bind(state.config.low_stock_threshold)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}
