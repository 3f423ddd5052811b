use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait,
    DatabaseTransaction, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    checkout::{CheckoutDraft, CheckoutWizard, PaymentMethod, validate_card},
    clients::razorpay::{GatewayError, GatewayOrderRequest},
    dto::orders::{
        CheckoutResponse, GatewayCheckout, OrderList, OrderWithItems, ValidateStepRequest,
        ValidateStepResponse, VerifyPaymentRequest,
    },
    entity::{
        cart_items::{self, Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, PaymentStatus},
    phone::normalize_phone,
    pricing::{CartLine, CartTotals},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub const CURRENCY: &str = "INR";

/// Dry-run a wizard step so the client can show inline errors.
pub fn validate_step(payload: ValidateStepRequest) -> ApiResponse<ValidateStepResponse> {
    let today = Utc::now().date_naive();
    let errors = crate::checkout::validate_step(payload.step, &payload.draft, today);
    let valid = errors.is_empty();
    let next_step = if valid {
        let mut wizard = CheckoutWizard::resume(payload.step, payload.draft);
        wizard.advance(today).ok()
    } else {
        None
    };
    let message = if valid { "Step is valid" } else { "Step has errors" };
    ApiResponse::success(
        message,
        ValidateStepResponse {
            step: payload.step,
            valid,
            next_step,
            errors,
        },
        Some(Meta::empty()),
    )
}

#[derive(Debug, FromQueryResult)]
struct CartProductRow {
    product_id: Uuid,
    quantity: i32,
    name: String,
    price: i64,
    stock: i32,
    is_active: bool,
    is_b2b: bool,
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    draft: CheckoutDraft,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let today = Utc::now().date_naive();
    let mut draft = CheckoutWizard::new(draft).complete(today)?;
    let method = draft
        .payment_method
        .ok_or_else(|| AppError::BadRequest("payment method is required".into()))?;
    let card = match (method, draft.card.as_ref()) {
        (PaymentMethod::Card, Some(card)) => Some(validate_card(card, today)?),
        _ => None,
    };
    if let Ok(phone) = normalize_phone(&draft.shipping.phone) {
        draft.shipping.phone = phone;
    }

    let txn = state.orm.begin().await?;

    let rows = CartItems::find()
        .select_only()
        .column_as(CartCol::ProductId, "product_id")
        .column_as(CartCol::Quantity, "quantity")
        .column_as(ProdCol::Name, "name")
        .column_as(ProdCol::Price, "price")
        .column_as(ProdCol::Stock, "stock")
        .column_as(ProdCol::IsActive, "is_active")
        .column_as(ProdCol::IsB2b, "is_b2b")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .into_model::<CartProductRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut errors = FieldErrors::new();
    for row in &rows {
        let field = format!("cart.{}", row.product_id);
        if !row.is_active || row.is_b2b {
            errors.add(field, format!("{} is no longer available", row.name));
        } else if row.stock < row.quantity {
            errors.add(
                field,
                format!("only {} of {} in stock", row.stock.max(0), row.name),
            );
        }
    }
    errors.into_result()?;

    let lines: Vec<CartLine> = rows
        .iter()
        .map(|row| CartLine {
            unit_price: row.price,
            quantity: row.quantity,
        })
        .collect();
    let totals = CartTotals::compute(&lines, &state.config.pricing)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let order_id = Uuid::new_v4();
    let invoice_number = build_invoice_number(order_id);

    // Created before any write so a gateway failure rolls the whole order back.
    let gateway = match method {
        PaymentMethod::Gateway => {
            let gateway_order = state
                .gateway
                .create_order(&GatewayOrderRequest {
                    amount: totals.total,
                    currency: CURRENCY.to_string(),
                    receipt: invoice_number.clone(),
                })
                .await
                .map_err(gateway_error)?;
            Some(GatewayCheckout {
                gateway_order_id: gateway_order.id,
                key_id: state.gateway.key_id().to_string(),
                amount: gateway_order.amount,
                currency: gateway_order.currency,
                demo: state.gateway.is_demo(),
            })
        }
        PaymentMethod::Cod | PaymentMethod::Card => None,
    };

    let (status, payment_status) = match method {
        PaymentMethod::Cod => (OrderStatus::Confirmed, PaymentStatus::Cod),
        PaymentMethod::Gateway | PaymentMethod::Card => (OrderStatus::Pending, PaymentStatus::Pending),
    };

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        subtotal: Set(totals.subtotal),
        shipping_fee: Set(totals.shipping),
        tax: Set(totals.tax),
        total_amount: Set(totals.total),
        status: Set(status.as_str().to_string()),
        payment_status: Set(payment_status.as_str().to_string()),
        payment_method: Set(method.as_str().to_string()),
        invoice_number: Set(invoice_number),
        shipping_address: Set(serde_json::to_value(&draft.shipping).map_err(anyhow::Error::from)?),
        notes: Set(draft.notes.clone().filter(|n| !n.trim().is_empty())),
        gateway_order_id: Set(gateway.as_ref().map(|g| g.gateway_order_id.clone())),
        gateway_payment_id: Set(None),
        card_brand: Set(card.as_ref().map(|c| c.brand.clone())),
        card_last4: Set(card.as_ref().map(|c| c.last4.clone())),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(rows.len());
    for row in &rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            product_name: Set(row.name.clone()),
            quantity: Set(row.quantity),
            price: Set(row.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item.into());

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(row.quantity))
            .filter(ProdCol::Id.eq(row.product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "payment_method": method.as_str(),
            "total": order.total_amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        CheckoutResponse {
            order: order.into(),
            items,
            gateway,
        },
        Some(Meta::empty()),
    ))
}

/// Confirm a gateway payment from the checkout widget callback.
pub async fn verify_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_own_order(&txn, user.user_id, id).await?;

    if order.payment_method != PaymentMethod::Gateway.as_str() {
        return Err(AppError::BadRequest("order was not paid through the gateway".into()));
    }
    if order.gateway_order_id.as_deref() != Some(payload.gateway_order_id.as_str()) {
        return Err(AppError::BadRequest("gateway order does not match".into()));
    }
    if order.payment_status == PaymentStatus::Paid.as_str() {
        if order.gateway_payment_id.as_deref() == Some(payload.gateway_payment_id.as_str()) {
            let data = with_items(&txn, order).await?;
            txn.commit().await?;
            return Ok(ApiResponse::success("Payment already recorded", data, Some(Meta::empty())));
        }
        return Err(AppError::Conflict("Order already paid".into()));
    }
    if order.status == OrderStatus::Cancelled.as_str() {
        return Err(AppError::Conflict("Order was cancelled".into()));
    }

    if !state.gateway.verify_signature(
        &payload.gateway_order_id,
        &payload.gateway_payment_id,
        &payload.signature,
    ) {
        tracing::warn!(order_id = %order.id, "payment signature mismatch");
        return Err(AppError::BadRequest("payment signature is invalid".into()));
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
    active.status = Set(OrderStatus::Paid.as_str().to_string());
    active.gateway_payment_id = Set(Some(payload.gateway_payment_id.clone()));
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    let data = with_items(&txn, order).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": id, "payment_id": payload.gateway_payment_id }),
    )
    .await;

    Ok(ApiResponse::success("Payment recorded", data, Some(Meta::empty())))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_own_order(&txn, user.user_id, id).await?;

    let status: OrderStatus = order
        .status
        .parse()
        .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;
    if !status.is_cancellable() || order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::Conflict(format!(
            "order in status {} cannot be cancelled",
            order.status
        )));
    }

    let order = mark_cancelled(&txn, order).await?;
    let data = with_items(&txn, order).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", data, Some(Meta::empty())))
}

/// Put the order's quantities back on the shelf and flag it cancelled.
pub(crate) async fn mark_cancelled(
    txn: &DatabaseTransaction,
    order: OrderModel,
) -> AppResult<OrderModel> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(txn)
        .await?;
    for item in &items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(txn)
            .await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
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

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

async fn lock_own_order(txn: &DatabaseTransaction, user_id: Uuid, id: Uuid) -> AppResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(OrderWithItems {
        order: order.into(),
        items,
    })
}

pub(crate) fn gateway_error(err: GatewayError) -> AppError {
    match err {
        GatewayError::Timeout => AppError::Timeout,
        other => AppError::Upstream(other.to_string()),
    }
}

pub fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string().to_uppercase();
    format!("INV-{}-{}", date, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_numbers_carry_date_and_order_prefix() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").expect("uuid");
        let invoice = build_invoice_number(id);
        assert!(invoice.starts_with("INV-"));
        assert!(invoice.ends_with("-1B4E28BA"));
        assert_eq!(invoice.len(), "INV-YYYYMMDD-XXXXXXXX".len());
    }

    #[test]
    fn gateway_timeouts_map_to_gateway_timeout() {
        assert!(matches!(gateway_error(GatewayError::Timeout), AppError::Timeout));
        assert!(matches!(
            gateway_error(GatewayError::Api {
                status: 400,
                message: "bad".into()
            }),
            AppError::Upstream(_)
        ));
    }
}
