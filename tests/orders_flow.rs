use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use serde_json::json;
use storefront_api::{
    checkout::{CheckoutDraft, PaymentMethod, ShippingDetails},
    clients::razorpay::DEMO_SIGNATURE,
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    dto::{
        admin::UpdateOrderStatusRequest,
        auth::RegisterRequest,
        cart::AddToCartRequest,
        favorites::WishlistRequest,
        orders::VerifyPaymentRequest,
    },
    entity::products::{ActiveModel as ProductActive, Entity as Products},
    error::AppError,
    middleware::auth::AuthUser,
    models::OrderStatus,
    routes::params::{LowStockQuery, Pagination},
    services::{admin_service, auth_service, cart_service, favorite_service, order_service},
    state::AppState,
};
use uuid::Uuid;

// Shopper registers, fills the cart, checks out with cash on delivery and
// cancels; then pays a gateway order that an admin ships.
#[tokio::test]
async fn checkout_cancel_and_gateway_payment_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let email = format!("shopper-{}@example.com", Uuid::new_v4().simple());
    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.clone(),
            password: "correct-horse".into(),
            full_name: Some("Asha Rao".into()),
            phone: Some("98765 43210".into()),
        },
    )
    .await?
    .data
    .expect("login response");
    assert_eq!(registered.user.phone.as_deref(), Some("+919876543210"));
    let shopper = AuthUser {
        user_id: registered.user.id,
        role: registered.user.role.clone(),
    };

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            email: email.to_uppercase(),
            password: "correct-horse".into(),
            full_name: None,
            phone: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let product_id = create_product(&state, 20_000, 10).await?;

    cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id, quantity: 2 })
        .await?;
    let cart = cart_service::list_cart(&state, &shopper).await?.data.expect("cart");
    assert_eq!(cart.totals.subtotal, 40_000);

    // Cash on delivery is confirmed straight away.
    let placed = order_service::checkout(&state, &shopper, draft(PaymentMethod::Cod))
        .await?
        .data
        .expect("checkout");
    assert_eq!(placed.order.status, "confirmed");
    assert_eq!(placed.order.payment_method, "cod");
    assert_eq!(placed.order.total_amount, 40_000 + 4_900 + 7_200);
    assert!(placed.order.invoice_number.starts_with("INV-"));
    assert!(placed.gateway.is_none());
    assert_eq!(stock_of(&state, product_id).await?, 8);
    let cart = cart_service::list_cart(&state, &shopper).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    // An empty cart cannot be checked out again.
    let again = order_service::checkout(&state, &shopper, draft(PaymentMethod::Cod)).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let cancelled = order_service::cancel_order(&state, &shopper, placed.order.id)
        .await?
        .data
        .expect("cancelled");
    assert_eq!(cancelled.order.status, "cancelled");
    assert_eq!(stock_of(&state, product_id).await?, 10);
    let twice = order_service::cancel_order(&state, &shopper, placed.order.id).await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));

    // Asking for more than is on the shelf fails per line.
    cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id, quantity: 1 })
        .await?;
    set_stock(&state, product_id, 0).await?;
    let short = order_service::checkout(&state, &shopper, draft(PaymentMethod::Cod)).await;
    match short {
        Err(AppError::Validation(errors)) => {
            assert!(errors.contains(&format!("cart.{product_id}")));
        }
        other => panic!("expected stock validation error, got {other:?}"),
    }
    set_stock(&state, product_id, 10).await?;

    // Gateway payment.
    let placed = order_service::checkout(&state, &shopper, draft(PaymentMethod::Gateway))
        .await?
        .data
        .expect("checkout");
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.payment_status, "pending");
    let gateway = placed.gateway.expect("gateway checkout");
    assert!(gateway.demo);
    assert_eq!(gateway.amount, placed.order.total_amount);

    let forged = order_service::verify_payment(
        &state,
        &shopper,
        placed.order.id,
        VerifyPaymentRequest {
            gateway_order_id: gateway.gateway_order_id.clone(),
            gateway_payment_id: "pay_demo_1".into(),
            signature: "forged".into(),
        },
    )
    .await;
    assert!(matches!(forged, Err(AppError::BadRequest(_))));

    for _ in 0..2 {
        let paid = order_service::verify_payment(
            &state,
            &shopper,
            placed.order.id,
            VerifyPaymentRequest {
                gateway_order_id: gateway.gateway_order_id.clone(),
                gateway_payment_id: "pay_demo_1".into(),
                signature: DEMO_SIGNATURE.into(),
            },
        )
        .await?
        .data
        .expect("paid");
        assert_eq!(paid.order.status, "paid");
        assert_eq!(paid.order.payment_status, "paid");
    }

    let paid_cancel = order_service::cancel_order(&state, &shopper, placed.order.id).await;
    assert!(matches!(paid_cancel, Err(AppError::Conflict(_))));

    // Admin side.
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    };
    let shopper_as_admin = admin_service::update_order_status(
        &state,
        &shopper,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await;
    assert!(matches!(shopper_as_admin, Err(AppError::Forbidden)));

    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?
    .data
    .expect("shipped");
    assert_eq!(shipped.order.status, "shipped");

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            page: Some(1),
            per_page: Some(100),
            threshold: Some(9),
        },
    )
    .await?
    .data
    .expect("low stock");
    assert!(low.items.iter().any(|p| p.id == product_id));

    let others = order_service::get_order(
        &state,
        &AuthUser {
            user_id: Uuid::new_v4(),
            role: "user".into(),
        },
        placed.order.id,
    )
    .await;
    assert!(matches!(others, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn wishlist_toggle_twice_restores_membership() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = auth_service::register_user(
        &state,
        RegisterRequest {
            email: format!("wish-{}@example.com", Uuid::new_v4().simple()),
            password: "correct-horse".into(),
            full_name: None,
            phone: None,
        },
    )
    .await?
    .data
    .expect("login response")
    .user;
    let user = AuthUser {
        user_id: user.id,
        role: user.role,
    };
    let product_id = create_product(&state, 5_000, 50).await?;

    let before = favorite_service::list_wishlist(&state, &user, Pagination::new(1, 100))
        .await?.data.expect("wishlist");
    let first = favorite_service::toggle_wishlist(&state, &user, WishlistRequest { product_id })
        .await?
        .data
        .expect("toggle");
    assert!(first.in_wishlist);
    let second = favorite_service::toggle_wishlist(&state, &user, WishlistRequest { product_id })
        .await?
        .data
        .expect("toggle");
    assert!(!second.in_wishlist);

    let after = favorite_service::list_wishlist(&state, &user, Pagination::new(1, 100))
        .await?.data.expect("wishlist");
    assert_eq!(before.items.len(), after.items.len());

    Ok(())
}

fn draft(method: PaymentMethod) -> CheckoutDraft {
    CheckoutDraft {
        shipping: ShippingDetails {
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            email: None,
            address_line1: "12 MG Road".into(),
            address_line2: None,
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
        },
        payment_method: Some(method),
        card: None,
        notes: Some("Leave at the door".into()),
    }
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run flow tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = orm_from_pool(pool.clone());
    run_migrations(&orm).await?;

    let config = AppConfig {
        database_url,
        ..AppConfig::for_tests()
    };
    Ok(Some(AppState::new(pool, config)?))
}

async fn create_product(state: &AppState, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    ProductActive {
        id: Set(id),
        name: Set("Test Widget".into()),
        slug: Set(format!("test-widget-{}", id.simple())),
        description: Set(Some("A product for testing".into())),
        price: Set(price),
        mrp: Set(None),
        stock: Set(stock),
        brand_id: Set(None),
        category_id: Set(None),
        image_url: Set(None),
        gallery: Set(json!([])),
        attributes: Set(json!({})),
        is_b2b: Set(false),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} missing"))?;
    Ok(product.stock)
}

async fn set_stock(state: &AppState, id: Uuid, stock: i32) -> anyhow::Result<()> {
    let backend = state.orm.get_database_backend();
    state
        .orm
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE products SET stock = $1 WHERE id = $2",
            [stock.into(), id.into()],
        ))
        .await?;
    Ok(())
}
