use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::json;
use storefront_api::{
    checkout::{CheckoutDraft, PaymentMethod, ShippingDetails},
    clients::{
        razorpay::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway},
        sms::{SmsError, SmsSender},
    },
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    dto::{
        admin::{InventoryAdjustRequest, UpdateRoleRequest},
        auth::RegisterRequest,
        cart::{AddToCartRequest, UpdateCartItemRequest},
        catalog::BrandInput,
        enquiries::{CreateEnquiryRequest, UpdateEnquiryRequest},
        otp::{SendOtpRequest, VerifyOtpRequest},
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        phone_otps::ActiveModel as OtpActive,
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{EnquiryStatus, Role},
    services::{
        admin_service, auth_service, cart_service, catalog_service, enquiry_service,
        order_service, otp_service, product_service,
    },
    state::AppState,
};
use uuid::Uuid;

/// Keeps every message instead of sending it.
#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().ok()?;
        sent.last().map(|(_, message)| message.chars().take(6).collect())
    }

    fn count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((phone.to_string(), message.to_string()));
        }
        Ok(())
    }
}

/// Rejects every order it is asked to create.
struct FailingGateway;

#[async_trait::async_trait]
impl PaymentGateway for FailingGateway {
    fn key_id(&self) -> &str {
        "rzp_failing"
    }

    async fn create_order(&self, _req: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        Err(GatewayError::Api {
            status: 502,
            message: "bad gateway".into(),
        })
    }

    fn verify_signature(&self, _order_id: &str, _payment_id: &str, _signature: &str) -> bool {
        false
    }
}

#[tokio::test]
async fn otp_resend_window_attempt_cap_and_profile_verification() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let sms = Arc::new(RecordingSms::default());
    let state = state.with_sms(sms.clone());

    let local = random_phone();
    let phone = format!("+91{local}");
    let user = register(&state, Some(local.clone())).await?;

    otp_service::send_otp(&state, SendOtpRequest { phone: local.clone() }).await?;
    assert_eq!(sms.count(), 1);
    let resend = otp_service::send_otp(&state, SendOtpRequest { phone: local.clone() }).await;
    assert!(matches!(resend, Err(AppError::RateLimited(_))));
    assert_eq!(sms.count(), 1);

    let code = sms.last_code().expect("code was sent");
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let bad = otp_service::verify_otp(
        &state,
        Some(&user),
        VerifyOtpRequest {
            phone: local.clone(),
            code: wrong.into(),
        },
    )
    .await;
    match bad {
        Err(AppError::Validation(errors)) => assert!(errors.contains("code")),
        other => panic!("expected code validation error, got {other:?}"),
    }

    let verified = otp_service::verify_otp(
        &state,
        Some(&user),
        VerifyOtpRequest {
            phone: local.clone(),
            code,
        },
    )
    .await?
    .data
    .expect("verified");
    assert!(verified.verified);
    assert!(verified.profile_updated);
    assert_eq!(verified.phone, phone);

    let me = auth_service::me(&state, &user).await?.data.expect("profile");
    assert!(me.phone_verified);

    // A consumed code cannot be used twice.
    let replay = otp_service::verify_otp(
        &state,
        None,
        VerifyOtpRequest {
            phone: local,
            code: "123456".into(),
        },
    )
    .await;
    assert!(matches!(replay, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn otp_locks_after_five_wrong_codes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let sms = Arc::new(RecordingSms::default());
    let state = state.with_sms(sms.clone());
    let local = random_phone();

    otp_service::send_otp(&state, SendOtpRequest { phone: local.clone() }).await?;
    let code = sms.last_code().expect("code was sent");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..otp_service::MAX_ATTEMPTS {
        let attempt = otp_service::verify_otp(
            &state,
            None,
            VerifyOtpRequest {
                phone: local.clone(),
                code: wrong.into(),
            },
        )
        .await;
        assert!(matches!(attempt, Err(AppError::Validation(_))));
    }

    // Even the right code is refused once the attempts are used up.
    let locked = otp_service::verify_otp(
        &state,
        None,
        VerifyOtpRequest {
            phone: local,
            code,
        },
    )
    .await;
    assert!(matches!(locked, Err(AppError::RateLimited(_))));

    Ok(())
}

#[tokio::test]
async fn otp_expired_code_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let local = random_phone();
    let phone = format!("+91{local}");
    let now = Utc::now();

    OtpActive {
        id: Set(Uuid::new_v4()),
        phone: Set(phone.clone()),
        code_hash: Set(otp_service::hash_code(&phone, "424242")),
        attempts: Set(0),
        expires_at: Set((now - Duration::seconds(1)).into()),
        consumed_at: Set(None),
        created_at: Set((now - Duration::seconds(otp_service::CODE_TTL_SECS + 1)).into()),
    }
    .insert(&state.orm)
    .await?;

    let expired = otp_service::verify_otp(
        &state,
        None,
        VerifyOtpRequest {
            phone: local,
            code: "424242".into(),
        },
    )
    .await;
    assert!(matches!(expired, Err(AppError::BadRequest(_))));

    Ok(())
}

#[tokio::test]
async fn cart_quantities_respect_stock_and_quotation_products() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = register(&state, None).await?;
    let product_id = create_product(&state, 2_500, 3, false).await?;
    let quotation_id = create_product(&state, 0, 100, true).await?;

    let b2b = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: quotation_id,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(b2b, Err(AppError::BadRequest(_))));

    let too_many =
        cart_service::add_to_cart(&state, &user, AddToCartRequest { product_id, quantity: 4 }).await;
    match too_many {
        Err(AppError::Validation(errors)) => assert!(errors.contains("quantity")),
        other => panic!("expected quantity validation error, got {other:?}"),
    }

    cart_service::add_to_cart(&state, &user, AddToCartRequest { product_id, quantity: 2 }).await?;
    // Adding on top of the existing line counts the whole line against stock.
    let over = cart_service::add_to_cart(&state, &user, AddToCartRequest { product_id, quantity: 2 })
        .await;
    assert!(matches!(over, Err(AppError::Validation(_))));

    let raised = cart_service::update_quantity(
        &state,
        &user,
        product_id,
        UpdateCartItemRequest { quantity: 5 },
    )
    .await;
    assert!(matches!(raised, Err(AppError::Validation(_))));

    let cart = cart_service::update_quantity(
        &state,
        &user,
        product_id,
        UpdateCartItemRequest { quantity: 3 },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.totals.subtotal, 7_500);

    let cart = cart_service::update_quantity(
        &state,
        &user,
        product_id,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await?
    .data
    .expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.totals.total, 0);

    Ok(())
}

#[tokio::test]
async fn admin_roles_inventory_and_payment_reconciliation() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    };

    let demote_self = admin_service::update_user_role(
        &state,
        &admin,
        admin.user_id,
        UpdateRoleRequest { role: Role::User },
    )
    .await;
    assert!(matches!(demote_self, Err(AppError::BadRequest(_))));

    let staff = register(&state, None).await?;
    let promoted = admin_service::update_user_role(
        &state,
        &admin,
        staff.user_id,
        UpdateRoleRequest { role: Role::Admin },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(promoted.role, "admin");

    let shopper = register(&state, None).await?;

    let product_id = create_product(&state, 10_000, 3, false).await?;
    let below_zero = admin_service::adjust_inventory(
        &state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: -4 },
    )
    .await;
    assert!(matches!(below_zero, Err(AppError::BadRequest(_))));
    let zero = admin_service::adjust_inventory(
        &state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: 0 },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));
    let restocked = admin_service::adjust_inventory(
        &state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: 7 },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(restocked.stock, 10);

    cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id, quantity: 1 })
        .await?;
    let placed = order_service::checkout(&state, &shopper, draft(PaymentMethod::Cod))
        .await?
        .data
        .expect("checkout");
    assert_eq!(placed.order.payment_status, "cod");

    let paid = admin_service::mark_payment_received(&state, &admin, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(paid.order.payment_status, "paid");
    assert_eq!(paid.order.status, "paid");
    let twice = admin_service::mark_payment_received(&state, &admin, placed.order.id).await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn derived_slugs_get_numbered_suffixes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    };
    let name = format!("Acme Tools {}", Uuid::new_v4().simple());
    let brand = |slug: Option<String>| BrandInput {
        name: name.clone(),
        slug,
        description: None,
        logo_url: None,
        is_active: true,
    };

    let first = catalog_service::create_brand(&state, &admin, brand(None))
        .await?
        .data
        .expect("brand");
    let second = catalog_service::create_brand(&state, &admin, brand(None))
        .await?
        .data
        .expect("brand");
    assert_eq!(second.slug, format!("{}-2", first.slug));

    // An explicit slug that is taken is a conflict, not a rename.
    let taken = catalog_service::create_brand(&state, &admin, brand(Some(first.slug.clone()))).await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn enquiries_are_for_quotation_products_and_survive_product_delete() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: "admin".into(),
    };
    let retail_id = create_product(&state, 4_000, 10, false).await?;
    let quotation_id = create_product(&state, 0, 500, true).await?;

    let retail = enquiry_service::create_enquiry(&state, None, enquiry(retail_id)).await;
    assert!(matches!(retail, Err(AppError::BadRequest(_))));

    let created = enquiry_service::create_enquiry(&state, None, enquiry(quotation_id))
        .await?
        .data
        .expect("enquiry");
    assert_eq!(created.status, "new");
    assert_eq!(created.phone, "+919876543210");

    let unpriced = enquiry_service::admin_update_enquiry(
        &state,
        &admin,
        created.id,
        UpdateEnquiryRequest {
            status: Some(EnquiryStatus::Quoted),
            ..Default::default()
        },
    )
    .await;
    match unpriced {
        Err(AppError::Validation(errors)) => assert!(errors.contains("quoted_price")),
        other => panic!("expected quoted_price validation error, got {other:?}"),
    }

    let quoted = enquiry_service::admin_update_enquiry(
        &state,
        &admin,
        created.id,
        UpdateEnquiryRequest {
            status: Some(EnquiryStatus::Quoted),
            quoted_price: Some(12_500),
            admin_notes: Some("Bulk rate".into()),
        },
    )
    .await?
    .data
    .expect("enquiry");
    assert_eq!(quoted.status, "quoted");
    assert_eq!(quoted.quoted_price, Some(12_500));

    let backwards = enquiry_service::admin_update_enquiry(
        &state,
        &admin,
        created.id,
        UpdateEnquiryRequest {
            status: Some(EnquiryStatus::New),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(backwards, Err(AppError::Conflict(_))));

    // The enquired product is archived so the enquiry keeps its product.
    let deleted = product_service::delete_product(&state, &admin, quotation_id)
        .await?
        .data
        .expect("delete result");
    assert_eq!(deleted["archived"], json!(true));
    let archived = Products::find_by_id(quotation_id)
        .one(&state.orm)
        .await?
        .expect("product kept");
    assert!(!archived.is_active);
    let kept = enquiry_service::admin_get_enquiry(&state, &admin, created.id)
        .await?
        .data
        .expect("enquiry");
    assert_eq!(kept.product_id, quotation_id);

    // Nothing references the retail product, so it goes away.
    let deleted = product_service::delete_product(&state, &admin, retail_id)
        .await?
        .data
        .expect("delete result");
    assert_eq!(deleted["archived"], json!(false));
    assert!(Products::find_by_id(retail_id).one(&state.orm).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn gateway_failure_leaves_cart_and_stock_untouched() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let state = state.with_gateway(Arc::new(FailingGateway));
    let shopper = register(&state, None).await?;
    let product_id = create_product(&state, 8_000, 5, false).await?;

    cart_service::add_to_cart(&state, &shopper, AddToCartRequest { product_id, quantity: 2 })
        .await?;
    let failed = order_service::checkout(&state, &shopper, draft(PaymentMethod::Gateway)).await;
    assert!(matches!(failed, Err(AppError::Upstream(_))));

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product");
    assert_eq!(product.stock, 5);
    let cart = cart_service::list_cart(&state, &shopper).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(shopper.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);

    Ok(())
}

fn random_phone() -> String {
    format!("9{:09}", rand::random_range(0..1_000_000_000u32))
}

fn enquiry(product_id: Uuid) -> CreateEnquiryRequest {
    CreateEnquiryRequest {
        product_id,
        name: "Ravi Kumar".into(),
        email: "Ravi@Example.com".into(),
        phone: "98765 43210".into(),
        company: Some("Kumar Traders".into()),
        quantity: 250,
        message: Some("Need a quote for a site order".into()),
    }
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
        notes: None,
    }
}

async fn register(state: &AppState, phone: Option<String>) -> anyhow::Result<AuthUser> {
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            email: format!("rules-{}@example.com", Uuid::new_v4().simple()),
            password: "correct-horse".into(),
            full_name: None,
            phone,
        },
    )
    .await?
    .data
    .expect("login response")
    .user;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
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

async fn create_product(state: &AppState, price: i64, stock: i32, is_b2b: bool) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    ProductActive {
        id: Set(id),
        name: Set("Rules Widget".into()),
        slug: Set(format!("rules-widget-{}", id.simple())),
        description: Set(None),
        price: Set(price),
        mrp: Set(None),
        stock: Set(stock),
        brand_id: Set(None),
        category_id: Set(None),
        image_url: Set(None),
        gallery: Set(json!([])),
        attributes: Set(json!({})),
        is_b2b: Set(is_b2b),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}
