use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use storefront_api::{
    config::AppConfig, dto::auth::Claims, routes, state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

// None of these requests reach the database; the pool is connected lazily.
fn app() -> Router {
    let state = AppState::lazy(AppConfig::for_tests()).expect("state");
    routes::app(state)
}

fn token(role: &str) -> String {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-jwt-secret"),
    )
    .expect("token")
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (status, body) = send(Request::get("/api/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/nope");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .expect("response");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn cart_requires_a_bearer_token() {
    let (status, body) = send(Request::get("/api/cart").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["error"], "Unauthorized");

    let (status, _) = send(
        Request::get("/api/cart")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_shoppers() {
    let (status, _) = send(
        Request::get("/api/admin/media/plan?kind=product_image&width=3200&height=1600")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("user")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_gets_a_resize_plan() {
    let (status, body) = send(
        Request::get("/api/admin/media/plan?kind=product_image&width=3200&height=1600")
            .header(header::AUTHORIZATION, format!("Bearer {}", token("admin")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["target"], json!({ "width": 1600, "height": 800 }));
    assert_eq!(body["data"]["thumbnail"], json!({ "width": 400, "height": 200 }));
    assert_eq!(body["data"]["needs_resize"], true);
}

#[tokio::test]
async fn media_specs_list_every_bucket() {
    let (status, body) = send(Request::get("/api/media/specs").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let buckets: Vec<&str> = body["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|spec| spec["bucket"].as_str())
        .collect();
    assert_eq!(
        buckets,
        ["brand-logos", "category-images", "product-images", "banners"]
    );
}

#[tokio::test]
async fn demo_gateway_creates_orders() {
    let (status, body) = send(post_json(
        "/api/razorpay/create-order",
        json!({ "amount": "49900", "currency": "inr" }),
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].as_str().unwrap_or_default().starts_with("order_demo_"));
    assert_eq!(body["amount"], 49900);
    assert_eq!(body["currency"], "INR");
    assert!(body["receipt"].as_str().unwrap_or_default().starts_with("rcpt_"));
}

#[tokio::test]
async fn gateway_proxy_rejects_bad_amounts() {
    for amount in [json!(0), json!(-5), json!("12.5"), json!(null)] {
        let (status, body) = send(post_json(
            "/api/razorpay/create-order",
            json!({ "amount": amount }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn gateway_proxy_reports_malformed_json_as_error_body() {
    let request = Request::post("/api/razorpay/create-order")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn checkout_step_one_needs_shipping_details() {
    let (status, body) = send(post_json("/api/checkout/validate", json!({ "step": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert!(body["data"]["next_step"].is_null());
    let errors = body["data"]["errors"].as_object().expect("errors");
    for field in ["shipping.full_name", "shipping.phone", "shipping.postal_code"] {
        assert!(errors.contains_key(field), "missing {field}");
    }
}

#[tokio::test]
async fn checkout_step_one_advances_when_complete() {
    let draft = json!({
        "shipping": {
            "full_name": "Asha Rao",
            "phone": "98765 43210",
            "address_line1": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "postal_code": "560001"
        }
    });
    let (status, body) = send(post_json(
        "/api/checkout/validate",
        json!({ "step": 1, "draft": draft }),
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["next_step"], 2);
}

#[tokio::test]
async fn checkout_rejects_unknown_steps() {
    let (status, _) = send(post_json("/api/checkout/validate", json!({ "step": 4 }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn google_sign_in_reports_missing_configuration() {
    let (status, _) = send(
        Request::get("/api/auth/google/authorize")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
