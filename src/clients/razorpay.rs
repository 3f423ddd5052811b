//! Payment gateway client.
//!
//! - Base URL: `https://api.razorpay.com`
//! - Authentication: HTTP basic auth with key id / key secret
//! - Checkout signature: hex HMAC-SHA256 of `"{order_id}|{payment_id}"`

use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::RazorpayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Signature the demo gateway accepts for any payment.
pub const DEMO_SIGNATURE: &str = "demo";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("gateway request timed out")]
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Order object as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrder {
    pub id: String,
    #[serde(default = "default_entity")]
    pub entity: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub created_at: i64,
}

fn default_entity() -> String {
    "order".to_string()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    description: Option<String>,
    code: Option<String>,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the checkout widget.
    fn key_id(&self) -> &str;

    fn is_demo(&self) -> bool {
        false
    }

    async fn create_order(&self, req: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError>;

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

pub struct RazorpayClient {
    http: reqwest::Client,
    config: RazorpayConfig,
    timeout: Duration,
}

impl RazorpayClient {
    pub fn new(http: reqwest::Client, config: RazorpayConfig, timeout: Duration) -> Self {
        Self {
            http,
            config,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for RazorpayClient {
    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    async fn create_order(&self, req: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.api_base.trim_end_matches('/'));
        let call = async {
            let response = self
                .http
                .post(&url)
                .basic_auth(
                    &self.config.key_id,
                    Some(self.config.key_secret.expose_secret()),
                )
                .json(req)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = match response.json::<ErrorEnvelope>().await {
                    Ok(env) => env
                        .error
                        .description
                        .or(env.error.code)
                        .unwrap_or_else(|| status.to_string()),
                    Err(_) => status.to_string(),
                };
                return Err(GatewayError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            Ok(response.json::<GatewayOrder>().await?)
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| GatewayError::Timeout)?
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(
            self.config.key_secret.expose_secret(),
            order_id,
            payment_id,
            signature,
        )
    }
}

/// Stand-in used when no gateway credentials are configured.
pub struct DemoGateway;

#[async_trait::async_trait]
impl PaymentGateway for DemoGateway {
    fn key_id(&self) -> &str {
        "rzp_demo"
    }

    fn is_demo(&self) -> bool {
        true
    }

    async fn create_order(&self, req: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        tracing::warn!(amount = req.amount, receipt = %req.receipt, "demo gateway order created");
        Ok(GatewayOrder {
            id: format!("order_demo_{}", Uuid::new_v4().simple()),
            entity: default_entity(),
            amount: req.amount,
            amount_paid: 0,
            amount_due: req.amount,
            currency: req.currency.clone(),
            receipt: Some(req.receipt.clone()),
            status: "created".to_string(),
            attempts: 0,
            created_at: chrono::Utc::now().timestamp(),
        })
    }

    fn verify_signature(&self, _order_id: &str, _payment_id: &str, signature: &str) -> bool {
        signature == DEMO_SIGNATURE
    }
}

/// Compute the checkout signature for an order/payment pair.
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a checkout signature.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trips_with_same_secret() {
        let sig = sign("secret", "order_1", "pay_1").expect("signature");
        assert!(verify_signature("secret", "order_1", "pay_1", &sig));
    }

    #[test]
    fn signature_rejects_other_secret_or_payment() {
        let sig = sign("secret", "order_1", "pay_1").expect("signature");
        assert!(!verify_signature("other", "order_1", "pay_1", &sig));
        assert!(!verify_signature("secret", "order_1", "pay_2", &sig));
    }

    #[test]
    fn signature_rejects_non_hex() {
        assert!(!verify_signature("secret", "order_1", "pay_1", "not-hex"));
    }

    #[tokio::test]
    async fn demo_gateway_creates_demo_orders() {
        let order = DemoGateway
            .create_order(&GatewayOrderRequest {
                amount: 1000,
                currency: "INR".into(),
                receipt: "rcpt_1".into(),
            })
            .await
            .expect("demo order");
        assert!(order.id.starts_with("order_demo_"));
        assert_eq!(order.amount_due, 1000);
        assert!(DemoGateway.verify_signature(&order.id, "pay_x", DEMO_SIGNATURE));
        assert!(!DemoGateway.verify_signature(&order.id, "pay_x", "forged"));
    }
}
