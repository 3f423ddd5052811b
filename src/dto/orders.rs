use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    checkout::{CheckoutDraft, CheckoutStep},
    error::FieldErrors,
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateStepRequest {
    #[schema(value_type = u8, minimum = 1, maximum = 3)]
    pub step: CheckoutStep,
    #[serde(default)]
    pub draft: CheckoutDraft,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateStepResponse {
    #[schema(value_type = u8)]
    pub step: CheckoutStep,
    pub valid: bool,
    /// Step the wizard moves to when `valid`; stays on review once there.
    #[schema(value_type = Option<u8>)]
    pub next_step: Option<CheckoutStep>,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// What the client widget needs to open the hosted payment sheet.
#[derive(Debug, Serialize, ToSchema)]
pub struct GatewayCheckout {
    pub gateway_order_id: String,
    pub key_id: String,
    pub amount: i64,
    pub currency: String,
    pub demo: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub gateway: Option<GatewayCheckout>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
