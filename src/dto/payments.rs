use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/razorpay/create-order`. Fields are loosely typed so that
/// malformed input is reported with the proxy's own error envelope.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateGatewayOrderRequest {
    /// Positive integer amount in minor units; numeric strings are accepted.
    #[schema(value_type = i64)]
    pub amount: serde_json::Value,
    pub currency: Option<String>,
    pub receipt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GatewayErrorBody {
    pub error: String,
}
