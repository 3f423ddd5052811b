use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    clients::razorpay::{GatewayError, GatewayOrder, GatewayOrderRequest},
    dto::payments::{CreateGatewayOrderRequest, GatewayErrorBody},
    services::order_service::CURRENCY,
    state::AppState,
};

const MAX_RECEIPT_LEN: usize = 40;

/// Errors of the gateway proxy, rendered as `{ "error": "..." }`.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),

    #[error("payment gateway timed out")]
    Timeout,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<GatewayError> for ProxyError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout => ProxyError::Timeout,
            other => ProxyError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status != StatusCode::BAD_REQUEST {
            tracing::warn!(error = %self, "gateway proxy failed");
        }
        (
            status,
            Json(GatewayErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub async fn create_gateway_order(
    state: &AppState,
    payload: CreateGatewayOrderRequest,
) -> Result<GatewayOrder, ProxyError> {
    let request = parse_request(payload)?;
    let order = state.gateway.create_order(&request).await?;
    tracing::info!(
        gateway_order_id = %order.id,
        amount = order.amount,
        demo = state.gateway.is_demo(),
        "gateway order created"
    );
    Ok(order)
}

pub fn parse_request(payload: CreateGatewayOrderRequest) -> Result<GatewayOrderRequest, ProxyError> {
    let amount = parse_amount(&payload.amount)?;

    let currency = match payload.currency.as_deref().map(str::trim) {
        None | Some("") => CURRENCY.to_string(),
        Some(code) if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()) => {
            code.to_ascii_uppercase()
        }
        Some(_) => {
            return Err(ProxyError::BadRequest(
                "currency must be a 3-letter code".into(),
            ));
        }
    };

    let receipt = match payload.receipt.map(|r| r.trim().to_string()) {
        Some(receipt) if receipt.chars().count() > MAX_RECEIPT_LEN => {
            return Err(ProxyError::BadRequest(format!(
                "receipt must be at most {MAX_RECEIPT_LEN} characters"
            )));
        }
        Some(receipt) if !receipt.is_empty() => receipt,
        _ => format!("rcpt_{}", &Uuid::new_v4().simple().to_string()[..12]),
    };

    Ok(GatewayOrderRequest {
        amount,
        currency,
        receipt,
    })
}

fn parse_amount(value: &Value) -> Result<i64, ProxyError> {
    let amount = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match amount {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(ProxyError::BadRequest(
            "amount must be a positive integer in minor units".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(value: Value) -> CreateGatewayOrderRequest {
        serde_json::from_value(value).expect("request")
    }

    #[test]
    fn defaults_currency_and_receipt() {
        let parsed = parse_request(request(json!({ "amount": 49900 }))).expect("valid");
        assert_eq!(parsed.amount, 49900);
        assert_eq!(parsed.currency, "INR");
        assert!(parsed.receipt.starts_with("rcpt_"));
        assert_eq!(parsed.receipt.len(), 17);
    }

    #[test]
    fn accepts_numeric_strings_and_lowercase_currency() {
        let parsed = parse_request(request(json!({
            "amount": "1500",
            "currency": "usd",
            "receipt": "order-7"
        })))
        .expect("valid");
        assert_eq!(parsed.amount, 1500);
        assert_eq!(parsed.currency, "USD");
        assert_eq!(parsed.receipt, "order-7");
    }

    #[test]
    fn rejects_bad_amounts() {
        for amount in [json!(0), json!(-5), json!(12.5), json!("abc"), json!(null)] {
            let err = parse_request(request(json!({ "amount": amount }))).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn rejects_bad_currency_and_long_receipt() {
        assert!(parse_request(request(json!({ "amount": 1, "currency": "RUPEE" }))).is_err());
        let receipt = "r".repeat(41);
        assert!(parse_request(request(json!({ "amount": 1, "receipt": receipt }))).is_err());
    }

    #[test]
    fn timeouts_map_to_504() {
        assert_eq!(ProxyError::from(GatewayError::Timeout).status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
