use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;

use crate::config::SmsConfig;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sms vendor rejected message: {status}")]
    Rejected { status: u16 },

    #[error("sms vendor timed out")]
    Timeout,
}

#[async_trait::async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver `message` to an E.164 phone number.
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError>;
}

#[derive(Serialize)]
struct SendSmsBody<'a> {
    sender: &'a str,
    to: &'a str,
    message: &'a str,
}

/// Generic JSON-over-HTTP SMS vendor: `POST {api_url}` with an `x-api-key` header.
pub struct HttpSmsSender {
    http: reqwest::Client,
    config: SmsConfig,
    timeout: Duration,
}

impl HttpSmsSender {
    pub fn new(http: reqwest::Client, config: SmsConfig, timeout: Duration) -> Self {
        Self {
            http,
            config,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError> {
        let request = self
            .http
            .post(&self.config.api_url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .json(&SendSmsBody {
                sender: &self.config.sender_id,
                to: phone,
                message,
            })
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| SmsError::Timeout)??;

        if !response.status().is_success() {
            return Err(SmsError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Fallback when no vendor is configured: the message goes to the log.
pub struct LogSmsSender;

#[async_trait::async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SmsError> {
        tracing::info!(phone = %phone, message = %message, "sms (not sent, no provider configured)");
        Ok(())
    }
}
