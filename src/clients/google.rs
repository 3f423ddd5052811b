use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("provider timed out")]
    Timeout,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleConfig,
    timeout: Duration,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, config: GoogleConfig, timeout: Duration) -> Self {
        Self {
            http,
            config,
            timeout,
        }
    }

    pub fn authorize_url(&self, state: &str) -> Result<String, url::ParseError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )?;
        Ok(url.into())
    }

    /// Exchange an authorization code and fetch the signed-in profile.
    pub async fn fetch_profile(&self, code: &str) -> Result<GoogleProfile, OAuthError> {
        tokio::time::timeout(self.timeout, self.exchange_and_fetch(code))
            .await
            .map_err(|_| OAuthError::Timeout)?
    }

    async fn exchange_and_fetch(&self, code: &str) -> Result<GoogleProfile, OAuthError> {
        let token = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        if !token.status().is_success() {
            return Err(OAuthError::Rejected(format!(
                "token exchange failed with {}",
                token.status()
            )));
        }
        let token: TokenResponse = token.json().await?;

        let profile = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        if !profile.status().is_success() {
            return Err(OAuthError::Rejected(format!(
                "userinfo failed with {}",
                profile.status()
            )));
        }
        Ok(profile.json().await?)
    }
}
