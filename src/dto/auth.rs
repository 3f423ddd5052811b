use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::User;

#[derive(Deserialize, Debug, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "must be between 8 and 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: User,
}

#[derive(Deserialize, Debug, Default, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub full_name: Option<String>,
    /// Empty string clears the number.
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Payload of the signed `state` parameter sent through the OAuth redirect.
#[derive(Debug, Deserialize, Serialize)]
pub struct OAuthStateClaims {
    pub purpose: String,
    pub nonce: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorizeUrl {
    pub url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}
