use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendOtpResponse {
    /// Masked destination, e.g. `+91******3210`.
    pub phone: String,
    pub expires_in: i64,
    pub resend_after: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyOtpResponse {
    pub verified: bool,
    pub phone: String,
    /// Whether the caller's profile phone is now marked verified.
    pub profile_updated: bool,
}
