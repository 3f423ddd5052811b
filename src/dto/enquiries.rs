use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{EnquiryStatus, PriceEnquiry};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateEnquiryRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub name: String,
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    pub phone: String,
    #[validate(length(max = 160, message = "must be at most 160 characters"))]
    pub company: Option<String>,
    #[validate(range(min = 1, max = 1000000, message = "must be between 1 and 1000000"))]
    pub quantity: i32,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateEnquiryRequest {
    pub status: Option<EnquiryStatus>,
    /// Minor units per unit quantity.
    pub quoted_price: Option<i64>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnquiryList {
    pub items: Vec<PriceEnquiry>,
}
