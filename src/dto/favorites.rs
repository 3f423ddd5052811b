use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WishlistRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product: Product,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistView {
    pub items: Vec<WishlistEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistToggle {
    pub product_id: Uuid,
    pub in_wishlist: bool,
}
