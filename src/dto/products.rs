use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Product;

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    /// Up to four other products from the same category.
    pub related: Vec<Product>,
}

/// Create and full-replace payload for admin product writes.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    /// Derived from the name when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    /// Minor units, at most 10^12.
    #[validate(range(min = 0i64, max = 1_000_000_000_000i64, message = "must be between 0 and 1000000000000"))]
    pub price: i64,
    #[validate(range(min = 0i64, max = 1_000_000_000_000i64, message = "must be between 0 and 1000000000000"))]
    pub mrp: Option<i64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    #[serde(default)]
    pub stock: i32,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    /// Attribute slug to value.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub is_b2b: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(price: i64, mrp: Option<i64>) -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": "Drill",
            "price": price,
            "mrp": mrp,
        }))
        .expect("input")
    }

    #[test]
    fn prices_are_bounded() {
        assert!(input(549_900, Some(649_900)).validate().is_ok());
        let err = input(100, Some(100_000_000_000_000_000)).validate().unwrap_err();
        assert!(err.field_errors().contains_key("mrp"));
        let err = input(-1, None).validate().unwrap_err();
        assert!(err.field_errors().contains_key("price"));
    }
}
