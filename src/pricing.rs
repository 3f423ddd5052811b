//! Cart arithmetic. All amounts are `i64` minor units (paise).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricingPolicy {
    /// Orders whose subtotal is strictly above this ship free.
    pub free_shipping_threshold: i64,
    pub shipping_fee: i64,
    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: 50_000,
            shipping_fee: 4_900,
            tax_rate_bps: 1_800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("line quantity must be positive")]
    InvalidQuantity,
    #[error("line price must not be negative")]
    NegativePrice,
    #[error("amount overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartTotals {
    pub item_count: i64,
    pub subtotal: i64,
    pub shipping: i64,
    pub tax: i64,
    pub total: i64,
    pub free_shipping: bool,
    /// How much more must be added before shipping becomes free.
    pub amount_to_free_shipping: i64,
}

impl CartTotals {
    pub fn compute(lines: &[CartLine], policy: &PricingPolicy) -> Result<Self, PricingError> {
        let mut subtotal: i64 = 0;
        let mut item_count: i64 = 0;
        for line in lines {
            if line.quantity <= 0 {
                return Err(PricingError::InvalidQuantity);
            }
            if line.unit_price < 0 {
                return Err(PricingError::NegativePrice);
            }
            let amount = line
                .unit_price
                .checked_mul(i64::from(line.quantity))
                .ok_or(PricingError::Overflow)?;
            subtotal = subtotal.checked_add(amount).ok_or(PricingError::Overflow)?;
            item_count += i64::from(line.quantity);
        }

        let free_shipping = lines.is_empty() || subtotal > policy.free_shipping_threshold;
        let shipping = if free_shipping { 0 } else { policy.shipping_fee };
        let tax = tax_on(subtotal, policy.tax_rate_bps)?;
        let total = subtotal
            .checked_add(shipping)
            .and_then(|t| t.checked_add(tax))
            .ok_or(PricingError::Overflow)?;
        let amount_to_free_shipping = if free_shipping {
            0
        } else {
            policy.free_shipping_threshold - subtotal + 1
        };

        Ok(Self {
            item_count,
            subtotal,
            shipping,
            tax,
            total,
            free_shipping,
            amount_to_free_shipping,
        })
    }
}

/// Tax rounded half-up to the nearest minor unit.
pub fn tax_on(amount: i64, rate_bps: i64) -> Result<i64, PricingError> {
    amount
        .checked_mul(rate_bps)
        .and_then(|v| v.checked_add(5_000))
        .map(|v| v / 10_000)
        .ok_or(PricingError::Overflow)
}

/// Whole-percent discount of `price` against `mrp`, rounded down.
pub fn discount_percent(price: i64, mrp: Option<i64>) -> Option<i32> {
    let mrp = mrp?;
    if price <= 0 || mrp <= price {
        return None;
    }
    let percent = (i128::from(mrp) - i128::from(price)) * 100 / i128::from(mrp);
    i32::try_from(percent).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockFlags {
    pub in_stock: bool,
    pub low_stock: bool,
}

impl StockFlags {
    pub fn from_stock(stock: i32, low_threshold: i32) -> Self {
        Self {
            in_stock: stock > 0,
            low_stock: stock > 0 && stock <= low_threshold,
        }
    }
}
