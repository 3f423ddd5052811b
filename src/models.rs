use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    checkout::ShippingDetails,
    entity::{
        attributes::Model as AttributeModel, banners::Model as BannerModel,
        brands::Model as BrandModel,
        categories::Model as CategoryModel, favorites::Model as FavoriteModel,
        order_items::Model as OrderItemModel, orders::Model as OrderModel,
        price_enquiries::Model as EnquiryModel, products::Model as ProductModel,
        users::Model as UserModel,
    },
    media::{public_url, public_url_opt},
    pricing::{StockFlags, discount_percent},
};

/// Settings needed to turn stored rows into display shapes.
#[derive(Debug, Clone, Copy)]
pub struct DisplayContext<'a> {
    pub base_url: &'a str,
    pub low_stock_threshold: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Customers may cancel until the parcel leaves the warehouse.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    /// Collected in cash on delivery.
    Cod,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cod => "cod",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "cod" => Ok(PaymentStatus::Cod),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    New,
    Contacted,
    Quoted,
    Closed,
}

impl EnquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnquiryStatus::New => "new",
            EnquiryStatus::Contacted => "contacted",
            EnquiryStatus::Quoted => "quoted",
            EnquiryStatus::Closed => "closed",
        }
    }

    /// `new -> contacted -> quoted -> closed`; any open enquiry may be closed,
    /// and a status may be kept while other fields change.
    pub fn can_transition_to(&self, next: EnquiryStatus) -> bool {
        use EnquiryStatus::*;
        matches!(
            (self, next),
            (New, New)
                | (New, Contacted)
                | (New, Quoted)
                | (Contacted, Contacted)
                | (Contacted, Quoted)
                | (Quoted, Quoted)
                | (New | Contacted | Quoted, Closed)
        )
    }
}

impl FromStr for EnquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(EnquiryStatus::New),
            "contacted" => Ok(EnquiryStatus::Contacted),
            "quoted" => Ok(EnquiryStatus::Quoted),
            "closed" => Ok(EnquiryStatus::Closed),
            other => Err(format!("unknown enquiry status {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub role: String,
    pub auth_provider: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            phone: model.phone,
            phone_verified: model.phone_verified,
            role: model.role,
            auth_provider: model.auth_provider,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Brand {
    pub fn from_entity(model: BrandModel, ctx: &DisplayContext) -> Self {
        Self {
            id: model.id,
            logo_url: public_url_opt(ctx.base_url, model.logo_url.as_deref()),
            name: model.name,
            slug: model.slug,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn from_entity(model: CategoryModel, ctx: &DisplayContext) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            image_url: public_url_opt(ctx.base_url, model.image_url.as_deref()),
            name: model.name,
            slug: model.slug,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

/// Arrange a flat category list into a forest. Categories whose parent is not
/// in the list become roots. Siblings keep the input order.
pub fn build_category_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    fn attach(parent: Option<Uuid>, pool: &[Category], depth: usize) -> Vec<CategoryNode> {
        if depth > pool.len() {
            return Vec::new();
        }
        pool.iter()
            .filter(|c| c.parent_id == parent)
            .map(|c| CategoryNode {
                category: c.clone(),
                children: attach(Some(c.id), pool, depth + 1),
            })
            .collect()
    }

    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let mut roots = Vec::new();
    for category in categories.iter() {
        let orphan = match category.parent_id {
            None => true,
            Some(parent) => !ids.contains(&parent) || parent == category.id,
        };
        if orphan {
            roots.push(CategoryNode {
                category: category.clone(),
                children: attach(Some(category.id), &categories, 1),
            });
        }
    }
    roots
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub mrp: Option<i64>,
    pub discount_percent: Option<i32>,
    pub stock: i32,
    pub in_stock: bool,
    pub low_stock: bool,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    #[schema(value_type = Object)]
    pub attributes: serde_json::Value,
    pub is_b2b: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(
        model: ProductModel,
        brand: Option<&BrandModel>,
        category: Option<&CategoryModel>,
        ctx: &DisplayContext,
    ) -> Self {
        let flags = StockFlags::from_stock(model.stock, ctx.low_stock_threshold);
        let gallery = model
            .gallery
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|v| public_url(ctx.base_url, v))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: model.id,
            discount_percent: discount_percent(model.price, model.mrp),
            image_url: public_url_opt(ctx.base_url, model.image_url.as_deref()),
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            mrp: model.mrp,
            stock: model.stock,
            in_stock: flags.in_stock,
            low_stock: flags.low_stock,
            brand_id: model.brand_id,
            brand_name: brand.map(|b| b.name.clone()),
            category_id: model.category_id,
            category_name: category.map(|c| c.name.clone()),
            gallery,
            attributes: model.attributes,
            is_b2b: model.is_b2b,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub allowed_values: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AttributeModel> for Attribute {
    fn from(model: AttributeModel) -> Self {
        Self {
            id: model.id,
            allowed_values: json_strings(&model.allowed_values),
            name: model.name,
            slug: model.slug,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

fn json_strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Banner {
    pub fn from_entity(model: BannerModel, ctx: &DisplayContext) -> Self {
        Self {
            id: model.id,
            image_url: public_url(ctx.base_url, &model.image_url),
            title: model.title,
            subtitle: model.subtitle,
            link_url: model.link_url,
            position: model.position,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteModel> for Favorite {
    fn from(model: FavoriteModel) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub tax: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_method: String,
    pub invoice_number: String,
    pub shipping_address: ShippingDetails,
    pub notes: Option<String>,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            subtotal: model.subtotal,
            shipping_fee: model.shipping_fee,
            tax: model.tax,
            total_amount: model.total_amount,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            invoice_number: model.invoice_number,
            shipping_address: serde_json::from_value(model.shipping_address).unwrap_or_default(),
            notes: model.notes,
            gateway_order_id: model.gateway_order_id,
            gateway_payment_id: model.gateway_payment_id,
            card_brand: model.card_brand,
            card_last4: model.card_last4,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub line_total: i64,
    pub created_at: DateTime<Utc>,
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            price: model.price,
            line_total: model.price.saturating_mul(i64::from(model.quantity)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceEnquiry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub quantity: i32,
    pub message: Option<String>,
    pub status: String,
    pub quoted_price: Option<i64>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceEnquiry {
    pub fn from_entity(model: EnquiryModel, product: Option<&ProductModel>) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: product.map(|p| p.name.clone()),
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            company: model.company,
            quantity: model.quantity,
            message: model.message,
            status: model.status,
            quoted_price: model.quoted_price,
            admin_notes: model.admin_notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enquiries_move_forward_or_close() {
        use EnquiryStatus::*;
        assert!(New.can_transition_to(Contacted));
        assert!(Contacted.can_transition_to(Quoted));
        assert!(New.can_transition_to(Quoted));
        for open in [New, Contacted, Quoted] {
            assert!(open.can_transition_to(Closed));
            assert!(open.can_transition_to(open));
        }
    }

    #[test]
    fn enquiries_never_move_backwards_or_reopen() {
        use EnquiryStatus::*;
        assert!(!Contacted.can_transition_to(New));
        assert!(!Quoted.can_transition_to(Contacted));
        assert!(!Quoted.can_transition_to(New));
        for next in [New, Contacted, Quoted, Closed] {
            assert!(!Closed.can_transition_to(next));
        }
    }

    #[test]
    fn enquiry_status_parses_its_own_names() {
        for status in [
            EnquiryStatus::New,
            EnquiryStatus::Contacted,
            EnquiryStatus::Quoted,
            EnquiryStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<EnquiryStatus>(), Ok(status));
        }
        assert!("archived".parse::<EnquiryStatus>().is_err());
    }
}
