use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::products::default_true,
    models::{Attribute, Banner, Brand, Category, CategoryNode, Product},
};

#[derive(Serialize, ToSchema)]
pub struct BrandList {
    pub items: Vec<Brand>,
}

#[derive(Serialize, ToSchema)]
pub struct BrandDetail {
    pub brand: Brand,
    pub products: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryTree {
    pub items: Vec<CategoryNode>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryDetail {
    pub category: Category,
    pub children: Vec<Category>,
    /// Active products of this category and every subcategory below it.
    pub products: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct BannerList {
    pub items: Vec<Banner>,
}

#[derive(Serialize, ToSchema)]
pub struct AttributeList {
    pub items: Vec<Attribute>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct BrandInput {
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 120, message = "must be between 1 and 120 characters"))]
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct BannerInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    pub subtitle: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub image_url: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AttributeInput {
    #[validate(length(min = 1, max = 80, message = "must be between 1 and 80 characters"))]
    pub name: String,
    pub slug: Option<String>,
    /// Empty means any value is accepted.
    #[serde(default)]
    pub allowed_values: Vec<String>,
}
