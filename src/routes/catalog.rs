use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        catalog::{AttributeList, BannerList, BrandDetail, BrandList, CategoryDetail, CategoryList, CategoryTree},
        products::{ProductDetail, ProductList},
    },
    error::AppResult,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::{catalog_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{key}", get(get_product))
        .route("/brands", get(list_brands))
        .route("/brands/{key}", get(get_brand))
        .route("/categories", get(list_categories))
        .route("/categories/tree", get(category_tree))
        .route("/categories/{key}", get(get_category))
        .route("/banners", get(list_banners))
        .route("/attributes", get(list_attributes))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Active products", body = ApiResponse<ProductList>)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{key}",
    params(("key" = String, Path, description = "Product id or slug")),
    responses(
        (status = 200, description = "Product with related products", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state, &key).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses((status = 200, description = "Active brands", body = ApiResponse<BrandList>)),
    tag = "Catalog"
)]
pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BrandList>>> {
    Ok(Json(catalog_service::list_brands(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/brands/{key}",
    params(("key" = String, Path, description = "Brand id or slug")),
    responses(
        (status = 200, description = "Brand with its products", body = ApiResponse<BrandDetail>),
        (status = 404, description = "Brand not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<BrandDetail>>> {
    Ok(Json(catalog_service::get_brand(&state, &key).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active categories, flat", body = ApiResponse<CategoryList>)),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(catalog_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/tree",
    responses((status = 200, description = "Active categories nested by parent", body = ApiResponse<CategoryTree>)),
    tag = "Catalog"
)]
pub async fn category_tree(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryTree>>> {
    Ok(Json(catalog_service::category_tree(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/{key}",
    params(("key" = String, Path, description = "Category id or slug")),
    responses(
        (status = 200, description = "Category, its children and products", body = ApiResponse<CategoryDetail>),
        (status = 404, description = "Category not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<CategoryDetail>>> {
    Ok(Json(catalog_service::get_category(&state, &key).await?))
}

#[utoipa::path(
    get,
    path = "/api/banners",
    responses((status = 200, description = "Active banners by position", body = ApiResponse<BannerList>)),
    tag = "Catalog"
)]
pub async fn list_banners(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BannerList>>> {
    Ok(Json(catalog_service::list_banners(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/attributes",
    responses((status = 200, description = "Product attribute definitions", body = ApiResponse<AttributeList>)),
    tag = "Catalog"
)]
pub async fn list_attributes(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<AttributeList>>> {
    Ok(Json(catalog_service::list_attributes(&state).await?))
}
