use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{DashboardStats, InventoryAdjustRequest, UpdateOrderStatusRequest, UpdateRoleRequest, UserList},
        catalog::{AttributeInput, BannerInput, BannerList, BrandInput, BrandList, CategoryInput, CategoryList},
        enquiries::{EnquiryList, UpdateEnquiryRequest},
        orders::{OrderList, OrderWithItems},
        products::{ProductInput, ProductList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Attribute, Banner, Brand, Category, PriceEnquiry, Product, User},
    response::ApiResponse,
    routes::{
        media,
        params::{EnquiryListQuery, LowStockQuery, OrderListQuery, ProductQuery, UserListQuery},
    },
    services::{admin_service, catalog_service, enquiry_service, product_service},
    state::AppState,
};

type Deleted = Json<ApiResponse<serde_json::Value>>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/brands", get(list_brands).post(create_brand))
        .route("/brands/{id}", put(update_brand).delete(delete_brand))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", put(update_category).delete(delete_category))
        .route("/banners", get(list_banners).post(create_banner))
        .route("/banners/{id}", put(update_banner).delete(delete_banner))
        .route("/attributes", post(create_attribute))
        .route("/attributes/{id}", put(update_attribute).delete(delete_attribute))
        .route("/users", get(list_users))
        .route("/users/{id}/role", patch(update_user_role))
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/payment-received", post(mark_payment_received))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
        .route("/enquiries", get(list_enquiries))
        .route("/enquiries/{id}", get(get_enquiry).patch(update_enquiry))
        .nest("/media", media::admin_router())
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Store-wide counters", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Admins only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    Ok(Json(admin_service::dashboard(&state, &user).await?))
}

// Products

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(ProductQuery),
    responses((status = 200, description = "All products including archived", body = ApiResponse<ProductList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::admin_list_products(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 409, description = "Slug already in use"),
        (status = 422, description = "Invalid fields or attributes"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductInput>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(product_service::create_product(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product replaced", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid fields or attributes"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductInput>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(product_service::update_product(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted, or archived when it has been ordered", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Deleted> {
    Ok(Json(product_service::delete_product(&state, &user, id).await?))
}

// Brands

#[utoipa::path(
    get,
    path = "/api/admin/brands",
    responses((status = 200, description = "All brands", body = ApiResponse<BrandList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_brands(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BrandList>>> {
    Ok(Json(catalog_service::admin_list_brands(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/brands",
    request_body = BrandInput,
    responses(
        (status = 200, description = "Brand created", body = ApiResponse<Brand>),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BrandInput>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    Ok(Json(catalog_service::create_brand(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = BrandInput,
    responses(
        (status = 200, description = "Brand replaced", body = ApiResponse<Brand>),
        (status = 404, description = "Brand not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BrandInput>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    Ok(Json(catalog_service::update_brand(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Brand not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Deleted> {
    Ok(Json(catalog_service::delete_brand(&state, &user, id).await?))
}

// Categories

#[utoipa::path(
    get,
    path = "/api/admin/categories",
    responses((status = 200, description = "All categories", body = ApiResponse<CategoryList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(catalog_service::admin_list_categories(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<Category>),
        (status = 422, description = "Unknown parent"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CategoryInput>,
) -> AppResult<Json<ApiResponse<Category>>> {
    Ok(Json(catalog_service::create_category(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category replaced", body = ApiResponse<Category>),
        (status = 422, description = "Parent is itself, unknown or a descendant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryInput>,
) -> AppResult<Json<ApiResponse<Category>>> {
    Ok(Json(catalog_service::update_category(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Category not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Deleted> {
    Ok(Json(catalog_service::delete_category(&state, &user, id).await?))
}

// Banners

#[utoipa::path(
    get,
    path = "/api/admin/banners",
    responses((status = 200, description = "All banners", body = ApiResponse<BannerList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_banners(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BannerList>>> {
    Ok(Json(catalog_service::admin_list_banners(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/banners",
    request_body = BannerInput,
    responses((status = 200, description = "Banner created", body = ApiResponse<Banner>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_banner(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BannerInput>,
) -> AppResult<Json<ApiResponse<Banner>>> {
    Ok(Json(catalog_service::create_banner(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/banners/{id}",
    params(("id" = Uuid, Path, description = "Banner ID")),
    request_body = BannerInput,
    responses(
        (status = 200, description = "Banner replaced", body = ApiResponse<Banner>),
        (status = 404, description = "Banner not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_banner(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BannerInput>,
) -> AppResult<Json<ApiResponse<Banner>>> {
    Ok(Json(catalog_service::update_banner(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/banners/{id}",
    params(("id" = Uuid, Path, description = "Banner ID")),
    responses(
        (status = 200, description = "Banner deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Banner not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_banner(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Deleted> {
    Ok(Json(catalog_service::delete_banner(&state, &user, id).await?))
}

// Attributes

#[utoipa::path(
    post,
    path = "/api/admin/attributes",
    request_body = AttributeInput,
    responses(
        (status = 200, description = "Attribute created", body = ApiResponse<Attribute>),
        (status = 409, description = "Slug already in use"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_attribute(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AttributeInput>,
) -> AppResult<Json<ApiResponse<Attribute>>> {
    Ok(Json(catalog_service::create_attribute(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/attributes/{id}",
    params(("id" = Uuid, Path, description = "Attribute ID")),
    request_body = AttributeInput,
    responses(
        (status = 200, description = "Attribute replaced", body = ApiResponse<Attribute>),
        (status = 404, description = "Attribute not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_attribute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttributeInput>,
) -> AppResult<Json<ApiResponse<Attribute>>> {
    Ok(Json(catalog_service::update_attribute(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/attributes/{id}",
    params(("id" = Uuid, Path, description = "Attribute ID")),
    responses(
        (status = 200, description = "Attribute deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Attribute not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_attribute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Deleted> {
    Ok(Json(catalog_service::delete_attribute(&state, &user, id).await?))
}

// Users

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery),
    responses((status = 200, description = "Users, newest first", body = ApiResponse<UserList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(admin_service::list_users(&state, &user, query).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<User>),
        (status = 400, description = "Cannot demote yourself"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(admin_service::update_user_role(&state, &user, id, payload).await?))
}

// Orders

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "List all orders (admin)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(admin_service::list_all_orders(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(admin_service::get_order_admin(&state, &user, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is already cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(admin_service::update_order_status(&state, &user, id, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/payment-received",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order marked paid", body = ApiResponse<OrderWithItems>),
        (status = 409, description = "Already paid or cancelled"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn mark_payment_received(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    Ok(Json(admin_service::mark_payment_received(&state, &user, id).await?))
}

// Inventory

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Products at or below the threshold", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(admin_service::list_low_stock(&state, &user, query).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<Product>),
        (status = 400, description = "Stock would go negative"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(admin_service::adjust_inventory(&state, &user, id, payload).await?))
}

// Enquiries

#[utoipa::path(
    get,
    path = "/api/admin/enquiries",
    params(EnquiryListQuery),
    responses((status = 200, description = "Price enquiries, newest first", body = ApiResponse<EnquiryList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_enquiries(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<EnquiryListQuery>,
) -> AppResult<Json<ApiResponse<EnquiryList>>> {
    Ok(Json(enquiry_service::admin_list_enquiries(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/enquiries/{id}",
    params(("id" = Uuid, Path, description = "Enquiry ID")),
    responses(
        (status = 200, description = "Enquiry", body = ApiResponse<PriceEnquiry>),
        (status = 404, description = "Enquiry not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_enquiry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PriceEnquiry>>> {
    Ok(Json(enquiry_service::admin_get_enquiry(&state, &user, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/enquiries/{id}",
    params(("id" = Uuid, Path, description = "Enquiry ID")),
    request_body = UpdateEnquiryRequest,
    responses(
        (status = 200, description = "Enquiry updated", body = ApiResponse<PriceEnquiry>),
        (status = 409, description = "Status change not allowed"),
        (status = 422, description = "Quoting needs a positive price"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_enquiry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEnquiryRequest>,
) -> AppResult<Json<ApiResponse<PriceEnquiry>>> {
    Ok(Json(enquiry_service::admin_update_enquiry(&state, &user, id, payload).await?))
}
