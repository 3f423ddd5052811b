use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{OrderStatus, Role, User};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema, sqlx::FromRow)]
pub struct DashboardStats {
    pub products: i64,
    pub active_products: i64,
    pub low_stock: i64,
    pub users: i64,
    pub orders: i64,
    pub pending_orders: i64,
    pub new_enquiries: i64,
    /// Sum of paid order totals, minor units.
    pub revenue: i64,
}
