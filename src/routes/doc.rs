use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    checkout::{CardDetails, CheckoutDraft, PaymentMethod, ShippingDetails},
    dto::{
        admin::DashboardStats,
        cart::CartView,
        orders::{CheckoutResponse, OrderList, OrderWithItems},
        payments::GatewayErrorBody,
        products::{ProductDetail, ProductList},
    },
    media::{AssetKind, AssetSpec, ResizePlan},
    models::{
        Attribute, Banner, Brand, Category, CategoryNode, EnquiryStatus, Order, OrderItem,
        OrderStatus, PaymentStatus, PriceEnquiry, Product, Role, User,
    },
    pricing::CartTotals,
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, catalog, enquiries, health, media, orders, otp, params, payments, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_me,
        auth::google_authorize,
        auth::google_callback,
        otp::send_otp,
        otp::verify_otp,
        catalog::list_products,
        catalog::get_product,
        catalog::list_brands,
        catalog::get_brand,
        catalog::list_categories,
        catalog::category_tree,
        catalog::get_category,
        catalog::list_banners,
        catalog::list_attributes,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::toggle_wishlist,
        wishlist::remove_from_wishlist,
        orders::validate_step,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::verify_payment,
        orders::cancel_order,
        payments::create_order,
        enquiries::create_enquiry,
        enquiries::list_my_enquiries,
        media::list_specs,
        media::plan_resize,
        media::upload,
        media::delete_media,
        admin::dashboard,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_brands,
        admin::create_brand,
        admin::update_brand,
        admin::delete_brand,
        admin::list_categories,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::list_banners,
        admin::create_banner,
        admin::update_banner,
        admin::delete_banner,
        admin::create_attribute,
        admin::update_attribute,
        admin::delete_attribute,
        admin::list_users,
        admin::update_user_role,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::mark_payment_received,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_enquiries,
        admin::get_enquiry,
        admin::update_enquiry
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            Brand,
            Category,
            CategoryNode,
            Banner,
            Attribute,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            PriceEnquiry,
            EnquiryStatus,
            CartTotals,
            CartView,
            CheckoutDraft,
            ShippingDetails,
            CardDetails,
            PaymentMethod,
            CheckoutResponse,
            OrderList,
            OrderWithItems,
            ProductList,
            ProductDetail,
            DashboardStats,
            GatewayErrorBody,
            AssetKind,
            AssetSpec,
            ResizePlan,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Accounts, sessions and Google sign-in"),
        (name = "OTP", description = "Phone verification codes"),
        (name = "Catalog", description = "Storefront browsing"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Checkout", description = "Checkout wizard and order placement"),
        (name = "Orders", description = "Own orders and payment confirmation"),
        (name = "Payments", description = "Payment gateway proxy"),
        (name = "Enquiries", description = "B2B price enquiries"),
        (name = "Media", description = "Image limits and uploads"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
