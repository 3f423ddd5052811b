pub mod attributes;
pub mod audit_logs;
pub mod banners;
pub mod brands;
pub mod cart_items;
pub mod categories;
pub mod favorites;
pub mod order_items;
pub mod orders;
pub mod phone_otps;
pub mod price_enquiries;
pub mod products;
pub mod users;

pub use attributes::Entity as Attributes;
pub use audit_logs::Entity as AuditLogs;
pub use banners::Entity as Banners;
pub use brands::Entity as Brands;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use favorites::Entity as Favorites;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use phone_otps::Entity as PhoneOtps;
pub use price_enquiries::Entity as PriceEnquiries;
pub use products::Entity as Products;
pub use users::Entity as Users;
