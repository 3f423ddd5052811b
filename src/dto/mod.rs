pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod enquiries;
pub mod favorites;
pub mod media;
pub mod orders;
pub mod otp;
pub mod payments;
pub mod products;
