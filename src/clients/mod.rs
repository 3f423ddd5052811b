//! Outbound HTTP integrations: payment gateway, SMS vendor, Google OAuth.
//!
//! Each integration has a fallback used when its credentials are absent, so
//! the storefront keeps working in development without any vendor accounts.

pub mod google;
pub mod razorpay;
pub mod sms;
