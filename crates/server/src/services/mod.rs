//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Signup and password login for all three roles
//! - `token` - HS256 bearer tokens
//! - `otp` - One-time codes for verification and password reset
//! - `email` - Code delivery over SMTP
//! - `google` - Google sign-in
//! - `catalog` - Product search filters and the category cache
//! - `cart` - Cart quantity rules
//! - `checkout` - Cart to order transaction
//! - `uploads` - Image storage

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod google;
pub mod otp;
pub mod token;
pub mod uploads;
