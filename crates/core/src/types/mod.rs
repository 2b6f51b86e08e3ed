//! Core types for Live MART.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MoneyError, line_total, parse_amount};
pub use role::{Role, RoleParseError};
pub use status::*;
