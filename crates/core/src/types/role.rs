//! Account roles.
//!
//! Customers, retailers, and wholesalers live in separate tables but share
//! the same credential and verification columns, so most account plumbing
//! is written once and parameterized by [`Role`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a path segment or claim does not name a role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct RoleParseError(pub String);

/// The three kinds of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Retailer,
    Wholesaler,
}

impl Role {
    /// Lookup order used when a caller does not say which role an email
    /// belongs to.
    pub const LOOKUP_ORDER: [Self; 3] = [Self::Customer, Self::Retailer, Self::Wholesaler];

    /// Lowercase name used in URLs and token claims.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Retailer => "retailer",
            Self::Wholesaler => "wholesaler",
        }
    }

    /// Table holding accounts of this role.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Retailer => "retailers",
            Self::Wholesaler => "wholesalers",
        }
    }

    /// Frontend page a freshly authenticated account lands on.
    #[must_use]
    pub const fn landing_page(self) -> &'static str {
        match self {
            Self::Customer => "Customer.html",
            Self::Retailer => "Retailer.html",
            Self::Wholesaler => "Wholesaler.html",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "retailer" => Ok(Self::Retailer),
            "wholesaler" => Ok(Self::Wholesaler),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert_eq!("Retailer".parse::<Role>().unwrap(), Role::Retailer);
        assert_eq!(" WHOLESALER ".parse::<Role>().unwrap(), Role::Wholesaler);
        assert_eq!(
            "admin".parse::<Role>(),
            Err(RoleParseError("admin".to_owned()))
        );
    }

    #[test]
    fn test_tables_and_pages() {
        assert_eq!(Role::Customer.table(), "customers");
        assert_eq!(Role::Wholesaler.table(), "wholesalers");
        assert_eq!(Role::Retailer.landing_page(), "Retailer.html");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Retailer).unwrap(), "\"retailer\"");
        let role: Role = serde_json::from_str("\"wholesaler\"").unwrap();
        assert_eq!(role, Role::Wholesaler);
    }

    #[test]
    fn test_lookup_order_starts_with_customer() {
        assert_eq!(Role::LOOKUP_ORDER[0], Role::Customer);
        assert_eq!(Role::LOOKUP_ORDER.len(), 3);
    }
}
