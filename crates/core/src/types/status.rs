//! Status enums for orders, payments, and wholesale orders.
//!
//! All statuses are stored as `TEXT` columns holding the variant name
//! (`"Pending"`, `"Shipped"`, ...) and travel over JSON the same way.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string does not name a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct StatusParseError {
    /// Which status family was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Generates `as_str`, `Display`, `FromStr`, and optional sqlx `TEXT`
/// encoding for a fieldless status enum.
macro_rules! text_status {
    ($name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl $name {
            /// Every variant, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored and serialized name of this status.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| StatusParseError {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(s.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

/// Lifecycle of a customer order.
///
/// Retailers may move an order to any status; there is no enforced
/// transition graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

text_status!(
    OrderStatus,
    "order status",
    [Pending, Processing, Shipped, Delivered, Cancelled]
);

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMode {
    Online,
    Offline,
}

text_status!(PaymentMode, "payment mode", [Online, Offline]);

/// Payment settlement state. New orders always start as `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

text_status!(PaymentStatus, "payment status", [Pending, Completed, Failed]);

/// State of a retailer's bulk order with a wholesaler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WholesaleStatus {
    #[default]
    Pending,
    Approved,
    Shipped,
}

text_status!(WholesaleStatus, "wholesale status", [Pending, Approved, Shipped]);

impl WholesaleStatus {
    /// Whether goods in this state count toward the retailer's stock.
    ///
    /// The first move into such a state credits the order's quantities;
    /// later moves never credit again.
    #[must_use]
    pub const fn releases_stock(self) -> bool {
        matches!(self, Self::Approved | Self::Shipped)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" ONLINE ".parse::<PaymentMode>().unwrap(), PaymentMode::Online);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "Lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "order status");
        assert_eq!(err.value, "Lost");
        assert!("Cash".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&PaymentStatus::Completed).unwrap();
        assert_eq!(json, "\"Completed\"");
        let mode: PaymentMode = serde_json::from_str("\"Offline\"").unwrap();
        assert_eq!(mode, PaymentMode::Offline);
    }

    #[test]
    fn test_wholesale_releases_stock() {
        assert!(!WholesaleStatus::Pending.releases_stock());
        assert!(WholesaleStatus::Approved.releases_stock());
        assert!(WholesaleStatus::Shipped.releases_stock());
    }
}
