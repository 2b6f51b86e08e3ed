//! Customer order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use live_mart_core::{
    CustomerId, OrderId, OrderItemId, OrderStatus, PaymentMode, PaymentStatus, ProductId,
};

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_pincode: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
}

/// One purchased line, priced as it was at checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_at_purchase: Decimal,
}

/// An order with its lines, as returned to customers.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// `POST /order/checkout` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub shipping_city: String,
    #[serde(default)]
    pub shipping_pincode: String,
    /// `"Online"` or `"Offline"`, case-insensitive.
    pub payment_mode: String,
}

impl CheckoutRequest {
    /// Whether every shipping field has non-whitespace content.
    #[must_use]
    pub fn has_complete_address(&self) -> bool {
        [
            &self.shipping_address,
            &self.shipping_city,
            &self.shipping_pincode,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Shipping and payment details for a validated checkout.
#[derive(Debug, Clone)]
pub struct ShippingDetails {
    pub address: String,
    pub city: String,
    pub pincode: String,
    pub payment_mode: PaymentMode,
}

/// `PUT .../orders/{id}/status` body, shared by retailer and wholesaler routes.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// One row of a retailer's sales history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerHistoryEntry {
    pub order_id: OrderId,
    pub date: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
}
