//! Shopping cart types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use live_mart_core::{CartId, CartItemId, ProductId};

/// A stored cart line, returned by `POST /cart/add`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub cart_id: CartId,
}

/// A cart line joined with its product, as shown on the cart page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i32,
    pub image_url: Option<String>,
    pub stock: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

/// `GET /cart` response.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    /// Sum of quantities across all lines.
    pub total_size: i64,
}

impl CartView {
    #[must_use]
    pub fn new(items: Vec<CartLine>) -> Self {
        let total_size = items.iter().map(|line| i64::from(line.quantity)).sum();
        Self { items, total_size }
    }
}

/// `POST /cart/add` body. Negative quantities decrement an existing line.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: i32,
}
