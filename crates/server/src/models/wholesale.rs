//! Wholesale orders and the retailer-facing bulk market.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use live_mart_core::{RetailerId, WholesaleOrderId, WholesaleStatus, WholesalerId};

/// A retailer's bulk order addressed to a wholesaler.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WholesaleOrder {
    pub id: WholesaleOrderId,
    pub retailer_id: RetailerId,
    pub wholesaler_id: WholesalerId,
    pub order_date: DateTime<Utc>,
    pub status: WholesaleStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub delivery_address: String,
}

/// A bulk listing in the wholesale market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketItem {
    pub id: i32,
    pub name: &'static str,
    pub price: u32,
    pub min_qty: i32,
    pub supplier: &'static str,
}

/// Bulk listings offered to retailers. The market is not backed by the
/// database; placing an order only acknowledges it.
pub const WHOLESALE_MARKET: [MarketItem; 4] = [
    MarketItem {
        id: 901,
        name: "Bulk Rice (50kg)",
        price: 2500,
        min_qty: 10,
        supplier: "Global Grains",
    },
    MarketItem {
        id: 902,
        name: "Cotton T-Shirts (Pack of 100)",
        price: 15000,
        min_qty: 1,
        supplier: "Textile Hub",
    },
    MarketItem {
        id: 903,
        name: "Smartphone Batch (10 units)",
        price: 120_000,
        min_qty: 1,
        supplier: "Tech Wholesalers",
    },
    MarketItem {
        id: 904,
        name: "Cooking Oil (20L)",
        price: 3000,
        min_qty: 5,
        supplier: "Pure Oils Ltd",
    },
];

/// Find a market listing by ID.
#[must_use]
pub fn market_item(id: i32) -> Option<&'static MarketItem> {
    WHOLESALE_MARKET.iter().find(|item| item.id == id)
}

/// Query string of `POST /retailer/wholesale-order`.
#[derive(Debug, Clone, Deserialize)]
pub struct WholesaleOrderRequest {
    pub item_id: i32,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_lookup() {
        let rice = market_item(901);
        assert!(rice.is_some_and(|item| item.min_qty == 10));
        assert!(market_item(999).is_none());
    }

    #[test]
    fn test_market_ids_unique() {
        let mut ids: Vec<i32> = WHOLESALE_MARKET.iter().map(|item| item.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), WHOLESALE_MARKET.len());
    }
}
