//! Catalog types: categories, products, and product feedback.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use live_mart_core::{CategoryId, CustomerId, FeedbackId, ProductId, RetailerId};

/// Image used when a product is created without one.
pub const DEFAULT_PRODUCT_IMAGE: &str = "product_images/default.png";

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A product listed by a retailer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub retailer_id: RetailerId,
    pub image_url: Option<String>,
}

/// Validated fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub retailer_id: RetailerId,
}

/// `PUT /retailer/products/{id}` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    /// Reject values the table constraints would refuse anyway, with a
    /// message the client can show.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("Product name cannot be empty".to_string());
        }
        if let Some(price) = self.price
            && price.is_sign_negative()
            && !price.is_zero()
        {
            return Err("Price cannot be negative".to_string());
        }
        if let Some(stock) = self.stock
            && stock < 0
        {
            return Err("Stock cannot be negative".to_string());
        }
        Ok(())
    }
}

/// A review with the reviewer's display name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: FeedbackId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
}

/// `POST /products/{id}/feedback` body.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackCreate {
    pub rating: i32,
    pub comment: Option<String>,
}

impl FeedbackCreate {
    pub const MIN_RATING: i32 = 1;
    pub const MAX_RATING: i32 = 5;

    #[must_use]
    pub const fn rating_in_range(&self) -> bool {
        self.rating >= Self::MIN_RATING && self.rating <= Self::MAX_RATING
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_price_serializes_as_number() {
        let product = Product {
            id: ProductId::new(3),
            name: "Smart Mouse".to_string(),
            price: "24.99".parse().unwrap(),
            stock: 10,
            description: None,
            category_id: Some(CategoryId::new(1)),
            retailer_id: RetailerId::new(2),
            image_url: Some(DEFAULT_PRODUCT_IMAGE.to_string()),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], serde_json::json!(24.99));
        assert_eq!(json["category_id"], 1);
    }

    #[test]
    fn test_product_update_partial() {
        let update: ProductUpdate = serde_json::from_str(r#"{"price": 12.5}"#).unwrap();
        assert_eq!(update.price, Some("12.5".parse().unwrap()));
        assert!(update.name.is_none());
        assert!(update.validate().is_ok());

        let empty: ProductUpdate = serde_json::from_str("{}").unwrap();
        assert!(empty.price.is_none());
    }

    #[test]
    fn test_product_update_validation() {
        let update = ProductUpdate {
            stock: Some(-1),
            ..ProductUpdate::default()
        };
        assert_eq!(update.validate().unwrap_err(), "Stock cannot be negative");

        let update = ProductUpdate {
            name: Some("   ".to_string()),
            ..ProductUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_feedback_rating_range() {
        let ok = FeedbackCreate {
            rating: 5,
            comment: None,
        };
        let low = FeedbackCreate {
            rating: 0,
            comment: None,
        };
        let high = FeedbackCreate {
            rating: 6,
            comment: Some("Great product! Highly recommend.".to_string()),
        };
        assert!(ok.rating_in_range());
        assert!(!low.rating_in_range());
        assert!(!high.rating_in_range());
    }
}
