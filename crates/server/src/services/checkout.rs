//! Checkout: turn a customer's cart into an order.
//!
//! Everything happens in one transaction. Product rows are locked in
//! product-ID order before stock is checked, so two checkouts competing for
//! the last units serialize instead of both succeeding.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use live_mart_core::{CustomerId, ProductId, line_total};

use crate::db::RepositoryError;
use crate::db::orders::{self, LockedCartLine};
use crate::models::{OrderItem, OrderWithItems, ShippingDetails};

/// Errors that abort a checkout. Nothing is persisted when one is returned.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock { name: String, available: i32 },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A validated purchase line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// The order a cart will become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Decimal,
}

/// Check stock for every locked line and price the order.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for no lines, or
/// `CheckoutError::InsufficientStock` naming the first product (in lock
/// order) whose stock cannot cover its quantity.
pub fn plan_checkout(lines: &[LockedCartLine]) -> Result<CheckoutPlan, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut planned = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for line in lines {
        if line.stock < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                name: line.name.clone(),
                available: line.stock,
            });
        }
        total += line_total(line.price, line.quantity);
        planned.push(PlannedLine {
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.price,
        });
    }

    Ok(CheckoutPlan {
        lines: planned,
        total,
    })
}

/// Place an order from the customer's cart.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if there is no cart or it has no
/// lines, `CheckoutError::InsufficientStock` if any line exceeds stock, and
/// `CheckoutError::Repository` for database failures. The transaction is
/// rolled back on every error.
#[tracing::instrument(skip(pool, shipping), fields(customer_id = %customer_id))]
pub async fn checkout(
    pool: &PgPool,
    customer_id: CustomerId,
    shipping: &ShippingDetails,
) -> Result<OrderWithItems, CheckoutError> {
    let mut tx = pool.begin().await?;

    let cart_id = orders::cart_for_customer(&mut tx, customer_id)
        .await?
        .ok_or(CheckoutError::EmptyCart)?;
    let locked = orders::lock_cart_lines(&mut tx, cart_id).await?;
    let plan = plan_checkout(&locked)?;

    let order = orders::insert_order(&mut tx, customer_id, shipping, plan.total).await?;

    let mut items = Vec::with_capacity(plan.lines.len());
    for line in plan.lines {
        let id = orders::insert_order_item(
            &mut tx,
            order.id,
            line.product_id,
            line.quantity,
            line.unit_price,
        )
        .await?;
        orders::decrement_stock(&mut tx, line.product_id, line.quantity).await?;

        items.push(OrderItem {
            id,
            order_id: order.id,
            product_id: line.product_id,
            product_name: line.name,
            quantity: line.quantity,
            price_at_purchase: line.unit_price,
        });
    }

    orders::clear_cart(&mut tx, cart_id).await?;
    orders::increment_purchases(&mut tx, customer_id).await?;

    tx.commit().await?;

    tracing::info!(order_id = %order.id, total = %order.total_price, lines = items.len(), "order placed");
    Ok(OrderWithItems { order, items })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use live_mart_core::CartItemId;

    use super::*;

    fn locked(product: i32, name: &str, price: &str, quantity: i32, stock: i32) -> LockedCartLine {
        LockedCartLine {
            cart_item_id: CartItemId::new(product * 10),
            product_id: ProductId::new(product),
            quantity,
            name: name.to_string(),
            price: price.parse().unwrap(),
            stock,
        }
    }

    #[test]
    fn test_plan_sums_line_totals() {
        let plan = plan_checkout(&[
            locked(1, "Smart Mouse", "19.99", 2, 5),
            locked(2, "Coffee Beans", "7.50", 3, 3),
        ])
        .unwrap();

        assert_eq!(plan.total, "62.48".parse().unwrap());
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[1].unit_price, "7.50".parse().unwrap());
    }

    #[test]
    fn test_plan_rejects_empty_cart() {
        assert!(matches!(plan_checkout(&[]), Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_plan_names_first_short_product() {
        let err = plan_checkout(&[
            locked(1, "Keyboard", "30.00", 1, 10),
            locked(2, "Backpack", "45.00", 4, 1),
            locked(3, "Headphones", "80.00", 9, 0),
        ])
        .unwrap_err();

        assert_eq!(err.to_string(), "Insufficient stock for Backpack. Available: 1");
    }

    #[test]
    fn test_plan_allows_exact_stock() {
        let plan = plan_checkout(&[locked(7, "Water Bottle", "12.00", 4, 4)]).unwrap();
        assert_eq!(plan.total, "48.00".parse().unwrap());
    }
}
