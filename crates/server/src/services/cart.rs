//! Cart operations.

use sqlx::PgPool;
use thiserror::Error;

use live_mart_core::CustomerId;

use crate::db::carts;
use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{AddToCart, CartItem, CartView};

/// Errors from cart updates.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock { name: String, available: i32 },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What an add-to-cart request does to the stored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Store the line with this quantity.
    Set(i32),
    /// Drop the existing line.
    Remove,
}

/// Merge a requested quantity change into an existing line.
///
/// `delta` is added to the current quantity; a negative delta decrements.
/// A result of zero or less removes an existing line. A new line must
/// start with a positive quantity.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` when a new line would not be
/// positive, and `CartError::InsufficientStock` when the result exceeds
/// `stock`.
pub fn plan_quantity(
    current: Option<i32>,
    delta: i32,
    stock: i32,
    name: &str,
) -> Result<QuantityChange, CartError> {
    let next = match current {
        Some(quantity) => quantity.saturating_add(delta),
        None if delta <= 0 => return Err(CartError::InvalidQuantity),
        None => delta,
    };

    if next <= 0 {
        return Ok(QuantityChange::Remove);
    }
    if next > stock {
        return Err(CartError::InsufficientStock {
            name: name.to_owned(),
            available: stock,
        });
    }
    Ok(QuantityChange::Set(next))
}

/// The customer's cart, created on first access.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn view(pool: &PgPool, customer_id: CustomerId) -> Result<CartView, RepositoryError> {
    let carts = CartRepository::new(pool);
    let cart_id = carts.get_or_create(customer_id).await?;
    let lines = carts.lines(cart_id).await?;
    Ok(CartView::new(lines))
}

/// Apply an add-to-cart request. Returns `None` when the line was removed.
///
/// The merge runs under the cart's row lock, so concurrent adds to one
/// cart each see the previous result.
///
/// # Errors
///
/// See [`plan_quantity`]; also `CartError::ProductNotFound` for an unknown
/// product.
#[tracing::instrument(skip(pool), fields(customer_id = %customer_id))]
pub async fn add(
    pool: &PgPool,
    customer_id: CustomerId,
    request: &AddToCart,
) -> Result<Option<CartItem>, CartError> {
    let product = ProductRepository::new(pool)
        .get(request.product_id)
        .await?
        .ok_or(CartError::ProductNotFound)?;

    let cart_id = CartRepository::new(pool).get_or_create(customer_id).await?;

    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;
    carts::lock_cart(&mut tx, cart_id).await?;
    let existing = carts::find_item(&mut tx, cart_id, product.id).await?;

    let change = plan_quantity(
        existing.as_ref().map(|item| item.quantity),
        request.quantity,
        product.stock,
        &product.name,
    )?;

    let item = match (change, existing) {
        (QuantityChange::Set(quantity), _) => {
            Some(carts::set_quantity(&mut tx, cart_id, product.id, quantity).await?)
        }
        (QuantityChange::Remove, Some(item)) => {
            carts::remove_item(&mut tx, item.id).await?;
            None
        }
        (QuantityChange::Remove, None) => None,
    };

    tx.commit().await.map_err(RepositoryError::from)?;
    Ok(item)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_line_positive() {
        assert_eq!(
            plan_quantity(None, 2, 10, "Mouse").unwrap(),
            QuantityChange::Set(2)
        );
    }

    #[test]
    fn test_new_line_zero_or_negative_rejected() {
        assert!(matches!(
            plan_quantity(None, 0, 10, "Mouse"),
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            plan_quantity(None, -1, 10, "Mouse"),
            Err(CartError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_existing_line_merges() {
        assert_eq!(
            plan_quantity(Some(3), 2, 10, "Mouse").unwrap(),
            QuantityChange::Set(5)
        );
        assert_eq!(
            plan_quantity(Some(3), -1, 10, "Mouse").unwrap(),
            QuantityChange::Set(2)
        );
    }

    #[test]
    fn test_existing_line_removed_at_zero() {
        assert_eq!(
            plan_quantity(Some(2), -2, 10, "Mouse").unwrap(),
            QuantityChange::Remove
        );
        assert_eq!(
            plan_quantity(Some(2), -5, 10, "Mouse").unwrap(),
            QuantityChange::Remove
        );
    }

    #[test]
    fn test_stock_limit() {
        let err = plan_quantity(Some(4), 3, 6, "Keyboard").unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Keyboard. Available: 6");
        assert_eq!(
            plan_quantity(Some(4), 2, 6, "Keyboard").unwrap(),
            QuantityChange::Set(6)
        );
    }

    #[test]
    fn test_decrement_allowed_when_over_stock() {
        // Stock may have dropped below the cart quantity since it was added
        assert_eq!(
            plan_quantity(Some(5), -5, 1, "Backpack").unwrap(),
            QuantityChange::Remove
        );
    }
}
