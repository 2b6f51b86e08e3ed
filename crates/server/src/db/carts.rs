//! Cart repository.

use sqlx::{PgConnection, PgPool};

use live_mart_core::{CartId, CartItemId, CustomerId, ProductId};

use super::RepositoryError;
use crate::models::{CartItem, CartLine};

/// Repository for customer carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the customer's cart, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, customer_id: CustomerId) -> Result<CartId, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO carts (customer_id) VALUES ($1)
            ON CONFLICT (customer_id) DO UPDATE SET customer_id = EXCLUDED.customer_id
            RETURNING id
            ",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Cart lines joined with product details, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.product_id, p.name, p.price, ci.quantity, p.image_url, p.stock,
                   p.price * ci.quantity AS line_total
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// Lock the cart row for the rest of the transaction.
///
/// Cart edits and checkout both take this lock first, so changes to one
/// cart apply one at a time.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Find the line for a product in a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
) -> Result<Option<CartItem>, RepositoryError> {
    let row = sqlx::query_as::<_, CartItem>(
        "SELECT id, product_id, quantity, cart_id FROM cart_items WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Set a line's quantity, inserting the line if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_quantity(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartItem, RepositoryError> {
    let row = sqlx::query_as::<_, CartItem>(
        r"
        INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        RETURNING id, product_id, quantity, cart_id
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Remove a line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn remove_item(conn: &mut PgConnection, id: CartItemId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
