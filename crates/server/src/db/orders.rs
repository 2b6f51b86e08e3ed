//! Order repository and the statements used inside the checkout transaction.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use live_mart_core::{
    CartId, CartItemId, CustomerId, OrderId, OrderStatus, ProductId, RetailerId,
};

use super::RepositoryError;
use crate::models::{CustomerHistoryEntry, Order, OrderItem, OrderWithItems, ShippingDetails};

const ORDER_COLUMNS: &str = "id, customer_id, order_date, status, shipping_address, \
     shipping_city, shipping_pincode, total_price, payment_mode, payment_status";

/// Repository for reading and updating orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 \
             ORDER BY order_date DESC, id DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.price_at_purchase
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(attach_items(orders, items))
    }

    /// Distinct orders containing at least one of the retailer's products,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_retailer(&self, retailer_id: RetailerId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o \
             WHERE EXISTS ( \
                 SELECT 1 FROM order_items oi JOIN products p ON p.id = oi.product_id \
                 WHERE oi.order_id = o.id AND p.retailer_id = $1) \
             ORDER BY o.order_date DESC, o.id DESC"
        );
        let rows = sqlx::query_as::<_, Order>(&sql)
            .bind(retailer_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Whether the order contains any of the retailer's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn retailer_sold_in(
        &self,
        retailer_id: RetailerId,
        order_id: OrderId,
    ) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM order_items oi
                JOIN products p ON p.id = oi.product_id
                WHERE oi.order_id = $1 AND p.retailer_id = $2
            )
            ",
        )
        .bind(order_id)
        .bind(retailer_id)
        .fetch_one(self.pool)
        .await?;
        Ok(found)
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let sql = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// One row per (order, line) for lines selling this retailer's products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_history(
        &self,
        retailer_id: RetailerId,
    ) -> Result<Vec<CustomerHistoryEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerHistoryEntry>(
            r"
            SELECT o.id AS order_id, o.order_date AS date,
                   c.name AS customer_name, c.mail AS customer_email,
                   p.name AS product_name, oi.quantity,
                   oi.price_at_purchase * oi.quantity AS total_paid
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            JOIN products p ON p.id = oi.product_id
            JOIN customers c ON c.id = o.customer_id
            WHERE p.retailer_id = $1
            ORDER BY o.order_date DESC, o.id DESC, oi.id
            ",
        )
        .bind(retailer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// Group lines under their order headers, preserving header order.
fn attach_items(orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<OrderWithItems> {
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect()
}

// =============================================================================
// Checkout transaction statements
// =============================================================================

/// A cart line read under a row lock on its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedCartLine {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

/// Find the customer's cart without creating one, and lock it for the rest
/// of the transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn cart_for_customer(
    conn: &mut PgConnection,
    customer_id: CustomerId,
) -> Result<Option<CartId>, RepositoryError> {
    let id =
        sqlx::query_scalar::<_, CartId>("SELECT id FROM carts WHERE customer_id = $1 FOR UPDATE")
            .bind(customer_id)
            .fetch_optional(conn)
            .await?;
    Ok(id)
}

/// Read the cart's lines and lock their product rows in product-ID order.
///
/// Locking in a fixed order keeps concurrent checkouts that share products
/// from deadlocking.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_cart_lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<LockedCartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, LockedCartLine>(
        r"
        SELECT ci.id AS cart_item_id, ci.product_id, ci.quantity, p.name, p.price, p.stock
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.product_id
        FOR UPDATE
        ",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Insert an order header with `Pending` order and payment status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    shipping: &ShippingDetails,
    total: Decimal,
) -> Result<Order, RepositoryError> {
    let sql = format!(
        "INSERT INTO orders (customer_id, shipping_address, shipping_city, shipping_pincode, \
         total_price, payment_mode) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(customer_id)
        .bind(shipping.address.trim())
        .bind(shipping.city.trim())
        .bind(shipping.pincode.trim())
        .bind(total)
        .bind(shipping.payment_mode)
        .fetch_one(conn)
        .await?;
    Ok(order)
}

/// Insert one order line and return its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price_at_purchase: Decimal,
) -> Result<live_mart_core::OrderItemId, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price_at_purchase)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Subtract sold quantity from a locked product.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails (including the
/// `stock >= 0` check constraint).
pub async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1")
        .bind(product_id)
        .bind(quantity)
        .execute(conn)
        .await?;
    Ok(())
}

/// Empty a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Count one more completed purchase for the customer.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn increment_purchases(
    conn: &mut PgConnection,
    customer_id: CustomerId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE customers SET no_of_purchases = no_of_purchases + 1 WHERE id = $1")
        .bind(customer_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use live_mart_core::{OrderItemId, PaymentMode, PaymentStatus};

    use super::*;

    fn order(id: i32) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: CustomerId::new(1),
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            shipping_address: "1 Elm St".to_string(),
            shipping_city: "Dallas".to_string(),
            shipping_pincode: "75001".to_string(),
            total_price: Decimal::ZERO,
            payment_mode: PaymentMode::Online,
            payment_status: PaymentStatus::Pending,
        }
    }

    fn item(id: i32, order_id: i32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(order_id),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            quantity: 1,
            price_at_purchase: Decimal::ONE,
        }
    }

    #[test]
    fn test_attach_items_groups_by_order() {
        let grouped = attach_items(
            vec![order(2), order(1), order(3)],
            vec![item(10, 1), item(11, 2), item(12, 1)],
        );

        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].order.id, OrderId::new(2));
        assert_eq!(grouped[0].items.len(), 1);
        assert_eq!(grouped[1].items.len(), 2);
        assert_eq!(grouped[1].items[0].id, OrderItemId::new(10));
        assert!(grouped[2].items.is_empty());
    }
}
