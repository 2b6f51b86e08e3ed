//! Wholesale order repository.

use sqlx::PgPool;

use live_mart_core::{WholesaleOrderId, WholesaleStatus, WholesalerId};

use super::RepositoryError;
use crate::models::WholesaleOrder;

const WHOLESALE_COLUMNS: &str =
    "id, retailer_id, wholesaler_id, order_date, status, total_price, delivery_address";

/// Outcome of a wholesaler's status change on an existing order.
#[derive(Debug)]
pub enum StatusChange {
    Updated(WholesaleOrder),
    /// The order is addressed to another wholesaler.
    NotOwner,
}

/// Repository for wholesale orders.
pub struct WholesaleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WholesaleRepository<'a> {
    /// Create a new wholesale order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders addressed to a wholesaler, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_wholesaler(
        &self,
        wholesaler_id: WholesalerId,
    ) -> Result<Vec<WholesaleOrder>, RepositoryError> {
        let sql = format!(
            "SELECT {WHOLESALE_COLUMNS} FROM wholesale_orders WHERE wholesaler_id = $1 \
             ORDER BY order_date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, WholesaleOrder>(&sql)
            .bind(wholesaler_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Change an order's status, crediting product stock when the order is
    /// first released.
    ///
    /// The order row is locked for the duration, and the `stock_credited`
    /// flag records the credit, so stock is added at most once per order
    /// even if the status goes back to Pending and is approved again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if a query fails; nothing is
    /// changed in that case.
    pub async fn update_status(
        &self,
        wholesaler_id: WholesalerId,
        id: WholesaleOrderId,
        next: WholesaleStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {WHOLESALE_COLUMNS} FROM wholesale_orders WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, WholesaleOrder>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if current.wholesaler_id != wholesaler_id {
            return Ok(StatusChange::NotOwner);
        }

        // The flag flips at most once per order, whatever path the status takes.
        let first_release = next.releases_stock()
            && sqlx::query_scalar::<_, i32>(
                "UPDATE wholesale_orders SET stock_credited = TRUE \
                 WHERE id = $1 AND NOT stock_credited RETURNING id",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        if first_release {
            let credited = sqlx::query(
                r"
                UPDATE products p
                SET stock = p.stock + items.quantity
                FROM (
                    SELECT product_id, SUM(quantity)::INTEGER AS quantity
                    FROM wholesale_order_items
                    WHERE wholesale_order_id = $1
                    GROUP BY product_id
                ) AS items
                WHERE p.id = items.product_id
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            tracing::info!(order_id = %id, products = credited, "credited wholesale stock");
        }

        let update = format!(
            "UPDATE wholesale_orders SET status = $2 WHERE id = $1 RETURNING {WHOLESALE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, WholesaleOrder>(&update)
            .bind(id)
            .bind(next)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(StatusChange::Updated(updated))
    }
}
