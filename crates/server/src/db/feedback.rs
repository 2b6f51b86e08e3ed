//! Product feedback repository.

use sqlx::PgPool;

use live_mart_core::{CustomerId, ProductId};

use super::{RepositoryError, map_constraint};
use crate::models::Feedback;

/// Repository for product reviews.
pub struct FeedbackRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FeedbackRepository<'a> {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews for a product with the reviewer's name, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Feedback>, RepositoryError> {
        let rows = sqlx::query_as::<_, Feedback>(
            r"
            SELECT f.id, f.product_id, f.customer_id, f.rating, f.comment, f.created_at,
                   c.name AS customer_name
            FROM feedback f
            JOIN customers c ON c.id = f.customer_id
            WHERE f.product_id = $1
            ORDER BY f.created_at DESC, f.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Record a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product was deleted
    /// concurrently.
    pub async fn create(
        &self,
        product_id: ProductId,
        customer_id: CustomerId,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Feedback, RepositoryError> {
        sqlx::query_as::<_, Feedback>(
            r"
            WITH inserted AS (
                INSERT INTO feedback (product_id, customer_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                RETURNING id, product_id, customer_id, rating, comment, created_at
            )
            SELECT i.id, i.product_id, i.customer_id, i.rating, i.comment, i.created_at,
                   c.name AS customer_name
            FROM inserted i
            JOIN customers c ON c.id = i.customer_id
            ",
        )
        .bind(product_id)
        .bind(customer_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "product no longer exists"))
    }
}
