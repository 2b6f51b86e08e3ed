//! Product repository, including the catalog search query.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use live_mart_core::{CategoryId, ProductId, RetailerId};

use super::{RepositoryError, map_constraint};
use crate::models::{NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str =
    "id, name, price, stock, description, category_id, retailer_id, image_url";

/// Result ordering for catalog searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    PriceLow,
    PriceHigh,
    /// Highest ID first.
    #[default]
    Newest,
}

impl ProductSort {
    /// Parse the `sort_by` query value. Unknown values fall back to newest.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price_low") => Self::PriceLow,
            Some("price_high") => Self::PriceHigh,
            _ => Self::Newest,
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::PriceLow => " ORDER BY price ASC, id DESC",
            Self::PriceHigh => " ORDER BY price DESC, id DESC",
            Self::Newest => " ORDER BY id DESC",
        }
    }
}

/// Resolved catalog search criteria. Every field is optional; bounds are
/// inclusive.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or description.
    pub text: Option<String>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Build the search statement.
    #[must_use]
    pub fn build_query(&self) -> QueryBuilder<'_, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(text) = &self.text {
            let pattern = format!("%{}%", escape_like(text));
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(min) = self.min_price {
            qb.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = self.max_price {
            qb.push(" AND price <= ").push_bind(max);
        }

        qb.push(self.sort.order_by());
        qb
    }
}

/// Escape `LIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Repository for products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run a catalog search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = filter
            .build_query()
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Products listed by one retailer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_retailer(&self, retailer_id: RetailerId) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE retailer_id = $1 ORDER BY id DESC"
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(retailer_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Insert a product with the given image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `category_id` does not exist.
    pub async fn create(
        &self,
        new: &NewProduct,
        image_url: &str,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products (name, price, stock, description, category_id, retailer_id, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&new.name)
            .bind(new.price)
            .bind(new.stock)
            .bind(&new.description)
            .bind(new.category_id)
            .bind(new.retailer_id)
            .bind(image_url)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_constraint(e, "unknown category"))
    }

    /// Replace a product's image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    pub async fn set_image(&self, id: ProductId, image_url: &str) -> Result<Product, RepositoryError> {
        let sql = format!("UPDATE products SET image_url = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(image_url)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update. Absent fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    /// Returns `RepositoryError::Conflict` if `category_id` does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "UPDATE products SET \
                name = COALESCE($2, name), \
                price = COALESCE($3, price), \
                stock = COALESCE($4, stock), \
                description = COALESCE($5, description), \
                category_id = COALESCE($6, category_id), \
                image_url = COALESCE($7, image_url) \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.price)
            .bind(update.stock)
            .bind(&update.description)
            .bind(update.category_id)
            .bind(&update.image_url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_constraint(e, "unknown category"))?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if orders reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint(e, "product has order history"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_param() {
        assert_eq!(ProductSort::from_param(Some("price_low")), ProductSort::PriceLow);
        assert_eq!(ProductSort::from_param(Some("price_high")), ProductSort::PriceHigh);
        assert_eq!(ProductSort::from_param(Some("newest")), ProductSort::Newest);
        assert_eq!(ProductSort::from_param(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_param(None), ProductSort::Newest);
    }

    #[test]
    fn test_build_query_no_filters() {
        let filter = ProductFilter::default();
        let qb = filter.build_query();
        assert_eq!(
            qb.sql(),
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE ORDER BY id DESC")
        );
    }

    #[test]
    fn test_build_query_all_filters() {
        let filter = ProductFilter {
            text: Some("mouse".to_string()),
            category_id: Some(CategoryId::new(2)),
            min_price: Some("5".parse().unwrap()),
            max_price: Some("50".parse().unwrap()),
            sort: ProductSort::PriceHigh,
        };
        let qb = filter.build_query();
        let sql = qb.sql();

        assert!(sql.contains("(name ILIKE $1 OR description ILIKE $2)"));
        assert!(sql.contains("AND category_id = $3"));
        assert!(sql.contains("AND price >= $4"));
        assert!(sql.contains("AND price <= $5"));
        assert!(sql.ends_with("ORDER BY price DESC, id DESC"));
    }

    #[test]
    fn test_build_query_price_only_numbers_placeholders_from_one() {
        let filter = ProductFilter {
            max_price: Some("10".parse().unwrap()),
            sort: ProductSort::PriceLow,
            ..ProductFilter::default()
        };
        let qb = filter.build_query();
        assert!(qb.sql().contains("AND price <= $1 ORDER BY price ASC"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
