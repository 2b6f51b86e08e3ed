//! Catalog search: query parameters to a [`ProductFilter`], with category
//! names resolved against a cached category list.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use live_mart_core::CategoryId;

use crate::db::products::{ProductFilter, ProductSort};
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::Category;

/// Query string of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    /// `all`, a numeric ID, or a category name.
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
}

impl ProductQuery {
    /// Resolve into a filter.
    ///
    /// # Errors
    ///
    /// Returns the name of the first price bound that is not a number.
    pub fn into_filter(self, categories: &[Category]) -> Result<ProductFilter, &'static str> {
        Ok(ProductFilter {
            text: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            category_id: resolve_category(self.category.as_deref(), categories),
            min_price: parse_bound(self.min_price.as_deref()).map_err(|()| "min_price")?,
            max_price: parse_bound(self.max_price.as_deref()).map_err(|()| "max_price")?,
            sort: ProductSort::from_param(self.sort_by.as_deref()),
        })
    }
}

fn parse_bound(value: Option<&str>) -> Result<Option<Decimal>, ()> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Decimal::from_str(raw).map(Some).map_err(|_| ()),
    }
}

/// Map the `category` parameter to an ID.
///
/// Numeric values are taken as IDs. Names match case-insensitively against
/// the full category name, its slug (`home-kitchen`), or its first word
/// (`home` for "Home & Kitchen"). `all`, blank, and unknown names apply no
/// filter.
#[must_use]
pub fn resolve_category(param: Option<&str>, categories: &[Category]) -> Option<CategoryId> {
    let wanted = param.map(str::trim).filter(|p| !p.is_empty())?;
    if wanted.eq_ignore_ascii_case("all") {
        return None;
    }
    if let Ok(id) = wanted.parse::<i32>() {
        return Some(CategoryId::new(id));
    }

    let wanted_slug = slugify(wanted);
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(wanted))
        .or_else(|| categories.iter().find(|c| slugify(&c.name) == wanted_slug))
        .or_else(|| {
            categories.iter().find(|c| {
                c.name
                    .split_whitespace()
                    .next()
                    .is_some_and(|first| first.eq_ignore_ascii_case(wanted))
            })
        })
        .map(|c| c.id)
}

/// Lowercase alphanumeric words joined by `-`.
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Category list cached for five minutes.
#[derive(Clone)]
pub struct CategoryCache {
    cache: Cache<(), Arc<Vec<Category>>>,
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryCache {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300))
            .build();
        Self { cache }
    }

    /// All categories, loading them on a miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the load fails; failures are
    /// not cached.
    #[instrument(skip(self, pool))]
    pub async fn get(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(categories) = self.cache.get(&()).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(CategoryRepository::new(pool).list().await?);
        self.cache.insert((), Arc::clone(&categories)).await;
        Ok(categories)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        [
            (1, "Electronics"),
            (2, "Groceries"),
            (4, "Home & Kitchen"),
            (6, "Sports & Outdoors"),
        ]
        .into_iter()
        .map(|(id, name)| Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: None,
            image_url: None,
        })
        .collect()
    }

    #[test]
    fn test_resolve_all_and_blank() {
        let cats = categories();
        assert_eq!(resolve_category(None, &cats), None);
        assert_eq!(resolve_category(Some(""), &cats), None);
        assert_eq!(resolve_category(Some("ALL"), &cats), None);
    }

    #[test]
    fn test_resolve_numeric() {
        assert_eq!(
            resolve_category(Some("6"), &categories()),
            Some(CategoryId::new(6))
        );
    }

    #[test]
    fn test_resolve_names() {
        let cats = categories();
        assert_eq!(resolve_category(Some("electronics"), &cats), Some(CategoryId::new(1)));
        assert_eq!(resolve_category(Some("Home & Kitchen"), &cats), Some(CategoryId::new(4)));
        assert_eq!(resolve_category(Some("home-kitchen"), &cats), Some(CategoryId::new(4)));
        assert_eq!(resolve_category(Some("home"), &cats), Some(CategoryId::new(4)));
        assert_eq!(resolve_category(Some("Sports"), &cats), Some(CategoryId::new(6)));
    }

    #[test]
    fn test_resolve_unknown_name_applies_no_filter() {
        assert_eq!(resolve_category(Some("toys"), &categories()), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Home & Kitchen"), "home-kitchen");
        assert_eq!(slugify("  Books "), "books");
    }

    #[test]
    fn test_into_filter() {
        let query = ProductQuery {
            q: Some("  mouse ".to_string()),
            category: Some("groceries".to_string()),
            min_price: Some(String::new()),
            max_price: Some("49.99".to_string()),
            sort_by: Some("price_low".to_string()),
        };
        let filter = query.into_filter(&categories()).unwrap();

        assert_eq!(filter.text.as_deref(), Some("mouse"));
        assert_eq!(filter.category_id, Some(CategoryId::new(2)));
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.max_price, Some("49.99".parse().unwrap()));
        assert_eq!(filter.sort, ProductSort::PriceLow);
    }

    #[test]
    fn test_into_filter_rejects_bad_price() {
        let query = ProductQuery {
            min_price: Some("cheap".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(query.into_filter(&categories()).unwrap_err(), "min_price");
    }
}
