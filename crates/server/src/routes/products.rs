//! Catalog route handlers: product search, detail, creation, and feedback.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tracing::instrument;

use live_mart_core::{CategoryId, ProductId, RetailerId};

use crate::db::{FeedbackRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentCustomer, CurrentRetailer};
use crate::models::{
    Category, DEFAULT_PRODUCT_IMAGE, Feedback, FeedbackCreate, NewProduct, Product,
};
use crate::services::catalog::ProductQuery;
use crate::services::uploads::{self, PRODUCT_IMAGES};
use crate::state::AppState;

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let categories = state.categories().get(state.pool()).await?;
    let filter = query
        .into_filter(&categories)
        .map_err(|field| AppError::BadRequest(format!("Invalid {field}")))?;

    let products = ProductRepository::new(state.pool()).search(&filter).await?;
    Ok(Json(products))
}

/// `GET /products/{id}`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .map(Json)
        .ok_or_else(product_not_found)
}

/// `GET /categories`
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = state.categories().get(state.pool()).await?;
    Ok(Json(categories.as_ref().clone()))
}

// =============================================================================
// Product creation (multipart)
// =============================================================================

/// An uploaded file held in memory until the product row exists.
#[derive(Debug)]
struct UploadedImage {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Fields of the `POST /products/add/` form.
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    price: Option<String>,
    stock: Option<String>,
    description: Option<String>,
    category_id: Option<String>,
    image: Option<UploadedImage>,
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {e}"))
}

async fn field_text(field: Field<'_>) -> Result<String> {
    field.text().await.map_err(multipart_error)
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "name" => form.name = Some(field_text(field).await?),
                "price" => form.price = Some(field_text(field).await?),
                "stock" => form.stock = Some(field_text(field).await?),
                "description" => form.description = Some(field_text(field).await?),
                "category_id" => form.category_id = Some(field_text(field).await?),
                "image" => {
                    let file_name = field.file_name().map(str::to_owned);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    // Browsers send an empty part when no file was chosen
                    if !bytes.is_empty() {
                        form.image = Some(UploadedImage {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// Validate every field, including the image, before anything is
    /// written.
    fn into_new_product(
        self,
        retailer_id: RetailerId,
    ) -> Result<(NewProduct, Option<UploadedImage>)> {
        let required = |value: Option<String>, field: &str| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::BadRequest(format!("Missing field: {field}")))
        };
        let invalid = |field: &str| AppError::BadRequest(format!("Invalid {field}"));

        let name = required(self.name, "name")?;
        let price =
            Decimal::from_str(&required(self.price, "price")?).map_err(|_| invalid("price"))?;
        let stock: i32 = required(self.stock, "stock")?
            .parse()
            .map_err(|_| invalid("stock"))?;
        let category_id: i32 = required(self.category_id, "category_id")?
            .parse()
            .map_err(|_| invalid("category_id"))?;

        if price.is_sign_negative() && !price.is_zero() {
            return Err(AppError::BadRequest("Price cannot be negative".to_string()));
        }
        if stock < 0 {
            return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
        }
        if let Some(image) = &self.image {
            uploads::validate_image(image.file_name.as_deref(), &image.bytes)?;
        }

        let product = NewProduct {
            name,
            price,
            stock,
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            category_id: Some(CategoryId::new(category_id)),
            retailer_id,
        };
        Ok((product, self.image))
    }
}

/// `POST /products/add/`
///
/// The row is inserted first so the image can be named after its ID. If
/// the image cannot be written the row is deleted again.
#[instrument(skip_all, fields(retailer_id = %retailer.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>)> {
    let (new, image) = ProductForm::read(multipart)
        .await?
        .into_new_product(retailer.id)?;

    let products = ProductRepository::new(state.pool());
    let mut product = products.create(&new, DEFAULT_PRODUCT_IMAGE).await?;

    if let Some(image) = image {
        let stored = uploads::store_image(
            &state.config().data_dir,
            PRODUCT_IMAGES,
            &product.id.to_string(),
            image.file_name.as_deref(),
            &image.bytes,
        )
        .await;

        let path = match stored {
            Ok(path) => path,
            Err(e) => {
                if let Err(cleanup) = products.delete(product.id).await {
                    tracing::error!(
                        product_id = %product.id,
                        error = %cleanup,
                        "failed to remove product after upload error"
                    );
                }
                return Err(e.into());
            }
        };
        product = products.set_image(product.id, &path).await?;
    }

    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

// =============================================================================
// Feedback
// =============================================================================

/// `GET /products/{id}/feedback`
#[instrument(skip(state))]
pub async fn feedback(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Feedback>>> {
    let reviews = FeedbackRepository::new(state.pool())
        .for_product(ProductId::new(id))
        .await?;
    Ok(Json(reviews))
}

/// `POST /products/{id}/feedback`
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn add_feedback(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Path(id): Path<i32>,
    Json(request): Json<FeedbackCreate>,
) -> Result<(StatusCode, Json<Feedback>)> {
    if !request.rating_in_range() {
        return Err(AppError::BadRequest(format!(
            "Rating must be between {} and {}",
            FeedbackCreate::MIN_RATING,
            FeedbackCreate::MAX_RATING
        )));
    }

    let product_id = ProductId::new(id);
    if ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .is_none()
    {
        return Err(product_not_found());
    }

    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let review = FeedbackRepository::new(state.pool())
        .create(product_id, customer.id, request.rating, comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::services::uploads::{MAX_UPLOAD_BYTES, UploadError};

    use super::*;

    fn form(image: Option<(&str, usize)>) -> ProductForm {
        ProductForm {
            name: Some(" Smart Mouse ".to_string()),
            price: Some("19.99".to_string()),
            stock: Some("12".to_string()),
            description: Some("  ".to_string()),
            category_id: Some("3".to_string()),
            image: image.map(|(file_name, size)| UploadedImage {
                file_name: Some(file_name.to_string()),
                bytes: vec![1; size],
            }),
        }
    }

    #[test]
    fn test_into_new_product_trims_fields() {
        let (product, image) = form(None).into_new_product(RetailerId::new(5)).unwrap();
        assert_eq!(product.name, "Smart Mouse");
        assert_eq!(product.price, Decimal::new(1999, 2));
        assert_eq!(product.stock, 12);
        assert_eq!(product.description, None);
        assert_eq!(product.category_id, Some(CategoryId::new(3)));
        assert_eq!(product.retailer_id, RetailerId::new(5));
        assert!(image.is_none());
    }

    #[test]
    fn test_oversized_image_rejected_before_insert() {
        let err = form(Some(("big.png", MAX_UPLOAD_BYTES + 1)))
            .into_new_product(RetailerId::new(1))
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(UploadError::TooLarge)));

        let (_, image) = form(Some(("ok.png", 16)))
            .into_new_product(RetailerId::new(1))
            .unwrap();
        assert_eq!(image.unwrap().bytes.len(), 16);
    }

    #[test]
    fn test_unsupported_image_rejected() {
        let err = form(Some(("notes.txt", 4)))
            .into_new_product(RetailerId::new(1))
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(UploadError::UnsupportedType)));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut negative = form(None);
        negative.stock = Some("-1".to_string());
        assert!(matches!(
            negative.into_new_product(RetailerId::new(1)),
            Err(AppError::BadRequest(_))
        ));
    }
}
