//! Customer profile and order history handlers, plus the public retailer
//! map.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{AccountRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentCustomer;
use crate::models::{Customer, NameUpdate, OrderWithItems, RetailerLocation};
use crate::services::uploads::{self, PROFILE_PICTURES};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadedPicture {
    pub image_url: String,
}

/// `PATCH /customer/me/update`
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(update): Json<NameUpdate>,
) -> Result<Json<Customer>> {
    let name = update.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }

    let customer = AccountRepository::new(state.pool())
        .rename_customer(customer.id, name)
        .await?;
    Ok(Json(customer))
}

/// `POST /customer/me/upload-pfp`
///
/// Each upload gets a fresh file name so browsers never show a cached
/// older picture.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    mut multipart: Multipart,
) -> Result<Json<UploadedPicture>> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        AppError::BadRequest(format!("Invalid form data: {e}"))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.map_err(bad_form)?;

        let stem = format!("{}_{}", customer.id, Uuid::new_v4().simple());
        let path = uploads::store_image(
            &state.config().data_dir,
            PROFILE_PICTURES,
            &stem,
            file_name.as_deref(),
            &bytes,
        )
        .await?;

        AccountRepository::new(state.pool())
            .set_customer_profile_pic(customer.id, &path)
            .await?;
        return Ok(Json(UploadedPicture { image_url: path }));
    }

    Err(AppError::BadRequest("Missing field: file".to_string()))
}

/// `GET /customer/orders`
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn orders(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = OrderRepository::new(state.pool())
        .for_customer(customer.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /retailers/locations`
pub async fn retailer_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<RetailerLocation>>> {
    let locations = AccountRepository::new(state.pool())
        .retailer_locations()
        .await?;
    Ok(Json(locations))
}
