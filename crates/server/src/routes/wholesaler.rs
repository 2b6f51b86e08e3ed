//! Wholesaler workflow handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use live_mart_core::{WholesaleOrderId, WholesaleStatus};

use crate::db::wholesale::StatusChange;
use crate::db::{RepositoryError, WholesaleRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentWholesaler;
use crate::models::{StatusUpdate, WholesaleOrder};
use crate::state::AppState;

/// `GET /wholesaler/orders`
#[instrument(skip_all, fields(wholesaler_id = %wholesaler.id))]
pub async fn orders(
    State(state): State<AppState>,
    CurrentWholesaler(wholesaler): CurrentWholesaler,
) -> Result<Json<Vec<WholesaleOrder>>> {
    let orders = WholesaleRepository::new(state.pool())
        .for_wholesaler(wholesaler.id)
        .await?;
    Ok(Json(orders))
}

/// `PUT /wholesaler/orders/{id}/status`
///
/// Approving or shipping a pending order credits the retailer's stock.
#[instrument(skip_all, fields(wholesaler_id = %wholesaler.id, order_id = id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    CurrentWholesaler(wholesaler): CurrentWholesaler,
    Path(id): Path<i32>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<WholesaleOrder>> {
    let status: WholesaleStatus = update
        .status
        .parse()
        .map_err(|e: live_mart_core::StatusParseError| AppError::BadRequest(e.to_string()))?;

    let change = WholesaleRepository::new(state.pool())
        .update_status(wholesaler.id, WholesaleOrderId::new(id), status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Order not found".to_string()),
            other => other.into(),
        })?;

    match change {
        StatusChange::Updated(order) => {
            tracing::info!(status = %order.status, "wholesale order status updated");
            Ok(Json(order))
        }
        StatusChange::NotOwner => Err(AppError::Forbidden("Not authorized".to_string())),
    }
}
