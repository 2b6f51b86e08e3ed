//! Retailer workflow: inventory, incoming orders, customer history, and the
//! wholesale market.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use live_mart_core::{OrderId, OrderStatus, ProductId, RetailerId};

use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentRetailer;
use crate::models::{
    CustomerHistoryEntry, MarketItem, Order, Product, ProductUpdate, StatusUpdate,
    WHOLESALE_MARKET, WholesaleOrderRequest, market_item,
};
use crate::state::AppState;

/// Load a product and require that `retailer_id` owns it.
async fn owned_product(
    state: &AppState,
    retailer_id: RetailerId,
    id: ProductId,
    action: &str,
) -> Result<Product> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if product.retailer_id != retailer_id {
        return Err(AppError::Forbidden(format!(
            "Not authorized to {action} this product"
        )));
    }
    Ok(product)
}

/// `GET /retailer/my-products`
#[instrument(skip_all, fields(retailer_id = %retailer.id))]
pub async fn my_products(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .by_retailer(retailer.id)
        .await?;
    Ok(Json(products))
}

/// `PUT /retailer/products/{id}`
#[instrument(skip_all, fields(retailer_id = %retailer.id, product_id = id))]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
    Path(id): Path<i32>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    owned_product(&state, retailer.id, id, "update").await?;
    update.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool()).update(id, &update).await?;
    Ok(Json(product))
}

/// `DELETE /retailer/products/{id}`
///
/// Products that appear in past orders are kept (409) so order history
/// stays intact.
#[instrument(skip_all, fields(retailer_id = %retailer.id, product_id = id))]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    owned_product(&state, retailer.id, id, "delete").await?;

    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!("product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /retailer/orders`
#[instrument(skip_all, fields(retailer_id = %retailer.id))]
pub async fn orders(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .for_retailer(retailer.id)
        .await?;
    Ok(Json(orders))
}

/// `PUT /retailer/orders/{id}/status`
#[instrument(skip_all, fields(retailer_id = %retailer.id, order_id = id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
    Path(id): Path<i32>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let status: OrderStatus = update
        .status
        .parse()
        .map_err(|e: live_mart_core::StatusParseError| AppError::BadRequest(e.to_string()))?;

    let id = OrderId::new(id);
    let orders = OrderRepository::new(state.pool());
    if orders.get(id).await?.is_none() {
        return Err(AppError::NotFound("Order not found".to_string()));
    }
    if !orders.retailer_sold_in(retailer.id, id).await? {
        return Err(AppError::Forbidden(
            "Not authorized to update this order".to_string(),
        ));
    }

    let order = orders.update_status(id, status).await?;
    tracing::info!(status = %status, "order status updated");
    Ok(Json(order))
}

/// `GET /retailer/customer-history`
#[instrument(skip_all, fields(retailer_id = %retailer.id))]
pub async fn customer_history(
    State(state): State<AppState>,
    CurrentRetailer(retailer): CurrentRetailer,
) -> Result<Json<Vec<CustomerHistoryEntry>>> {
    let rows = OrderRepository::new(state.pool())
        .customer_history(retailer.id)
        .await?;
    Ok(Json(rows))
}

/// `GET /retailer/wholesale-market`
pub async fn wholesale_market(CurrentRetailer(_): CurrentRetailer) -> Json<&'static [MarketItem]> {
    Json(&WHOLESALE_MARKET)
}

/// Check a wholesale order against the market listing.
fn validate_wholesale_order(request: &WholesaleOrderRequest) -> Result<&'static MarketItem> {
    let item = market_item(request.item_id)
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
    if request.quantity < item.min_qty {
        return Err(AppError::BadRequest(format!(
            "Minimum order quantity for {} is {}",
            item.name, item.min_qty
        )));
    }
    Ok(item)
}

/// `POST /retailer/wholesale-order?item_id=&quantity=`
///
/// The market is a fixed catalog; placing an order only acknowledges it.
#[instrument(skip_all, fields(retailer_id = %retailer.id, item_id = request.item_id))]
pub async fn place_wholesale_order(
    CurrentRetailer(retailer): CurrentRetailer,
    Query(request): Query<WholesaleOrderRequest>,
) -> Result<Json<Value>> {
    let item = validate_wholesale_order(&request)?;
    tracing::info!(supplier = item.supplier, quantity = request.quantity, "wholesale order placed");

    Ok(Json(json!({
        "message": format!(
            "Order placed for Item #{} (Qty: {}). Supplier notified.",
            request.item_id, request.quantity
        )
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wholesale_order_validation() {
        let ok = WholesaleOrderRequest {
            item_id: 901,
            quantity: 10,
        };
        assert_eq!(validate_wholesale_order(&ok).unwrap().name, "Bulk Rice (50kg)");

        let too_few = WholesaleOrderRequest {
            item_id: 901,
            quantity: 9,
        };
        assert!(matches!(
            validate_wholesale_order(&too_few),
            Err(AppError::BadRequest(msg)) if msg == "Minimum order quantity for Bulk Rice (50kg) is 10"
        ));

        let unknown = WholesaleOrderRequest {
            item_id: 1,
            quantity: 100,
        };
        assert!(matches!(
            validate_wholesale_order(&unknown),
            Err(AppError::NotFound(_))
        ));
    }
}
