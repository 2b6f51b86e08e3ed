//! Cart and checkout route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use live_mart_core::PaymentMode;

use crate::error::{AppError, Result};
use crate::middleware::CurrentCustomer;
use crate::models::{
    AddToCart, CartItem, CartView, CheckoutRequest, OrderWithItems, ShippingDetails,
};
use crate::services::{cart, checkout};
use crate::state::AppState;

/// `GET /cart`
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Json<CartView>> {
    let view = cart::view(state.pool(), customer.id).await?;
    Ok(Json(view))
}

/// `POST /cart/add`
///
/// Returns the updated line, or `null` when the line was removed.
#[instrument(skip_all, fields(customer_id = %customer.id, product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(request): Json<AddToCart>,
) -> Result<Json<Option<CartItem>>> {
    let item = cart::add(state.pool(), customer.id, &request).await?;
    Ok(Json(item))
}

/// Validate the checkout body into shipping details.
fn shipping_details(request: CheckoutRequest) -> Result<ShippingDetails> {
    if !request.has_complete_address() {
        return Err(AppError::BadRequest(
            "Shipping address details are incomplete.".to_string(),
        ));
    }
    let payment_mode: PaymentMode = request
        .payment_mode
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid payment mode".to_string()))?;

    Ok(ShippingDetails {
        address: request.shipping_address.trim().to_owned(),
        city: request.shipping_city.trim().to_owned(),
        pincode: request.shipping_pincode.trim().to_owned(),
        payment_mode,
    })
}

/// `POST /order/checkout`
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn checkout(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<OrderWithItems>> {
    let shipping = shipping_details(request)?;
    let order = checkout::checkout(state.pool(), customer.id, &shipping).await?;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(address: &str, payment_mode: &str) -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: address.to_string(),
            shipping_city: "Pune".to_string(),
            shipping_pincode: "411001".to_string(),
            payment_mode: payment_mode.to_string(),
        }
    }

    #[test]
    fn test_shipping_details_trims_and_parses() {
        let details = shipping_details(request("  12 MG Road ", "offline")).unwrap();
        assert_eq!(details.address, "12 MG Road");
        assert_eq!(details.payment_mode, PaymentMode::Offline);
    }

    #[test]
    fn test_incomplete_address_rejected() {
        let err = shipping_details(request("   ", "Online")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Shipping address details are incomplete."));
    }

    #[test]
    fn test_unknown_payment_mode_rejected() {
        assert!(matches!(
            shipping_details(request("12 MG Road", "barter")),
            Err(AppError::BadRequest(_))
        ));
    }
}
