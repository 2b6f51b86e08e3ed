//! Cart, checkout, and order workflow tests against a seeded database.

#![allow(clippy::unwrap_used)]

use live_mart_core::Role;
use live_mart_integration_tests::{
    SEEDED_CUSTOMER, SEEDED_RETAILER, SEEDED_WHOLESALER, client, login, url,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_cart_checkout_flow() {
    let client = client();
    let (mail, password) = SEEDED_CUSTOMER;
    let token = login(&client, Role::Customer, mail, password).await;

    let listed: Vec<Value> = client
        .get(url("/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let product = listed
        .iter()
        .find(|p| p["stock"].as_i64().unwrap_or(0) > 0)
        .unwrap();

    let resp = client
        .post(url("/cart/add"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product["id"], "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = client
        .get(url("/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cart["items"].as_array().is_some_and(|items| !items.is_empty()));

    let resp = client
        .post(url("/order/checkout"))
        .bearer_auth(&token)
        .json(&json!({
            "shipping_address": "12 Test Lane",
            "shipping_city": "Chicago",
            "shipping_pincode": "60601",
            "payment_mode": "offline",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = client
        .get(url("/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    let resp = client
        .get(url("/customer/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_checkout_rejects_incomplete_address() {
    let client = client();
    let (mail, password) = SEEDED_CUSTOMER;
    let token = login(&client, Role::Customer, mail, password).await;

    let resp = client
        .post(url("/order/checkout"))
        .bearer_auth(&token)
        .json(&json!({ "shipping_address": "  ", "payment_mode": "Online" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Shipping address details are incomplete.");
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_retailer_views() {
    let client = client();
    let (mail, password) = SEEDED_RETAILER;
    let token = login(&client, Role::Retailer, mail, password).await;

    for path in [
        "/retailer/my-products",
        "/retailer/orders",
        "/retailer/customer-history",
        "/retailer/wholesale-market",
    ] {
        let resp = client.get(url(path)).bearer_auth(&token).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }

    let resp = client
        .post(url("/retailer/wholesale-order?item_id=999999&quantity=10"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_retailer_cannot_update_missing_order() {
    let client = client();
    let (mail, password) = SEEDED_RETAILER;
    let token = login(&client, Role::Retailer, mail, password).await;

    let resp = client
        .put(url("/retailer/orders/999999999/status"))
        .bearer_auth(&token)
        .json(&json!({ "status": "Shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_wholesaler_orders() {
    let client = client();
    let (mail, password) = SEEDED_WHOLESALER;
    let token = login(&client, Role::Wholesaler, mail, password).await;

    let resp = client
        .get(url("/wholesaler/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Vec<Value> = resp.json().await.unwrap();
    for order in orders {
        assert!(["Pending", "Approved", "Shipped"].contains(&order["status"].as_str().unwrap()));
    }
}
