//! Signup, login, and token tests.
//!
//! Requires a migrated and seeded database and a running server. See the
//! crate docs.

#![allow(clippy::unwrap_used)]

use live_mart_core::Role;
use live_mart_integration_tests::{
    SEEDED_CUSTOMER, SEEDED_RETAILER, SEEDED_WHOLESALER, client, login, unique_email, url,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health() {
    let resp = client().get(url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client().get(url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_request_id_echoed() {
    let resp = client()
        .get(url("/health"))
        .header("x-request-id", "it-test-123")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "it-test-123"
    );
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_seeded_accounts_can_log_in() {
    let client = client();
    for (role, (mail, password)) in [
        (Role::Customer, SEEDED_CUSTOMER),
        (Role::Retailer, SEEDED_RETAILER),
        (Role::Wholesaler, SEEDED_WHOLESALER),
    ] {
        let token = login(&client, role, mail, password).await;
        let resp = client
            .get(url(&format!("/{role}/me")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let me: Value = resp.json().await.unwrap();
        assert_eq!(me["mail"], mail);
    }
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_login_wrong_password() {
    let (mail, _) = SEEDED_CUSTOMER;
    let resp = client()
        .post(url("/login/customer"))
        .json(&json!({ "mail": mail, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid Credentials");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_login_unknown_role_is_not_found() {
    let resp = client()
        .post(url("/login/admin"))
        .json(&json!({ "mail": "a@b.com", "password": "whatever1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_signup_then_login_requires_verification() {
    let client = client();
    let mail = unique_email("signup");

    let resp = client
        .post(url("/signup/customer"))
        .json(&json!({
            "name": "Integration Tester",
            "mail": mail,
            "password": "secret-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Same address again
    let resp = client
        .post(url("/signup/customer"))
        .json(&json!({
            "name": "Integration Tester",
            "mail": mail,
            "password": "secret-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(url("/login/customer"))
        .json(&json!({ "mail": mail, "password": "secret-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_verify_account_rejects_bad_code() {
    let resp = client()
        .post(url("/auth/verify-account"))
        .json(&json!({ "email": unique_email("verify"), "otp": "000000" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid or Expired OTP");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_forgot_password_unknown_email() {
    let resp = client()
        .post(url("/auth/forgot-password"))
        .json(&json!({ "email": unique_email("nobody") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_protected_routes_need_token() {
    let client = client();
    for path in ["/customer/me", "/cart", "/retailer/my-products", "/wholesaler/orders"] {
        let resp = client.get(url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_token_for_wrong_role_is_rejected() {
    let client = client();
    let (mail, password) = SEEDED_CUSTOMER;
    let token = login(&client, Role::Customer, mail, password).await;

    let resp = client
        .get(url("/retailer/my-products"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
