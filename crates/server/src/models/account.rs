//! Account read models and signup/login payloads.
//!
//! Read models never carry the password hash; credentials are loaded
//! separately through [`AccountCredentials`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use live_mart_core::{CustomerId, Email, RetailerId, WholesalerId};

/// A customer account as returned by the API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub mail: Email,
    pub is_verified: bool,
    pub profile_pic: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub delivery_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone_number: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub no_of_purchases: i32,
    pub preferences: Option<String>,
}

/// A retailer account as returned by the API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Retailer {
    pub id: RetailerId,
    pub name: String,
    pub mail: Email,
    pub is_verified: bool,
    pub profile_pic: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub business_name: String,
    pub business_logo: Option<String>,
    pub business_description: Option<String>,
    pub phone_number: Option<String>,
    pub tax_id: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_active: bool,
}

/// A wholesaler account as returned by the API.
///
/// Same shape as [`Retailer`]; kept as its own type so IDs cannot be mixed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Wholesaler {
    pub id: WholesalerId,
    pub name: String,
    pub mail: Email,
    pub is_verified: bool,
    pub profile_pic: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub business_name: String,
    pub business_logo: Option<String>,
    pub business_description: Option<String>,
    pub phone_number: Option<String>,
    pub tax_id: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub is_active: bool,
}

/// Credential columns shared by every role table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountCredentials {
    /// Row ID within the role's table.
    pub id: i32,
    pub mail: Email,
    pub hashed_password: String,
    pub is_verified: bool,
}

/// Public pin for the store locator map.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RetailerLocation {
    pub id: RetailerId,
    /// Business name, shown on the pin.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
}

/// `POST /signup/customer` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerSignup {
    pub name: String,
    pub mail: String,
    pub password: String,
    pub delivery_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone_number: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// `POST /signup/retailer` and `POST /signup/wholesaler` body.
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessSignup {
    pub name: String,
    pub mail: String,
    pub password: String,
    pub business_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone_number: Option<String>,
    pub tax_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Validated customer fields ready for insertion.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub mail: Email,
    pub hashed_password: String,
    pub is_verified: bool,
    pub delivery_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone_number: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Validated retailer or wholesaler fields ready for insertion.
#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub name: String,
    pub mail: Email,
    pub hashed_password: String,
    pub is_verified: bool,
    pub business_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone_number: Option<String>,
    pub tax_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// `POST /login/{role}` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub mail: String,
    pub password: String,
}

/// Bearer token handed back after login or verification.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    #[must_use]
    pub const fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// `PATCH /customer/me/update` body.
#[derive(Debug, Clone, Deserialize)]
pub struct NameUpdate {
    pub name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_shape() {
        let json = serde_json::to_value(TokenResponse::bearer("abc".to_string())).unwrap();
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["token_type"], "bearer");
    }

    #[test]
    fn test_customer_serialization_has_no_password() {
        let customer = Customer {
            id: CustomerId::new(7),
            name: "Jane Smith".to_string(),
            mail: Email::parse("customer7@gmail.com").unwrap(),
            is_verified: true,
            profile_pic: Some("profile_pictures/default.png".to_string()),
            date_joined: Utc::now(),
            delivery_address: None,
            city: Some("Chicago".to_string()),
            state: Some("IL".to_string()),
            pincode: None,
            phone_number: None,
            lat: None,
            lon: None,
            no_of_purchases: 2,
            preferences: None,
        };

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["mail"], "customer7@gmail.com");
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn test_business_signup_optional_fields() {
        let body = r#"{
            "name": "Sam Lee",
            "mail": "retailer1@shop.com",
            "password": "retail-pass-1",
            "business_name": "Mouse Mart",
            "address": "12 Oak Ave",
            "city": "Dallas",
            "state": "TX",
            "pincode": "75001"
        }"#;
        let signup: BusinessSignup = serde_json::from_str(body).unwrap();
        assert_eq!(signup.business_name, "Mouse Mart");
        assert!(signup.tax_id.is_none());
        assert!(signup.lat.is_none());
    }
}
