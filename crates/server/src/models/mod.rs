//! Domain models and request/response payloads.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod wholesale;

pub use account::{
    AccountCredentials, BusinessSignup, Customer, CustomerSignup, LoginRequest, NameUpdate,
    NewBusiness, NewCustomer, Retailer, RetailerLocation, TokenResponse, Wholesaler,
};
pub use cart::{AddToCart, CartItem, CartLine, CartView};
pub use catalog::{
    Category, DEFAULT_PRODUCT_IMAGE, Feedback, FeedbackCreate, NewProduct, Product, ProductUpdate,
};
pub use order::{
    CheckoutRequest, CustomerHistoryEntry, Order, OrderItem, OrderWithItems, ShippingDetails,
    StatusUpdate,
};
pub use session::keys as session_keys;
pub use wholesale::{
    MarketItem, WHOLESALE_MARKET, WholesaleOrder, WholesaleOrderRequest, market_item,
};
