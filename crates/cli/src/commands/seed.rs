//! Seed the database with demo data.
//!
//! Creates categories, wholesalers, retailers, products, customers with
//! carts, past orders, feedback, and wholesale orders. Every seeded account
//! is verified so it can log in immediately:
//!
//! | Role       | Email                     | Password    |
//! |------------|---------------------------|-------------|
//! | customer   | `customer1@gmail.com` ... | `cust123`   |
//! | retailer   | `retailer1@shop.com` ...  | `retail123` |
//! | wholesaler | `wholesaler1@supply.com`  | `whole123`  |
//!
//! The seed passwords are shorter than the signup minimum on purpose; they
//! are hashed directly instead of going through signup validation.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use live_mart_core::{OrderStatus, PaymentMode, PaymentStatus, WholesaleStatus, line_total};
use live_mart_server::services::auth::hash_password;

use super::{CommandError, connect};

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Alex", "Emily", "Chris", "Katie", "Michael", "Sarah", "David", "Laura",
    "Robert", "Jennifer",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez",
];
const STREET_NAMES: &[&str] = &[
    "Main St", "Oak Ave", "Pine St", "Maple Dr", "Cedar Ln", "Elm St", "Washington Blvd",
    "Lakeview Ter",
];

/// City, state, and approximate coordinates.
const CITIES: &[(&str, &str, f64, f64)] = &[
    ("New York", "NY", 40.7128, -74.0060),
    ("Los Angeles", "CA", 34.0522, -118.2437),
    ("Chicago", "IL", 41.8781, -87.6298),
    ("Houston", "TX", 29.7604, -95.3698),
    ("Phoenix", "AZ", 33.4484, -112.0740),
    ("Philadelphia", "PA", 39.9526, -75.1652),
    ("San Antonio", "TX", 29.4241, -98.4936),
    ("San Diego", "CA", 32.7157, -117.1611),
    ("Dallas", "TX", 32.7767, -96.7970),
    ("San Jose", "CA", 37.3382, -121.8863),
];

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Electronics", "Gadgets, computers, and more", "category_images/electronics.jpg"),
    ("Groceries", "Fresh produce, dairy, and pantry items", "category_images/groceries.jpg"),
    ("Fashion", "Apparel, shoes, and accessories", "category_images/fashion.jpg"),
    ("Home & Kitchen", "Furniture, decor, and appliances", "category_images/home.jpg"),
    ("Books", "Fiction, non-fiction, and textbooks", "category_images/books.jpg"),
    ("Sports & Outdoors", "Equipment, activewear, and gear", "category_images/sports.jpg"),
];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Wireless", "Smart", "Ergonomic", "Organic", "Handcrafted", "Heavy Duty", "Premium",
    "Bluetooth", "LED", "Eco-Friendly",
];

/// Product noun and the image that matches it.
const PRODUCT_TYPES: &[(&str, &str)] = &[
    ("Backpack", "product_images/backpack.jpg"),
    ("Headphones", "product_images/headphones.jpg"),
    ("Coffee Beans", "product_images/coffee.jpg"),
    ("Mouse", "product_images/mouse.jpg"),
    ("Keyboard", "product_images/keyboard.jpg"),
    ("Water Bottle", "product_images/bottle.jpg"),
];

const BUSINESS_ADJECTIVES: &[&str] = &[
    "Global", "National", "Apex", "Summit", "Dynamic", "Pinnacle", "United", "Premier", "Elite",
];
const BUSINESS_NOUNS: &[&str] = &[
    "Supplies", "Solutions", "Logistics", "Ventures", "Trading", "Imports", "Wholesale",
    "Enterprises",
];

const COMMENTS: &[&str] = &[
    "Great product! Highly recommend.",
    "It's okay, not what I expected.",
    "Five stars! Would buy again.",
    "Arrived late and the box was damaged.",
    "Good value for the price.",
    "Changed my life! Amazing!",
    "Smaller than it looks in the picture.",
];

const WHOLESALER_COUNT: usize = 5;
const RETAILER_COUNT: usize = 15;
const PRODUCT_COUNT: usize = 100;
const CUSTOMER_COUNT: usize = 50;
const MAX_FEEDBACK: usize = 150;
const WHOLESALE_ORDER_COUNT: usize = 20;

/// Wholesale prices are 70% of retail.
const WHOLESALE_DISCOUNT: Decimal = Decimal::from_parts(7, 0, 0, false, 1);

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> Result<&'a T, CommandError> {
    items
        .choose(rng)
        .ok_or_else(|| CommandError::Seed("nothing to choose from".to_string()))
}

/// A postal address near one of the sample cities.
#[derive(Debug, Clone)]
struct Address {
    street: String,
    city: &'static str,
    state: &'static str,
    pincode: String,
    lat: f64,
    lon: f64,
}

fn random_address(rng: &mut StdRng) -> Result<Address, CommandError> {
    let &(city, state, lat, lon) = pick(rng, CITIES)?;
    let street = pick(rng, STREET_NAMES)?;
    Ok(Address {
        street: format!("{} {street}", rng.random_range(100..=9999)),
        city,
        state,
        pincode: rng.random_range(10_000..=99_999).to_string(),
        lat: lat + rng.random_range(-0.05..=0.05),
        lon: lon + rng.random_range(-0.05..=0.05),
    })
}

fn random_person(rng: &mut StdRng) -> Result<String, CommandError> {
    Ok(format!(
        "{} {}",
        pick(rng, FIRST_NAMES)?,
        pick(rng, LAST_NAMES)?
    ))
}

/// Retail price between 5.99 and 499.99.
fn random_price(rng: &mut StdRng) -> Decimal {
    Decimal::new(rng.random_range(599..=49_999), 2)
}

fn wholesale_unit_price(retail: Decimal) -> Decimal {
    (retail * WHOLESALE_DISCOUNT).round_dp(2)
}

fn days_ago(rng: &mut StdRng, min: i64, max: i64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::days(rng.random_range(min..=max))
}

/// A seeded product, kept for building orders.
#[derive(Debug, Clone, Copy)]
struct SeededProduct {
    id: i32,
    price: Decimal,
}

/// Seed the database.
///
/// # Errors
///
/// Returns `CommandError::Seed` if the database already holds data and
/// `reset` is false. Any database error rolls back the whole seed.
pub async fn run(reset: bool) -> Result<(), CommandError> {
    let pool = connect().await?;

    if reset {
        info!("Truncating all tables...");
        sqlx::query(
            "TRUNCATE customers, retailers, wholesalers, categories, otp_codes \
             RESTART IDENTITY CASCADE",
        )
        .execute(&pool)
        .await?;
    } else if already_seeded(&pool).await? {
        return Err(CommandError::Seed(
            "database already has data; pass --reset to wipe it first".to_string(),
        ));
    }

    let mut rng = StdRng::from_os_rng();

    // One hash per role keeps seeding fast
    let customer_hash = hash("cust123")?;
    let retailer_hash = hash("retail123")?;
    let wholesaler_hash = hash("whole123")?;

    let mut tx = pool.begin().await?;

    let categories = seed_categories(&mut tx).await?;
    info!(count = categories.len(), "Created categories");

    let wholesalers = seed_wholesalers(&mut tx, &mut rng, &wholesaler_hash).await?;
    info!(count = wholesalers.len(), "Created wholesalers");

    let retailers = seed_retailers(&mut tx, &mut rng, &retailer_hash).await?;
    info!(count = retailers.len(), "Created retailers");

    let retailer_ids: Vec<i32> = retailers.iter().map(|(id, _)| *id).collect();
    let products = seed_products(&mut tx, &mut rng, &retailer_ids, &categories).await?;
    info!(count = products.len(), "Created products");

    let customers = seed_customers(&mut tx, &mut rng, &customer_hash).await?;
    info!(count = customers.len(), "Created customers and their carts");

    let purchases = seed_orders(&mut tx, &mut rng, &customers, &products).await?;
    info!(count = purchases.len(), "Created past order lines");

    let feedback = seed_feedback(&mut tx, &mut rng, purchases).await?;
    info!(count = feedback, "Created feedback entries");

    seed_wholesale_orders(&mut tx, &mut rng, &retailers, &wholesalers, &products).await?;
    info!(count = WHOLESALE_ORDER_COUNT, "Created wholesale orders");

    tx.commit().await?;
    info!("Database seeding complete!");
    Ok(())
}

fn hash(password: &str) -> Result<String, CommandError> {
    hash_password(password).map_err(|e| CommandError::Seed(e.to_string()))
}

async fn already_seeded(pool: &PgPool) -> Result<bool, CommandError> {
    let seeded = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM categories) OR EXISTS (SELECT 1 FROM customers)",
    )
    .fetch_one(pool)
    .await?;
    Ok(seeded)
}

async fn seed_categories(conn: &mut PgConnection) -> Result<Vec<i32>, CommandError> {
    let mut ids = Vec::with_capacity(CATEGORIES.len());
    for &(name, description, image) in CATEGORIES {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO categories (name, description, image_url) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .bind(image)
        .fetch_one(&mut *conn)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

async fn insert_business(
    conn: &mut PgConnection,
    table: &str,
    name: &str,
    mail: &str,
    hashed_password: &str,
    business_name: &str,
    address: &Address,
) -> Result<i32, CommandError> {
    let sql = format!(
        "INSERT INTO {table} (name, mail, hashed_password, is_verified, business_name, \
         address, city, state, pincode, lat, lon) \
         VALUES ($1, $2, $3, TRUE, $4, $5, $6, $7, $8, $9, $10) RETURNING id"
    );
    let id = sqlx::query_scalar::<_, i32>(&sql)
        .bind(name)
        .bind(mail)
        .bind(hashed_password)
        .bind(business_name)
        .bind(&address.street)
        .bind(address.city)
        .bind(address.state)
        .bind(&address.pincode)
        .bind(address.lat)
        .bind(address.lon)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn seed_wholesalers(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    hashed_password: &str,
) -> Result<Vec<i32>, CommandError> {
    let mut ids = Vec::with_capacity(WHOLESALER_COUNT);
    for i in 1..=WHOLESALER_COUNT {
        let address = random_address(rng)?;
        let business = format!(
            "{} {}",
            pick(rng, BUSINESS_ADJECTIVES)?,
            pick(rng, BUSINESS_NOUNS)?
        );
        let id = insert_business(
            conn,
            "wholesalers",
            &random_person(rng)?,
            &format!("wholesaler{i}@supply.com"),
            hashed_password,
            &business,
            &address,
        )
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Returns `(id, street address)` pairs; wholesale orders ship to the
/// retailer's address.
async fn seed_retailers(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    hashed_password: &str,
) -> Result<Vec<(i32, String)>, CommandError> {
    let mut retailers = Vec::with_capacity(RETAILER_COUNT);
    for i in 1..=RETAILER_COUNT {
        let address = random_address(rng)?;
        let (noun, _) = pick(rng, PRODUCT_TYPES)?;
        let id = insert_business(
            conn,
            "retailers",
            &random_person(rng)?,
            &format!("retailer{i}@shop.com"),
            hashed_password,
            &format!("{noun} Mart"),
            &address,
        )
        .await?;
        retailers.push((id, address.street));
    }
    Ok(retailers)
}

async fn seed_products(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    retailers: &[i32],
    categories: &[i32],
) -> Result<Vec<SeededProduct>, CommandError> {
    let mut products = Vec::with_capacity(PRODUCT_COUNT);
    for _ in 0..PRODUCT_COUNT {
        let &(noun, image) = pick(rng, PRODUCT_TYPES)?;
        let name = format!("{} {noun}", pick(rng, PRODUCT_ADJECTIVES)?);
        let price = random_price(rng);

        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO products (name, price, stock, description, category_id, retailer_id, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&name)
        .bind(price)
        .bind(rng.random_range(10..=200_i32))
        .bind("A high-quality product.")
        .bind(*pick(rng, categories)?)
        .bind(*pick(rng, retailers)?)
        .bind(image)
        .fetch_one(&mut *conn)
        .await?;
        products.push(SeededProduct { id, price });
    }
    Ok(products)
}

/// A seeded customer's ID and shipping address.
struct SeededCustomer {
    id: i32,
    address: Address,
}

async fn seed_customers(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    hashed_password: &str,
) -> Result<Vec<SeededCustomer>, CommandError> {
    let mut customers = Vec::with_capacity(CUSTOMER_COUNT);
    for i in 1..=CUSTOMER_COUNT {
        let address = random_address(rng)?;
        let phone = format!(
            "555-{}-{}",
            rng.random_range(100..=999),
            rng.random_range(1000..=9999)
        );

        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO customers (name, mail, hashed_password, is_verified, delivery_address,
                                   city, state, pincode, phone_number, lat, lon)
            VALUES ($1, $2, $3, TRUE, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(random_person(rng)?)
        .bind(format!("customer{i}@gmail.com"))
        .bind(hashed_password)
        .bind(&address.street)
        .bind(address.city)
        .bind(address.state)
        .bind(&address.pincode)
        .bind(phone)
        .bind(address.lat)
        .bind(address.lon)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO carts (customer_id) VALUES ($1)")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        customers.push(SeededCustomer { id, address });
    }
    Ok(customers)
}

/// Insert past orders. Returns one `(product_id, customer_id)` pair per
/// order line, for feedback.
async fn seed_orders(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    customers: &[SeededCustomer],
    products: &[SeededProduct],
) -> Result<Vec<(i32, i32)>, CommandError> {
    let mut purchases = Vec::new();

    for customer in customers {
        let order_count = rng.random_range(0..=5);
        for _ in 0..order_count {
            let mut lines = Vec::new();
            for _ in 0..rng.random_range(1..=4) {
                let product = *pick(rng, products)?;
                lines.push((product, rng.random_range(1..=3_i32)));
            }
            let total: Decimal = lines
                .iter()
                .map(|(product, quantity)| line_total(product.price, *quantity))
                .sum();

            let status = *pick(rng, &[OrderStatus::Delivered, OrderStatus::Shipped])?;
            let payment_mode = *pick(rng, &[PaymentMode::Online, PaymentMode::Offline])?;

            let order_id = sqlx::query_scalar::<_, i32>(
                r"
                INSERT INTO orders (customer_id, order_date, status, shipping_address,
                                    shipping_city, shipping_pincode, total_price,
                                    payment_mode, payment_status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                ",
            )
            .bind(customer.id)
            .bind(days_ago(rng, 1, 90))
            .bind(status)
            .bind(&customer.address.street)
            .bind(customer.address.city)
            .bind(&customer.address.pincode)
            .bind(total)
            .bind(payment_mode)
            .bind(PaymentStatus::Completed)
            .fetch_one(&mut *conn)
            .await?;

            for (product, quantity) in lines {
                sqlx::query(
                    "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(order_id)
                .bind(product.id)
                .bind(quantity)
                .bind(product.price)
                .execute(&mut *conn)
                .await?;
                purchases.push((product.id, customer.id));
            }
        }

        if order_count > 0 {
            sqlx::query("UPDATE customers SET no_of_purchases = $2 WHERE id = $1")
                .bind(customer.id)
                .bind(order_count)
                .execute(&mut *conn)
                .await?;
        }
    }

    Ok(purchases)
}

/// Reviews for a random sample of purchased lines.
async fn seed_feedback(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    mut purchases: Vec<(i32, i32)>,
) -> Result<usize, CommandError> {
    purchases.shuffle(rng);
    purchases.truncate(MAX_FEEDBACK);

    for &(product_id, customer_id) in &purchases {
        sqlx::query(
            "INSERT INTO feedback (product_id, customer_id, rating, comment) VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(customer_id)
        .bind(rng.random_range(1..=5_i32))
        .bind(*pick(rng, COMMENTS)?)
        .execute(&mut *conn)
        .await?;
    }
    Ok(purchases.len())
}

async fn seed_wholesale_orders(
    conn: &mut PgConnection,
    rng: &mut StdRng,
    retailers: &[(i32, String)],
    wholesalers: &[i32],
    products: &[SeededProduct],
) -> Result<(), CommandError> {
    for _ in 0..WHOLESALE_ORDER_COUNT {
        let mut lines = Vec::new();
        for _ in 0..rng.random_range(2..=8) {
            let product = *pick(rng, products)?;
            lines.push((
                product.id,
                rng.random_range(10..=50_i32),
                wholesale_unit_price(product.price),
            ));
        }
        let total: Decimal = lines
            .iter()
            .map(|&(_, quantity, unit)| line_total(unit, quantity))
            .sum();

        let (retailer_id, address) = pick(rng, retailers)?;
        let status = *pick(rng, WholesaleStatus::ALL)?;

        let order_id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO wholesale_orders (retailer_id, wholesaler_id, order_date, status,
                                          total_price, delivery_address, stock_credited)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(*retailer_id)
        .bind(*pick(rng, wholesalers)?)
        .bind(days_ago(rng, 5, 60))
        .bind(status)
        .bind(total)
        .bind(address)
        .bind(status.releases_stock())
        .fetch_one(&mut *conn)
        .await?;

        for (product_id, quantity, unit) in lines {
            sqlx::query(
                "INSERT INTO wholesale_order_items (wholesale_order_id, product_id, quantity, price_per_unit) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_random_address_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let address = random_address(&mut rng).unwrap();
            let &(_, state, lat, lon) = CITIES.iter().find(|c| c.0 == address.city).unwrap();
            assert_eq!(address.state, state);
            assert_eq!(address.pincode.len(), 5);
            assert!((address.lat - lat).abs() <= 0.05 + f64::EPSILON);
            assert!((address.lon - lon).abs() <= 0.05 + f64::EPSILON);
        }
    }

    #[test]
    fn test_random_price_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let price = random_price(&mut rng);
            assert!(price >= Decimal::new(599, 2) && price <= Decimal::new(49_999, 2));
            assert_eq!(price.scale(), 2);
        }
    }

    #[test]
    fn test_wholesale_unit_price() {
        assert_eq!(wholesale_unit_price(Decimal::new(1000, 2)), Decimal::new(700, 2));
        assert_eq!(wholesale_unit_price(Decimal::new(599, 2)), Decimal::new(419, 2));
    }

    #[test]
    fn test_pick_empty_is_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty: [i32; 0] = [];
        assert!(pick(&mut rng, &empty).is_err());
    }
}
