//! Account repository for the three role tables.
//!
//! Credential and verification columns are identical across `customers`,
//! `retailers`, and `wholesalers`, so those queries take a [`Role`] and
//! interpolate its (static) table name.

use sqlx::PgPool;

use live_mart_core::{CustomerId, Email, Role};

use super::{RepositoryError, map_constraint};
use crate::models::{
    AccountCredentials, Customer, NewBusiness, NewCustomer, Retailer, RetailerLocation, Wholesaler,
};

const CUSTOMER_COLUMNS: &str = "id, name, mail, is_verified, profile_pic, date_joined, \
     delivery_address, city, state, pincode, phone_number, lat, lon, no_of_purchases, preferences";

const BUSINESS_COLUMNS: &str = "id, name, mail, is_verified, profile_pic, date_joined, \
     business_name, business_logo, business_description, phone_number, tax_id, \
     address, city, state, pincode, lat, lon, is_active";

const DUPLICATE_EMAIL: &str = "email already registered";

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Role-generic operations
    // =========================================================================

    /// Load the credential columns for an email within one role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn credentials(
        &self,
        role: Role,
        email: &Email,
    ) -> Result<Option<AccountCredentials>, RepositoryError> {
        let sql = format!(
            "SELECT id, mail, hashed_password, is_verified FROM {} WHERE mail = $1",
            role.table()
        );
        let row = sqlx::query_as::<_, AccountCredentials>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Find the first role, in [`Role::LOOKUP_ORDER`], holding this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_role(
        &self,
        email: &Email,
    ) -> Result<Option<(Role, AccountCredentials)>, RepositoryError> {
        for role in Role::LOOKUP_ORDER {
            if let Some(creds) = self.credentials(role, email).await? {
                return Ok(Some((role, creds)));
            }
        }
        Ok(None)
    }

    /// Mark the account verified. Returns `false` if no such account exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_verified(&self, role: Role, email: &Email) -> Result<bool, RepositoryError> {
        let sql = format!(
            "UPDATE {} SET is_verified = TRUE WHERE mail = $1",
            role.table()
        );
        let result = sqlx::query(&sql).bind(email).execute(self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the password hash on every role holding this email.
    ///
    /// Returns the number of accounts updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails. The update is
    /// transactional: either every role is updated or none is.
    pub async fn update_password_everywhere(
        &self,
        email: &Email,
        hashed_password: &str,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for role in Role::LOOKUP_ORDER {
            let sql = format!(
                "UPDATE {} SET hashed_password = $2 WHERE mail = $1",
                role.table()
            );
            updated += sqlx::query(&sql)
                .bind(email)
                .bind(hashed_password)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Insert a customer together with an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO customers (name, mail, hashed_password, is_verified, delivery_address, \
             city, state, pincode, phone_number, lat, lon) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(&new.name)
            .bind(&new.mail)
            .bind(&new.hashed_password)
            .bind(new.is_verified)
            .bind(&new.delivery_address)
            .bind(&new.city)
            .bind(&new.state)
            .bind(&new.pincode)
            .bind(&new.phone_number)
            .bind(new.lat)
            .bind(new.lon)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_EMAIL))?;

        sqlx::query("INSERT INTO carts (customer_id) VALUES ($1)")
            .bind(customer.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Get a customer by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE mail = $1");
        let row = sqlx::query_as::<_, Customer>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Rename a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer no longer exists.
    pub async fn rename_customer(
        &self,
        id: CustomerId,
        name: &str,
    ) -> Result<Customer, RepositoryError> {
        let sql = format!("UPDATE customers SET name = $2 WHERE id = $1 RETURNING {CUSTOMER_COLUMNS}");
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Point a customer's profile picture at a stored file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer no longer exists.
    pub async fn set_customer_profile_pic(
        &self,
        id: CustomerId,
        path: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customers SET profile_pic = $2 WHERE id = $1")
            .bind(id)
            .bind(path)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Retailers and wholesalers
    // =========================================================================

    /// Insert a retailer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_retailer(&self, new: &NewBusiness) -> Result<Retailer, RepositoryError> {
        let sql = insert_business_sql(Role::Retailer);
        bind_business(sqlx::query_as::<_, Retailer>(&sql), new)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_EMAIL))
    }

    /// Insert a wholesaler.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_wholesaler(
        &self,
        new: &NewBusiness,
    ) -> Result<Wholesaler, RepositoryError> {
        let sql = insert_business_sql(Role::Wholesaler);
        bind_business(sqlx::query_as::<_, Wholesaler>(&sql), new)
            .fetch_one(self.pool)
            .await
            .map_err(|e| map_constraint(e, DUPLICATE_EMAIL))
    }

    /// Get a retailer by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn retailer_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Retailer>, RepositoryError> {
        let sql = format!("SELECT {BUSINESS_COLUMNS} FROM retailers WHERE mail = $1");
        let row = sqlx::query_as::<_, Retailer>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a wholesaler by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn wholesaler_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Wholesaler>, RepositoryError> {
        let sql = format!("SELECT {BUSINESS_COLUMNS} FROM wholesalers WHERE mail = $1");
        let row = sqlx::query_as::<_, Wholesaler>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Retailers that have map coordinates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn retailer_locations(&self) -> Result<Vec<RetailerLocation>, RepositoryError> {
        let rows = sqlx::query_as::<_, RetailerLocation>(
            r"
            SELECT id, business_name AS name, lat, lon, address
            FROM retailers
            WHERE lat IS NOT NULL AND lon IS NOT NULL
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

fn insert_business_sql(role: Role) -> String {
    format!(
        "INSERT INTO {} (name, mail, hashed_password, is_verified, business_name, address, \
         city, state, pincode, phone_number, tax_id, lat, lon) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING {BUSINESS_COLUMNS}",
        role.table()
    )
}

fn bind_business<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    new: &'q NewBusiness,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    query
        .bind(&new.name)
        .bind(&new.mail)
        .bind(&new.hashed_password)
        .bind(new.is_verified)
        .bind(&new.business_name)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.pincode)
        .bind(&new.phone_number)
        .bind(&new.tax_id)
        .bind(new.lat)
        .bind(new.lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_business_sql_targets_role_table() {
        let sql = insert_business_sql(Role::Wholesaler);
        assert!(sql.starts_with("INSERT INTO wholesalers ("));
        assert!(sql.contains("$13"));
        assert!(sql.ends_with(BUSINESS_COLUMNS));
    }

    #[test]
    fn test_column_lists_exclude_password() {
        assert!(!CUSTOMER_COLUMNS.contains("hashed_password"));
        assert!(!BUSINESS_COLUMNS.contains("hashed_password"));
    }
}
