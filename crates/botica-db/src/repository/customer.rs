//! # Customer Repository
//!
//! Database operations for customers.
//!
//! ## Lookup-or-Register Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   Order Form: Customer Step                         │
//! │                                                                     │
//! │  Operator enters phone: +51900000000                                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  find_by_phone()                                                    │
//! │       │                                                             │
//! │       ├── Found → reuse existing customer (address pre-filled)      │
//! │       │                                                             │
//! │       └── Not found → create() with the form data                   │
//! │              │                                                      │
//! │              └── district/province/department default to "Lima"     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use botica_core::{Customer, NewCustomer};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer from validated registration input.
    ///
    /// ## Errors
    /// - `DbError::Domain` on validation failure
    /// - `DbError::UniqueViolation` when the phone is already registered
    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        input.validate().map_err(botica_core::CoreError::from)?;

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            phone: input.phone.trim().to_string(),
            name: input.name.trim().to_string(),
            email: input.email.clone(),
            address: input.address.trim().to_string(),
            reference: input.reference.clone(),
            district: input.district_or_default().to_string(),
            province: input.province_or_default().to_string(),
            department: input.department_or_default().to_string(),
            total_purchases: 0,
            total_spent_cents: 0,
            last_purchase_at: None,
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, phone = %customer.phone, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, phone, name, email, address, reference,
                district, province, department,
                total_purchases, total_spent_cents, last_purchase_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.phone)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.reference)
        .bind(&customer.district)
        .bind(&customer.province)
        .bind(&customer.department)
        .bind(customer.total_purchases)
        .bind(customer.total_spent_cents)
        .bind(customer.last_purchase_at)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Looks up a customer by phone number.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE phone = ?1",
        )
        .bind(phone.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Customer> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        customer.ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Finds a customer by phone, creating one when missing.
    ///
    /// This is the order-form entry point: returning customers are reused,
    /// first-time customers are registered in place.
    pub async fn find_or_create(&self, input: &NewCustomer) -> DbResult<Customer> {
        if let Some(existing) = self.find_by_phone(&input.phone).await? {
            debug!(id = %existing.id, "Reusing existing customer");
            return Ok(existing);
        }
        self.create(input).await
    }

    /// Updates a customer's contact details.
    ///
    /// Phone is the identity key and is not updatable here.
    pub async fn update_contact(
        &self,
        id: &str,
        name: &str,
        email: Option<&str>,
        address: &str,
        reference: Option<&str>,
    ) -> DbResult<()> {
        botica_core::validation::validate_name(name).map_err(botica_core::CoreError::from)?;
        botica_core::validation::validate_address(address)
            .map_err(botica_core::CoreError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                address = ?4,
                reference = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(email)
        .bind(address.trim())
        .bind(reference)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Lists customers, most recently registered first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Searches customers by name or phone fragment.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE name LIKE ?1 OR phone LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use botica_core::{CustomerTier, NewCustomer};

    fn ana() -> NewCustomer {
        NewCustomer {
            name: "Ana Ruiz".into(),
            phone: "+51900000000".into(),
            email: None,
            address: "Av. Arequipa 1234, Lince".into(),
            reference: Some("frente al parque".into()),
            district: None,
            province: None,
            department: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let created = db.customers().create(&ana()).await.unwrap();
        assert_eq!(created.district, "Lima");
        assert_eq!(created.province, "Lima");
        assert_eq!(created.department, "Lima");
        assert_eq!(created.total_purchases, 0);
        assert_eq!(created.tier(), CustomerTier::Regular);

        let found = db
            .customers()
            .find_by_phone("+51900000000")
            .await
            .unwrap()
            .expect("customer should exist");
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Ana Ruiz");
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.customers().create(&ana()).await.unwrap();
        let err = db.customers().create(&ana()).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_find_or_create_reuses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = db.customers().find_or_create(&ana()).await.unwrap();
        let second = db.customers().find_or_create(&ana()).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut input = ana();
        input.phone = "bad".into();
        let err = db.customers().create(&input).await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_update_contact() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let created = db.customers().create(&ana()).await.unwrap();

        db.customers()
            .update_contact(
                &created.id,
                "Ana María Ruiz",
                Some("ana@example.com"),
                "Jr. Nueva 456",
                None,
            )
            .await
            .unwrap();

        let updated = db.customers().get_by_id(&created.id).await.unwrap();
        assert_eq!(updated.name, "Ana María Ruiz");
        assert_eq!(updated.email.as_deref(), Some("ana@example.com"));
        assert_eq!(updated.address, "Jr. Nueva 456");
        // Phone is untouched
        assert_eq!(updated.phone, "+51900000000");
    }

    #[tokio::test]
    async fn test_search_by_fragment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers().create(&ana()).await.unwrap();

        let by_name = db.customers().search("Ruiz", 10).await.unwrap();
        assert_eq!(by_name.len(), 1);

        let by_phone = db.customers().search("90000", 10).await.unwrap();
        assert_eq!(by_phone.len(), 1);

        let none = db.customers().search("ghost", 10).await.unwrap();
        assert!(none.is_empty());
    }
}
