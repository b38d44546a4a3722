//! # Order Repository
//!
//! Database operations for orders, order lines and payments.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                               │
//! │                                                                     │
//! │  1. CREATE                                                          │
//! │     └── create_order() → one transaction:                           │
//! │         • verify stock sufficiency per line                         │
//! │         • snapshot code/name/price into order_lines                 │
//! │         • compute subtotal / IGV / total                            │
//! │         (stock itself is mutated only by the inventory path,        │
//! │          MedicineRepository::adjust_stock)                          │
//! │                                                                     │
//! │  2. PROGRESS                                                        │
//! │     └── transition() → guarded by the status state machine,         │
//! │         sets confirmed_at / paid_at / shipped_at as it goes         │
//! │                                                                     │
//! │  3. PAY                                                             │
//! │     └── record_payment() → one transaction:                         │
//! │         • insert the payment row                                    │
//! │         • force status to PAID, whatever it was before              │
//! │         • bump the customer's lifetime purchase counters            │
//! │                                                                     │
//! │  4. (OPTIONAL) CANCEL                                               │
//! │     └── transition(Cancelled) from any non-final status             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use botica_core::{
    Cart, CoreError, Customer, Medicine, Money, Order, OrderLine, OrderStatus, OrderTotals,
    PaymentMethod, PaymentRecord, ORDER_NUMBER_PREFIX,
};

/// One requested line when creating an order: a medicine code plus quantity.
#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub code: String,
    pub quantity: i64,
}

impl OrderLineInput {
    pub fn new(code: impl Into<String>, quantity: i64) -> Self {
        OrderLineInput {
            code: code.into(),
            quantity,
        }
    }
}

/// Row for the order-management list: order plus joined customer identity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<Utc>,
}

/// Full read model for the voucher and the order-detail view.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub customer: Customer,
    pub lines: Vec<OrderLine>,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order with its lines in a single transaction.
    ///
    /// Stock sufficiency is verified per line against the catalog inside the
    /// transaction, but stock levels are not mutated here; inventory changes
    /// go through `MedicineRepository::adjust_stock`. When
    /// `shipping_address` is `None`, the customer's stored address is frozen
    /// into the order.
    ///
    /// ## Errors
    /// - `DbError::Domain(EmptyOrder)` when `items` is empty
    /// - `DbError::Domain(Validation)` for a malformed customer id
    /// - `DbError::Domain(MedicineNotFound)` for an unknown or inactive code
    /// - `DbError::Domain(InsufficientStock)` when a line exceeds stock
    /// - `DbError::NotFound` for an unknown customer
    pub async fn create_order(
        &self,
        customer_id: &str,
        items: &[OrderLineInput],
        shipping_address: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<(Order, Vec<OrderLine>)> {
        if items.is_empty() {
            return Err(DbError::Domain(CoreError::EmptyOrder));
        }
        botica_core::validation::validate_uuid(customer_id).map_err(CoreError::from)?;
        for item in items {
            botica_core::validation::validate_quantity(item.quantity)
                .map_err(CoreError::from)?;
        }

        let mut tx = self.pool.begin().await?;

        let customer_address: Option<String> =
            sqlx::query_scalar("SELECT address FROM customers WHERE id = ?1")
                .bind(customer_id)
                .fetch_optional(&mut *tx)
                .await?;
        let customer_address =
            customer_address.ok_or_else(|| DbError::not_found("Customer", customer_id))?;
        let shipping_address = shipping_address
            .map(str::to_string)
            .unwrap_or(customer_address);

        let order_id = Uuid::new_v4().to_string();
        let order_number = generate_order_number();
        let now = Utc::now();

        let mut lines = Vec::with_capacity(items.len());
        let mut subtotal = Money::zero();

        for item in items {
            let medicine = sqlx::query_as::<_, Medicine>(
                "SELECT * FROM medicines WHERE code = ?1 AND is_active = 1",
            )
            .bind(item.code.trim())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                DbError::Domain(CoreError::MedicineNotFound {
                    code: item.code.clone(),
                })
            })?;

            if !medicine.has_stock_for(item.quantity) {
                return Err(DbError::Domain(CoreError::InsufficientStock {
                    code: medicine.code.clone(),
                    available: medicine.stock,
                    requested: item.quantity,
                }));
            }

            let line_total = medicine.unit_price().multiply_quantity(item.quantity);
            subtotal += line_total;

            let line = OrderLine {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                medicine_id: medicine.id.clone(),
                code_snapshot: medicine.code.clone(),
                name_snapshot: medicine.name.clone(),
                quantity: item.quantity,
                unit_price_cents: medicine.unit_price_cents,
                line_total_cents: line_total.cents(),
                created_at: now,
            };

            lines.push(line);
        }

        let totals = OrderTotals::from_subtotal(subtotal);

        let order = Order {
            id: order_id,
            order_number,
            customer_id: customer_id.to_string(),
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            status: OrderStatus::Pending,
            shipping_address,
            notes: notes.map(str::to_string),
            created_at: now,
            confirmed_at: None,
            paid_at: None,
            shipped_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id,
                subtotal_cents, tax_cents, total_cents,
                status, shipping_address, notes,
                created_at, confirmed_at, paid_at, shipped_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.status)
        .bind(&order.shipping_address)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.confirmed_at)
        .bind(order.paid_at)
        .bind(order.shipped_at)
        .execute(&mut *tx)
        .await?;

        // Lines carry a foreign key to orders, so the header row goes in first
        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, medicine_id,
                    code_snapshot, name_snapshot,
                    quantity, unit_price_cents, line_total_cents,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.medicine_id)
            .bind(&line.code_snapshot)
            .bind(&line.name_snapshot)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total_cents)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            total = %order.total(),
            lines = lines.len(),
            "Order created"
        );

        Ok((order, lines))
    }

    /// Creates an order from a session draft.
    ///
    /// Quantities and snapshots are re-resolved against the live catalog
    /// inside the transaction; the draft's observed stock may be stale.
    pub async fn create_order_from_cart(
        &self,
        customer_id: &str,
        cart: &Cart,
        shipping_address: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<(Order, Vec<OrderLine>)> {
        let items: Vec<OrderLineInput> = cart
            .items()
            .iter()
            .map(|item| OrderLineInput::new(item.code.clone(), item.quantity))
            .collect();
        self.create_order(customer_id, &items, shipping_address, notes)
            .await
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Order> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        order.ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Gets an order by its order number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Order> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = ?1")
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        order.ok_or_else(|| {
            DbError::Domain(CoreError::OrderNotFound {
                reference: order_number.to_string(),
            })
        })
    }

    /// Gets all lines for an order, in insertion order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_lines WHERE order_id = ?1 ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Full read model for the voucher: order + customer + lines.
    pub async fn get_details(&self, order_id: &str) -> DbResult<OrderDetails> {
        let order = self.get_by_id(order_id).await?;

        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(&order.customer_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &order.customer_id))?;

        let lines = self.get_lines(order_id).await?;

        Ok(OrderDetails {
            order,
            customer,
            lines,
        })
    }

    /// Lists the most recent orders.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Order-management list: recent orders with joined customer identity,
    /// optionally narrowed to one status.
    pub async fn list_summaries(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> DbResult<Vec<OrderSummary>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderSummary>(
                    r#"
                    SELECT
                        o.id, o.order_number,
                        c.name AS customer_name, c.phone AS customer_phone,
                        o.total_cents, o.status, o.created_at
                    FROM orders o
                    JOIN customers c ON c.id = o.customer_id
                    WHERE o.status = ?1
                    ORDER BY o.created_at DESC
                    LIMIT ?2
                    "#,
                )
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderSummary>(
                    r#"
                    SELECT
                        o.id, o.order_number,
                        c.name AS customer_name, c.phone AS customer_phone,
                        o.total_cents, o.status, o.created_at
                    FROM orders o
                    JOIN customers c ON c.id = o.customer_id
                    ORDER BY o.created_at DESC
                    LIMIT ?1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Lists a customer's orders, most recent first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE customer_id = ?1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Moves an order to a new status, enforcing the transition table.
    ///
    /// Entering CONFIRMED, PAID or SHIPPED stamps the matching timestamp
    /// with the current time. Other targets leave the timestamps untouched.
    ///
    /// ## Errors
    /// - `DbError::Domain(InvalidTransition)` when the state machine rejects
    ///   the move (backward moves, transitions out of a final status)
    pub async fn transition(&self, order_id: &str, target: OrderStatus) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        if !order.status.can_transition(target) {
            return Err(DbError::Domain(CoreError::InvalidTransition {
                from: order.status,
                to: target,
            }));
        }

        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                confirmed_at = CASE WHEN ?2 = 'CONFIRMED' THEN ?3 ELSE confirmed_at END,
                paid_at      = CASE WHEN ?2 = 'PAID'      THEN ?3 ELSE paid_at END,
                shipped_at   = CASE WHEN ?2 = 'SHIPPED'   THEN ?3 ELSE shipped_at END
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(target)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(order_id = %order_id, from = %order.status, to = %target, "Order transitioned");

        self.get_by_id(order_id).await
    }

    /// Records a payment and forces the order to PAID in one transaction.
    ///
    /// ## Why This Bypasses the Transition Guard
    /// Money already changed hands. A payment arriving while the order sits
    /// in PENDING, SHIPPED or even CANCELLED must still be recorded, and the
    /// order must reflect it, so the status is set to PAID unconditionally.
    ///
    /// The customer's lifetime counters (total_purchases, total_spent_cents,
    /// last_purchase_at) are bumped in the same transaction.
    pub async fn record_payment(
        &self,
        order_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
        reference: Option<&str>,
    ) -> DbResult<PaymentRecord> {
        botica_core::validation::validate_payment_amount(amount_cents)
            .map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let now = Utc::now();

        let payment = PaymentRecord {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            amount_cents,
            method,
            reference: reference.map(str::to_string),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, amount_cents, method, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET status = 'PAID', paid_at = ?2 WHERE id = ?1")
            .bind(order_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE customers SET
                total_purchases = total_purchases + 1,
                total_spent_cents = total_spent_cents + ?2,
                last_purchase_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&order.customer_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            amount = %payment.amount(),
            method = ?method,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Gets all payments for an order, oldest first.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payments WHERE order_id = ?1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Total amount paid against an order, in céntimos.
    pub async fn total_paid(&self, order_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_cents) FROM payments WHERE order_id = ?1")
                .bind(order_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

/// Generates an order number: `PED-<YYYYMMDDHHMMSS>-<NNNN>`.
///
/// The 4-digit suffix comes from the sub-second part of the clock, so two
/// orders created within the same second still get distinct numbers.
///
/// ## Example
/// `PED-20260824153000-0421`
fn generate_order_number() -> String {
    let now = Utc::now();
    let timestamp = now.format("%Y%m%d%H%M%S");
    let suffix = (now.timestamp_subsec_nanos() / 100_000) % 10_000;

    format!("{ORDER_NUMBER_PREFIX}-{timestamp}-{suffix:04}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botica_core::{NewCustomer, NewMedicine};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let customer = db
            .customers()
            .create(&NewCustomer {
                name: "Ana Ruiz".into(),
                phone: "+51900000000".into(),
                email: None,
                address: "Av. Arequipa 1234, Lince".into(),
                reference: None,
                district: None,
                province: None,
                department: None,
            })
            .await
            .unwrap();

        db.medicines()
            .create(&NewMedicine {
                code: "PAR500".into(),
                name: "Paracetamol 500mg".into(),
                description: None,
                category: "Analgésicos".into(),
                laboratory: None,
                active_ingredient: Some("Paracetamol".into()),
                concentration: Some("500mg".into()),
                presentation: None,
                unit_price_cents: 500,
                stock: 100,
                min_stock: 10,
                requires_prescription: false,
            })
            .await
            .unwrap();

        (db, customer.id)
    }

    #[tokio::test]
    async fn test_create_order_totals_and_snapshots() {
        let (db, customer_id) = setup().await;

        let (order, lines) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        // 3 × S/ 5.00 = 15.00, IGV 2.70, total 17.70
        assert_eq!(order.subtotal_cents, 1500);
        assert_eq!(order.tax_cents, 270);
        assert_eq!(order.total_cents, 1770);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.starts_with("PED-"));
        assert_eq!(order.shipping_address, "Av. Arequipa 1234, Lince");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].code_snapshot, "PAR500");
        assert_eq!(lines[0].name_snapshot, "Paracetamol 500mg");
        assert_eq!(lines[0].unit_price_cents, 500);
        assert_eq!(lines[0].line_total_cents, 1500);

        // Ordering reserves nothing: stock mutation is the inventory path's job
        let med = db.medicines().get_by_code("PAR500").await.unwrap();
        assert_eq!(med.stock, 100);
    }

    #[tokio::test]
    async fn test_create_order_persists_under_foreign_key_enforcement() {
        let (db, customer_id) = setup().await;

        // Every connection runs with PRAGMA foreign_keys on
        let fk_on: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(fk_on, 1);

        let (order, lines) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 2)], None, None)
            .await
            .unwrap();

        // Header row and line rows both landed, with intact references
        let linked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_lines ol \
             JOIN orders o ON o.id = ol.order_id WHERE o.id = ?1",
        )
        .bind(&order.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(linked, lines.len() as i64);
    }

    #[tokio::test]
    async fn test_multi_line_subtotal_is_sum_of_lines() {
        let (db, customer_id) = setup().await;

        db.medicines()
            .create(&NewMedicine {
                code: "VITC1G".into(),
                name: "Vitamina C 1g".into(),
                description: None,
                category: "Vitaminas".into(),
                laboratory: None,
                active_ingredient: None,
                concentration: None,
                presentation: None,
                unit_price_cents: 900,
                stock: 50,
                min_stock: 5,
                requires_prescription: false,
            })
            .await
            .unwrap();

        let items = [
            OrderLineInput::new("PAR500", 3),
            OrderLineInput::new("VITC1G", 2),
        ];
        let (order, lines) = db
            .orders()
            .create_order(&customer_id, &items, None, None)
            .await
            .unwrap();

        assert_eq!(lines.len(), items.len());
        let line_sum: i64 = lines.iter().map(|l| l.line_total_cents).sum();
        assert_eq!(order.subtotal_cents, line_sum);
        assert_eq!(order.total_cents, order.subtotal_cents + order.tax_cents);
    }

    #[tokio::test]
    async fn test_new_customer_first_order_flow() {
        let (db, _) = setup().await;

        // Unknown phone: the order form registers the caller first
        assert!(db
            .customers()
            .find_by_phone("+51955555555")
            .await
            .unwrap()
            .is_none());

        let customer = db
            .customers()
            .create(&NewCustomer {
                name: "Rosa Díaz".into(),
                phone: "+51955555555".into(),
                email: None,
                address: "Av. X 123".into(),
                reference: None,
                district: None,
                province: None,
                department: None,
            })
            .await
            .unwrap();

        let (order, _) = db
            .orders()
            .create_order(&customer.id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        assert_eq!(order.subtotal_cents, 1500);
        assert_eq!(order.tax_cents, 270);
        assert_eq!(order.total_cents, 1770);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_shipping_address_override() {
        let (db, customer_id) = setup().await;

        let (order, _) = db
            .orders()
            .create_order(
                &customer_id,
                &[OrderLineInput::new("PAR500", 1)],
                Some("Oficina: Av. Javier Prado 500"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(order.shipping_address, "Oficina: Av. Javier Prado 500");
    }

    #[tokio::test]
    async fn test_create_order_from_cart() {
        let (db, customer_id) = setup().await;

        let med = db.medicines().get_by_code("PAR500").await.unwrap();
        let mut cart = Cart::new();
        cart.add_item(&med, 3).unwrap();

        let (order, lines) = db
            .orders()
            .create_order_from_cart(&customer_id, &cart, None, None)
            .await
            .unwrap();
        assert_eq!(order.total_cents, cart.totals().total_cents);
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_order_rejected() {
        let (db, customer_id) = setup().await;

        let err = db
            .orders()
            .create_order(&customer_id, &[], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyOrder)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let (db, customer_id) = setup().await;

        let items = [
            OrderLineInput::new("PAR500", 10),
            OrderLineInput::new("PAR500", 101), // second line exceeds stock
        ];
        let err = db
            .orders()
            .create_order(&customer_id, &items, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        // Nothing persisted: no order, no orphaned lines
        assert!(db.orders().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_customer_id_rejected() {
        let (db, _) = setup().await;

        let err = db
            .orders()
            .create_order("not-a-uuid", &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_code_rejected() {
        let (db, customer_id) = setup().await;

        let err = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("GHOST", 1)], None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MedicineNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_catalog_edit() {
        let (db, customer_id) = setup().await;

        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        let med = db.medicines().get_by_code("PAR500").await.unwrap();
        db.medicines().update_price(&med.id, 999).await.unwrap();

        let lines = db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines[0].unit_price_cents, 500);
        let reloaded = db.orders().get_by_id(&order.id).await.unwrap();
        assert_eq!(reloaded.total_cents, 1770);
    }

    #[tokio::test]
    async fn test_transition_forward_and_timestamps() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        let confirmed = db
            .orders()
            .transition(&order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());
        assert!(confirmed.paid_at.is_none());

        let shipped = db
            .orders()
            .transition(&order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert!(shipped.shipped_at.is_some());
        // Earlier timestamp preserved
        assert_eq!(shipped.confirmed_at, confirmed.confirmed_at);
    }

    #[tokio::test]
    async fn test_transition_to_paid_sets_paid_at() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        db.orders()
            .transition(&order.id, OrderStatus::ProformaGenerated)
            .await
            .unwrap();
        let paid = db
            .orders()
            .transition(&order.id, OrderStatus::Paid)
            .await
            .unwrap();

        assert_eq!(paid.status, OrderStatus::Paid);
        let paid_at = paid.paid_at.expect("paid_at should be set");
        assert!(paid_at >= order.created_at);
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        db.orders()
            .transition(&order.id, OrderStatus::Shipped)
            .await
            .unwrap();

        let err = db
            .orders()
            .transition(&order.id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_terminal_status_absorbs() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        db.orders()
            .transition(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        let err = db
            .orders()
            .transition(&order.id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_payment_forces_paid() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        // Order is still PENDING; payment arrives anyway
        let payment = db
            .orders()
            .record_payment(&order.id, 1770, PaymentMethod::Yape, Some("OP-123"))
            .await
            .unwrap();
        assert_eq!(payment.amount_cents, 1770);

        let paid = db.orders().get_by_id(&order.id).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.paid_at.is_some());

        // Customer counters bumped in the same transaction
        let customer = db.customers().get_by_id(&customer_id).await.unwrap();
        assert_eq!(customer.total_purchases, 1);
        assert_eq!(customer.total_spent_cents, 1770);
        assert!(customer.last_purchase_at.is_some());
    }

    #[tokio::test]
    async fn test_payment_overrides_cancelled() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        db.orders()
            .transition(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        db.orders()
            .record_payment(&order.id, 590, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let reloaded = db.orders().get_by_id(&order.id).await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_payment_amount_validated() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        let err = db
            .orders()
            .record_payment(&order.id, 0, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
        assert!(db.orders().get_payments(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_paid_sums_payments() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        db.orders()
            .record_payment(&order.id, 1000, PaymentMethod::Cash, None)
            .await
            .unwrap();
        db.orders()
            .record_payment(&order.id, 770, PaymentMethod::Yape, None)
            .await
            .unwrap();

        assert_eq!(db.orders().total_paid(&order.id).await.unwrap(), 1770);
        assert_eq!(db.orders().get_payments(&order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_summaries_joins_customer() {
        let (db, customer_id) = setup().await;
        let (first, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();
        db.orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 2)], None, None)
            .await
            .unwrap();

        db.orders()
            .transition(&first.id, OrderStatus::Confirmed)
            .await
            .unwrap();

        let all = db.orders().list_summaries(None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].customer_name, "Ana Ruiz");
        assert_eq!(all[0].customer_phone, "+51900000000");

        let pending = db
            .orders()
            .list_summaries(Some(OrderStatus::Pending), 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);

        let mine = db.orders().list_for_customer(&customer_id).await.unwrap();
        assert_eq!(mine.len(), 2);
    }

    #[tokio::test]
    async fn test_get_details_read_model() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        let details = db.orders().get_details(&order.id).await.unwrap();
        assert_eq!(details.order.id, order.id);
        assert_eq!(details.customer.name, "Ana Ruiz");
        assert_eq!(details.lines.len(), 1);
        assert_eq!(details.lines[0].name_snapshot, "Paracetamol 500mg");
    }

    #[tokio::test]
    async fn test_get_by_number() {
        let (db, customer_id) = setup().await;
        let (order, _) = db
            .orders()
            .create_order(&customer_id, &[OrderLineInput::new("PAR500", 1)], None, None)
            .await
            .unwrap();

        let found = db.orders().get_by_number(&order.order_number).await.unwrap();
        assert_eq!(found.id, order.id);

        let err = db.orders().get_by_number("PED-unknown").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OrderNotFound { .. })
        ));
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "PED");
        assert_eq!(parts[1].len(), 14);
        assert_eq!(parts[2].len(), 4);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }
}
