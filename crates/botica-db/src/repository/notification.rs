//! # Notification Repository
//!
//! Append-only audit log for outbound customer messages.
//!
//! ## Scope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Notification Flow                                │
//! │                                                                     │
//! │  Order event (proforma / payment / shipped / delivered)             │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  notify_*() → builds the message text → send()                      │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  notifications table (append-only)                                  │
//! │                                                                     │
//! │  send() is fire-and-forget: a failure is logged and reported as     │
//! │  `false`, never as an error, so a broken audit write cannot abort   │
//! │  the order flow that triggered it.                                  │
//! │                                                                     │
//! │  Actual delivery happens on an external channel; this table only    │
//! │  records that a send was attempted, for the audit trail.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbResult;
use botica_core::{Customer, NotificationEvent, NotificationKind, Order};

/// Repository for the outbound-message audit log.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Records an outbound message.
    pub async fn record(
        &self,
        order_id: Option<&str>,
        customer_id: Option<&str>,
        phone: &str,
        kind: NotificationKind,
        message: &str,
    ) -> DbResult<NotificationEvent> {
        let event = NotificationEvent {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.map(str::to_string),
            customer_id: customer_id.map(str::to_string),
            phone: phone.to_string(),
            kind,
            message: message.to_string(),
            created_at: Utc::now(),
        };

        debug!(phone = %event.phone, kind = ?kind, "Recording notification");

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, order_id, customer_id, phone, kind, message, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&event.id)
        .bind(&event.order_id)
        .bind(&event.customer_id)
        .bind(&event.phone)
        .bind(event.kind)
        .bind(&event.message)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    /// Fire-and-forget variant of [`record`](Self::record).
    ///
    /// A notification is a side channel of whatever flow triggered it, so a
    /// failed audit write is logged and reported as `false` instead of
    /// aborting the caller.
    pub async fn send(
        &self,
        order_id: Option<&str>,
        customer_id: Option<&str>,
        phone: &str,
        kind: NotificationKind,
        message: &str,
    ) -> bool {
        match self.record(order_id, customer_id, phone, kind, message).await {
            Ok(_) => true,
            Err(err) => {
                warn!(phone = %phone, kind = ?kind, error = %err, "Notification not recorded");
                false
            }
        }
    }

    /// Sends the proforma-ready message for an order.
    pub async fn notify_proforma(&self, order: &Order, customer: &Customer) -> bool {
        let message = format!(
            "Hola {}! Tu proforma {} está lista. Total: {}. Responde para confirmar tu pedido.",
            customer.name,
            order.order_number,
            order.total(),
        );
        self.send(
            Some(&order.id),
            Some(&customer.id),
            &customer.phone,
            NotificationKind::Proforma,
            &message,
        )
        .await
    }

    /// Sends the payment-received message for an order.
    pub async fn notify_payment_received(&self, order: &Order, customer: &Customer) -> bool {
        let message = format!(
            "Hola {}! Recibimos tu pago de {} por el pedido {}. Pronto coordinamos el envío.",
            customer.name,
            order.total(),
            order.order_number,
        );
        self.send(
            Some(&order.id),
            Some(&customer.id),
            &customer.phone,
            NotificationKind::PaymentReceived,
            &message,
        )
        .await
    }

    /// Sends the order-shipped message.
    pub async fn notify_shipped(&self, order: &Order, customer: &Customer) -> bool {
        let message = format!(
            "Hola {}! Tu pedido {} salió en camino a: {}.",
            customer.name, order.order_number, order.shipping_address,
        );
        self.send(
            Some(&order.id),
            Some(&customer.id),
            &customer.phone,
            NotificationKind::Shipped,
            &message,
        )
        .await
    }

    /// Sends the order-delivered message.
    pub async fn notify_delivered(&self, order: &Order, customer: &Customer) -> bool {
        let message = format!(
            "Hola {}! Tu pedido {} fue entregado. Gracias por tu compra!",
            customer.name, order.order_number,
        );
        self.send(
            Some(&order.id),
            Some(&customer.id),
            &customer.phone,
            NotificationKind::Delivered,
            &message,
        )
        .await
    }

    /// All messages recorded for an order, oldest first.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<NotificationEvent>> {
        let events = sqlx::query_as::<_, NotificationEvent>(
            "SELECT * FROM notifications WHERE order_id = ?1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Most recently recorded messages.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<NotificationEvent>> {
        let events = sqlx::query_as::<_, NotificationEvent>(
            "SELECT * FROM notifications ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::repository::order::OrderLineInput;
    use botica_core::{NewCustomer, NewMedicine, NotificationKind};

    async fn setup() -> (Database, botica_core::Customer, botica_core::Order) {
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
                active_ingredient: None,
                concentration: None,
                presentation: None,
                unit_price_cents: 500,
                stock: 100,
                min_stock: 10,
                requires_prescription: false,
            })
            .await
            .unwrap();

        let (order, _) = db
            .orders()
            .create_order(&customer.id, &[OrderLineInput::new("PAR500", 3)], None, None)
            .await
            .unwrap();

        (db, customer, order)
    }

    #[tokio::test]
    async fn test_proforma_message_carries_total() {
        let (db, customer, order) = setup().await;

        assert!(db.notifications().notify_proforma(&order, &customer).await);

        let trail = db.notifications().list_for_order(&order.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        let event = &trail[0];
        assert_eq!(event.kind, NotificationKind::Proforma);
        assert_eq!(event.phone, "+51900000000");
        assert!(event.message.contains(&order.order_number));
        assert!(event.message.contains("S/ 17.70"));
    }

    #[tokio::test]
    async fn test_order_audit_trail_in_sequence() {
        let (db, customer, order) = setup().await;

        assert!(db.notifications().notify_proforma(&order, &customer).await);
        assert!(db.notifications().notify_payment_received(&order, &customer).await);
        assert!(db.notifications().notify_shipped(&order, &customer).await);
        assert!(db.notifications().notify_delivered(&order, &customer).await);

        let trail = db.notifications().list_for_order(&order.id).await.unwrap();
        assert_eq!(trail.len(), 4);
        assert_eq!(trail[0].kind, NotificationKind::Proforma);
        assert_eq!(trail[3].kind, NotificationKind::Delivered);
    }

    #[tokio::test]
    async fn test_send_failure_reports_false() {
        let (db, _, order) = setup().await;

        // Unknown order id violates the FK; send swallows it and says false
        let ok = db
            .notifications()
            .send(
                Some("no-such-order"),
                None,
                "+51900000000",
                NotificationKind::Shipped,
                "hola",
            )
            .await;
        assert!(!ok);
        assert!(db.notifications().list_for_order(&order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_without_order_context() {
        let (db, _, _) = setup().await;

        // Broadcast messages have no order behind them
        let event = db
            .notifications()
            .record(None, None, "+51911111111", NotificationKind::Proforma, "hola")
            .await
            .unwrap();
        assert!(event.order_id.is_none());

        let recent = db.notifications().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
    }
}
