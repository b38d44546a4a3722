//! # Domain Types
//!
//! Core domain types used throughout Botica.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐         │
//! │  │   Customer    │   │   Medicine    │   │     Order     │         │
//! │  │ ───────────── │   │ ───────────── │   │ ───────────── │         │
//! │  │ id (UUID)     │   │ id (UUID)     │   │ id (UUID)     │         │
//! │  │ phone (key)   │   │ code (key)    │   │ order_number  │         │
//! │  │ name, address │   │ stock, price  │   │ status        │         │
//! │  └───────────────┘   └───────────────┘   │ totals        │         │
//! │                                          └───────┬───────┘         │
//! │                                                  │ owns            │
//! │                            ┌─────────────────────┼──────────┐      │
//! │                            ▼                                ▼      │
//! │                      ┌───────────┐                  ┌─────────────┐│
//! │                      │ OrderLine │                  │PaymentRecord││
//! │                      │ snapshot  │                  │ forces PAID ││
//! │                      └───────────┘                  └─────────────┘│
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: phone (customer), code (medicine), order_number (order)
//!
//! ## Snapshot Pattern
//! `OrderLine` freezes the medicine's code, name and unit price at order
//! time, so historical orders are immune to later catalog edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::OrderStatus;
use crate::DEFAULT_LOCATION;

// =============================================================================
// Customer
// =============================================================================

/// A registered customer.
///
/// Looked up by phone on every order; created on the first one. The
/// lifetime counters (`total_purchases`, `total_spent_cents`,
/// `last_purchase_at`) are bumped by the payment flow and feed the
/// customer report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Phone number - the natural lookup key, unique.
    pub phone: String,

    /// Full name.
    pub name: String,

    pub email: Option<String>,

    /// Shipping address.
    pub address: String,

    /// Free-text landmark reference ("frente al parque").
    pub reference: Option<String>,

    pub district: String,
    pub province: String,
    pub department: String,

    /// Lifetime number of paid orders.
    pub total_purchases: i64,

    /// Lifetime amount paid in céntimos.
    pub total_spent_cents: i64,

    pub last_purchase_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the lifetime spend as Money.
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }

    /// Classifies the customer by purchase history.
    #[inline]
    pub fn tier(&self) -> CustomerTier {
        CustomerTier::for_purchases(self.total_purchases)
    }
}

/// Input for registering a new customer.
///
/// Name, phone and address are required; the administrative levels default
/// to "Lima" when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub reference: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub department: Option<String>,
}

impl NewCustomer {
    /// District falling back to the default catchment area.
    pub fn district_or_default(&self) -> &str {
        self.district.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    pub fn province_or_default(&self) -> &str {
        self.province.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    pub fn department_or_default(&self) -> &str {
        self.department.as_deref().unwrap_or(DEFAULT_LOCATION)
    }
}

// =============================================================================
// Customer Tier
// =============================================================================

/// Purchase-history classification used by the customer report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerTier {
    /// 10 or more purchases.
    Vip,
    /// 5 to 9 purchases.
    Frequent,
    /// Fewer than 5 purchases.
    Regular,
}

impl CustomerTier {
    /// Classifies by lifetime purchase count.
    pub const fn for_purchases(total_purchases: i64) -> Self {
        if total_purchases >= 10 {
            CustomerTier::Vip
        } else if total_purchases >= 5 {
            CustomerTier::Frequent
        } else {
            CustomerTier::Regular
        }
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code - unique, human-readable (e.g. "PAR500").
    pub code: String,

    pub name: String,
    pub description: Option<String>,

    /// Category used for catalog browsing and sales-by-category reports.
    pub category: String,

    pub laboratory: Option<String>,
    pub active_ingredient: Option<String>,
    pub concentration: Option<String>,
    pub presentation: Option<String>,

    /// Unit price in céntimos (non-negative).
    pub unit_price_cents: i64,

    /// Current stock level (never negative).
    pub stock: i64,

    /// Threshold below which the dashboard flags the medicine.
    pub min_stock: i64,

    pub requires_prescription: bool,

    /// Soft-delete flag.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Whether stock has fallen to or below the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Whether the requested quantity can be served from current stock.
    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }
}

/// Input for creating a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicine {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub laboratory: Option<String>,
    pub active_ingredient: Option<String>,
    pub concentration: Option<String>,
    pub presentation: Option<String>,
    pub unit_price_cents: i64,
    pub stock: i64,
    pub min_stock: i64,
    pub requires_prescription: bool,
}

// =============================================================================
// Order
// =============================================================================

/// An order header.
///
/// Subtotal, tax and total are snapshotted at creation and never recomputed,
/// even if catalog prices later change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,

    /// Globally unique, human-readable (`PED-20260824153000-0421`).
    pub order_number: String,

    pub customer_id: String,

    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub status: OrderStatus,

    /// Shipping address snapshot taken from the customer at order time.
    pub shipping_address: String,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    /// Set when the order first transitions to CONFIRMED.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Set when the order transitions to PAID.
    pub paid_at: Option<DateTime<Utc>>,
    /// Set when the order transitions to SHIPPED.
    pub shipped_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze medicine data at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub medicine_id: String,
    /// Medicine code at order time (frozen).
    pub code_snapshot: String,
    /// Medicine name at order time (frozen).
    pub name_snapshot: String,
    /// Quantity ordered (positive).
    pub quantity: i64,
    /// Unit price in céntimos at order time (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cash,
    /// Yape mobile wallet.
    Yape,
    /// Plin mobile wallet.
    Plin,
    /// Bank transfer.
    BankTransfer,
    /// Card payment on an external terminal.
    Card,
}

/// A payment recorded against an order.
///
/// Recording a payment is the trigger that forces the owning order to PAID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: String,
    pub order_id: String,
    /// Amount paid in céntimos.
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// External reference (operation number, auth code).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Notification Event
// =============================================================================

/// Category tag for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// Proforma generated and ready for review.
    Proforma,
    /// Payment received, voucher available.
    PaymentReceived,
    /// Order handed to the courier.
    Shipped,
    /// Order delivered.
    Delivered,
}

/// An outbound message event - append-only audit row.
///
/// Delivery itself is handled by an external channel; this row only records
/// that a send was attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct NotificationEvent {
    pub id: String,
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub phone: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Stock received from a supplier.
    Entry,
    /// Stock leaving the pharmacy (dispatch, loss).
    Exit,
    /// Manual correction.
    Adjustment,
}

/// A stock-history row - append-only, read by reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub medicine_id: String,
    pub kind: MovementKind,
    /// Magnitude of the change (always positive; `kind` carries direction).
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_tier_thresholds() {
        assert_eq!(CustomerTier::for_purchases(0), CustomerTier::Regular);
        assert_eq!(CustomerTier::for_purchases(4), CustomerTier::Regular);
        assert_eq!(CustomerTier::for_purchases(5), CustomerTier::Frequent);
        assert_eq!(CustomerTier::for_purchases(9), CustomerTier::Frequent);
        assert_eq!(CustomerTier::for_purchases(10), CustomerTier::Vip);
        assert_eq!(CustomerTier::for_purchases(100), CustomerTier::Vip);
    }

    #[test]
    fn test_new_customer_location_defaults() {
        let input = NewCustomer {
            name: "Ana Ruiz".into(),
            phone: "+51900000000".into(),
            email: None,
            address: "Av. X 123".into(),
            reference: None,
            district: None,
            province: None,
            department: None,
        };
        assert_eq!(input.district_or_default(), "Lima");
        assert_eq!(input.province_or_default(), "Lima");
        assert_eq!(input.department_or_default(), "Lima");

        let with_district = NewCustomer {
            district: Some("Miraflores".into()),
            ..input
        };
        assert_eq!(with_district.district_or_default(), "Miraflores");
        assert_eq!(with_district.province_or_default(), "Lima");
    }

    #[test]
    fn test_medicine_stock_helpers() {
        let med = Medicine {
            id: "m1".into(),
            code: "PAR500".into(),
            name: "Paracetamol 500mg".into(),
            description: None,
            category: "Analgésicos".into(),
            laboratory: None,
            active_ingredient: Some("Paracetamol".into()),
            concentration: Some("500mg".into()),
            presentation: Some("Caja x 20".into()),
            unit_price_cents: 500,
            stock: 8,
            min_stock: 10,
            requires_prescription: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(med.is_low_stock());
        assert!(med.has_stock_for(8));
        assert!(!med.has_stock_for(9));
    }
}
