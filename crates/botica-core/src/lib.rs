//! # botica-core: Pure Business Logic for Botica
//!
//! This crate is the heart of the Botica order-management backend. It
//! contains all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Botica Architecture                           │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │               Presentation Layer (out of scope)               │ │
//! │  │   Order forms ──► Catalog browser ──► Reports ──► Vouchers    │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │                 ★ botica-core (THIS CRATE) ★                  │ │
//! │  │                                                               │ │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐ │ │
//! │  │   │  types  │ │  money  │ │ status  │ │  cart   │ │ valid. │ │ │
//! │  │   │Customer │ │  Money  │ │  Order  │ │  Cart   │ │ rules  │ │ │
//! │  │   │Medicine │ │  IGV    │ │ machine │ │ Totals  │ │ checks │ │ │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └────────┘ │ │
//! │  │                                                               │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │                  botica-db (Database Layer)                   │ │
//! │  │           SQLite queries, migrations, repositories            │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Medicine, Order, OrderLine, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`status`] - Order status state machine with an explicit transition table
//! - [`cart`] - Per-session order draft and totals computation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use botica_core::money::Money;
//! use botica_core::cart::OrderTotals;
//!
//! // Create money from céntimos (never from floats!)
//! let subtotal = Money::from_cents(1500); // S/ 15.00
//!
//! // IGV at the fixed 18% rate
//! let totals = OrderTotals::from_subtotal(subtotal);
//! assert_eq!(totals.tax_cents, 270);   // S/ 2.70
//! assert_eq!(totals.total_cents, 1770); // S/ 17.70
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, OrderTotals};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use status::OrderStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// IGV (Peruvian VAT) rate in basis points: 1800 = 18%.
///
/// Applied to every order's subtotal. The rate is snapshotted into the order
/// totals at creation time and never recomputed afterward.
pub const IGV_RATE_BPS: u32 = 1800;

/// Default district/province/department when a customer omits them.
///
/// The pharmacy's catchment area is metropolitan Lima, so all three
/// administrative levels default to "Lima".
pub const DEFAULT_LOCATION: &str = "Lima";

/// Maximum distinct line items allowed in a single order draft.
///
/// Prevents runaway carts and keeps voucher documents to a sane size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single medicine in an order draft.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Prefix for generated order numbers (`PED-<timestamp>-<suffix>`).
pub const ORDER_NUMBER_PREFIX: &str = "PED";
