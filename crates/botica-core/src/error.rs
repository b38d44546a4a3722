//! # Domain Errors
//!
//! Error types for business-rule violations. These are the errors a caller
//! can act on (show to the operator, reject the request); infrastructure
//! failures live in the database crate.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Error Propagation                            │
//! │                                                                     │
//! │   validation rule ──► ValidationError ──► CoreError::Validation     │
//! │   stock check     ──► CoreError::InsufficientStock                  │
//! │   state machine   ──► CoreError::InvalidTransition                  │
//! │                                                                     │
//! │   botica-db wraps CoreError in DbError::Domain so repository        │
//! │   callers see one error type.                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::status::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule errors for the order domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No catalog entry with the given code.
    #[error("medicine not found: {code}")]
    MedicineNotFound { code: String },

    /// Requested quantity exceeds what is on hand.
    #[error("insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// No order with the given identifier or order number.
    #[error("order not found: {reference}")]
    OrderNotFound { reference: String },

    /// No customer with the given identifier or phone.
    #[error("customer not found: {reference}")]
    CustomerNotFound { reference: String },

    /// The state machine rejects this move.
    #[error("invalid order transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// An order must carry at least one line.
    #[error("order has no line items")]
    EmptyOrder,

    /// The draft holds more distinct items than allowed.
    #[error("cart exceeds {max} distinct items")]
    CartTooLarge { max: usize },

    /// A single line asks for more units than allowed.
    #[error("quantity {requested} exceeds the per-item limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Payment amount must be positive.
    #[error("invalid payment amount: {cents} céntimos")]
    InvalidPaymentAmount { cents: i64 },

    /// Input failed a field-level validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation failures.
///
/// Each variant names the offending field so callers can highlight it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Field is empty or whitespace-only.
    #[error("{field} is required")]
    Required { field: String },

    /// Field exceeds its maximum length.
    #[error("{field} exceeds {max} characters")]
    TooLong { field: String, max: usize },

    /// Field does not match the expected shape.
    #[error("{field} is invalid: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value falls outside an accepted range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Unit Tests
// =============================================================================
