//! # Order Status State Machine
//!
//! The lifecycle of an order, with an explicit transition table.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                               │
//! │                                                                     │
//! │  PENDING ──► PROFORMA_GENERATED ──► CONFIRMED ──► PAID ──► SHIPPED  │
//! │     │               │                   │           │         │     │
//! │     │               │                   │           │         ▼     │
//! │     │               │                   │           │     DELIVERED │
//! │     │               │                   │           │      (final)  │
//! │     ▼               ▼                   ▼           ▼               │
//! │  ─────────────────── CANCELLED (final) ───────────────              │
//! │                                                                     │
//! │  Rules:                                                             │
//! │  • Forward moves only, skipping ahead is allowed                    │
//! │    (e.g. PENDING ──► PAID when the customer pays on the spot)       │
//! │  • Re-entering the current status is allowed and refreshes the      │
//! │    matching timestamp (idempotent set, not additive)                │
//! │  • CANCELLED is reachable from any non-final status                 │
//! │  • DELIVERED and CANCELLED accept no further transitions            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timestamp Side Effects
//! The persistence layer sets exactly one timestamp per target status:
//! `CONFIRMED` → `confirmed_at`, `PAID` → `paid_at`, `SHIPPED` →
//! `shipped_at`. Every other target leaves the three fields untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// Stored as SCREAMING_SNAKE_CASE text in the database
/// (e.g. `PROFORMA_GENERATED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order row written, proforma not yet produced.
    Pending,
    /// Proforma document generated and sent to the customer.
    ProformaGenerated,
    /// Customer confirmed the proforma.
    Confirmed,
    /// Payment recorded against the order.
    Paid,
    /// Order handed to the courier.
    Shipped,
    /// Order received by the customer. Final.
    Delivered,
    /// Order cancelled. Final.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in forward-progression order (CANCELLED last).
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::ProformaGenerated,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Position on the forward progression. CANCELLED sits outside it.
    const fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::ProformaGenerated => Some(1),
            OrderStatus::Confirmed => Some(2),
            OrderStatus::Paid => Some(3),
            OrderStatus::Shipped => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }

    /// Whether the status accepts no further transitions.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether the order counts toward revenue.
    ///
    /// The revenue-recognized set `{PAID, SHIPPED, DELIVERED}` is the filter
    /// used by every sales aggregation in the system.
    #[inline]
    pub const fn is_revenue_recognized(self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Shipped | OrderStatus::Delivered
        )
    }

    /// Checks whether a transition from `self` to `target` is allowed.
    ///
    /// ## Transition Table
    /// - final statuses (`DELIVERED`, `CANCELLED`) reject everything;
    /// - `CANCELLED` is reachable from any non-final status;
    /// - otherwise the move must not go backward on the forward progression
    ///   (equal rank is allowed: an idempotent refresh).
    pub fn can_transition(self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == OrderStatus::Cancelled {
            return true;
        }
        match (self.rank(), target.rank()) {
            (Some(from), Some(to)) => to >= from,
            // self is non-terminal here, so both ranks exist
            _ => false,
        }
    }

    /// The database text representation (`PROFORMA_GENERATED` etc.).
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::ProformaGenerated => "PROFORMA_GENERATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_progression_allowed() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::ProformaGenerated));
        assert!(OrderStatus::ProformaGenerated.can_transition(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_transition(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition(OrderStatus::Delivered));
    }

    #[test]
    fn test_skipping_ahead_allowed() {
        // Customer pays before a proforma was ever produced
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Paid));
        assert!(OrderStatus::ProformaGenerated.can_transition(OrderStatus::Shipped));
    }

    #[test]
    fn test_backward_rejected() {
        assert!(!OrderStatus::Paid.can_transition(OrderStatus::Pending));
        assert!(!OrderStatus::Shipped.can_transition(OrderStatus::Confirmed));
        assert!(!OrderStatus::Delivered.can_transition(OrderStatus::Shipped));
    }

    #[test]
    fn test_idempotent_reentry_allowed() {
        // Re-entering CONFIRMED refreshes confirmed_at
        assert!(OrderStatus::Confirmed.can_transition(OrderStatus::Confirmed));
        assert!(OrderStatus::Paid.can_transition(OrderStatus::Paid));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::ProformaGenerated,
            OrderStatus::Confirmed,
            OrderStatus::Paid,
            OrderStatus::Shipped,
        ] {
            assert!(status.can_transition(OrderStatus::Cancelled), "{status}");
        }
    }

    #[test]
    fn test_terminal_states_absorb() {
        for target in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition(target), "{target}");
            assert!(!OrderStatus::Cancelled.can_transition(target), "{target}");
        }
    }

    #[test]
    fn test_revenue_recognized_set() {
        assert!(OrderStatus::Paid.is_revenue_recognized());
        assert!(OrderStatus::Shipped.is_revenue_recognized());
        assert!(OrderStatus::Delivered.is_revenue_recognized());

        assert!(!OrderStatus::Pending.is_revenue_recognized());
        assert!(!OrderStatus::ProformaGenerated.is_revenue_recognized());
        assert!(!OrderStatus::Confirmed.is_revenue_recognized());
        assert!(!OrderStatus::Cancelled.is_revenue_recognized());
    }

    #[test]
    fn test_as_str_roundtrip_with_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }
}
