//! # Order Draft (Cart)
//!
//! An in-memory order draft built up line by line before it is persisted.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Draft to Order                                │
//! │                                                                     │
//! │   add_item(PAR500, 3) ──► add_item(AMX500, 1) ──► totals()          │
//! │          │                      │                    │              │
//! │          ▼                      ▼                    ▼              │
//! │   stock + limit checks    merge duplicates     subtotal/IGV/total   │
//! │                                                      │              │
//! │                                                      ▼              │
//! │                                   OrderRepository::create_order     │
//! │                                   (one transaction, then the        │
//! │                                    draft is discarded)              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The draft holds price and name snapshots taken from the catalog at
//! add time; the persisted order freezes those snapshots permanently.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::Medicine;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// One line of an order draft, carrying a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub medicine_id: String,
    /// Medicine code at add time.
    pub code: String,
    /// Medicine name at add time.
    pub name: String,
    /// Unit price in céntimos at add time.
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Stock observed at add time, re-checked as quantity grows.
    pub available_stock: i64,
}

impl CartItem {
    /// unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// The money summary of a draft or order: subtotal, IGV, grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl OrderTotals {
    /// Derives IGV and grand total from a subtotal.
    ///
    /// This is the single place totals are computed; both the draft and the
    /// persistence layer call it so the stored snapshot always matches.
    ///
    /// ## Example
    /// ```rust
    /// use botica_core::cart::OrderTotals;
    /// use botica_core::money::Money;
    ///
    /// let totals = OrderTotals::from_subtotal(Money::from_cents(1500));
    /// assert_eq!(totals.tax_cents, 270);
    /// assert_eq!(totals.total_cents, 1770);
    /// ```
    pub fn from_subtotal(subtotal: Money) -> Self {
        let tax = subtotal.igv();
        OrderTotals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: (subtotal + tax).cents(),
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// An order draft.
///
/// Items are kept in insertion order; adding the same medicine twice merges
/// into one line. All mutations re-check stock and the cart limits, so a
/// draft that exists is always persistable (modulo concurrent stock changes,
/// which the persistence layer re-checks inside its transaction).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds a quantity of a medicine, merging with an existing line.
    ///
    /// ## Errors
    /// - [`CoreError::InsufficientStock`] when the merged quantity exceeds
    ///   the stock observed on `medicine`
    /// - [`CoreError::QuantityTooLarge`] when the merged quantity exceeds
    ///   the per-item limit
    /// - [`CoreError::CartTooLarge`] when a new line would exceed the
    ///   distinct-item limit
    pub fn add_item(&mut self, medicine: &Medicine, quantity: i64) -> Result<(), CoreError> {
        if quantity <= 0 {
            return Err(crate::error::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let merged_quantity = self
            .items
            .iter()
            .find(|item| item.medicine_id == medicine.id)
            .map_or(quantity, |item| item.quantity + quantity);

        if merged_quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: merged_quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if !medicine.has_stock_for(merged_quantity) {
            return Err(CoreError::InsufficientStock {
                code: medicine.code.clone(),
                available: medicine.stock,
                requested: merged_quantity,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.medicine_id == medicine.id) {
            item.quantity = merged_quantity;
            item.available_stock = medicine.stock;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        self.items.push(CartItem {
            medicine_id: medicine.id.clone(),
            code: medicine.code.clone(),
            name: medicine.name.clone(),
            unit_price_cents: medicine.unit_price_cents,
            quantity,
            available_stock: medicine.stock,
        });
        Ok(())
    }

    /// Removes a line by medicine id. Unknown ids are a no-op.
    pub fn remove_item(&mut self, medicine_id: &str) {
        self.items.retain(|item| item.medicine_id != medicine_id);
    }

    /// Replaces the quantity of an existing line. Zero removes the line.
    pub fn set_quantity(&mut self, medicine_id: &str, quantity: i64) -> Result<(), CoreError> {
        if quantity < 0 {
            return Err(crate::error::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if quantity == 0 {
            self.remove_item(medicine_id);
            return Ok(());
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.medicine_id == medicine_id)
            .ok_or_else(|| CoreError::MedicineNotFound {
                code: medicine_id.to_string(),
            })?;

        if quantity > item.available_stock {
            return Err(CoreError::InsufficientStock {
                code: item.code.clone(),
                available: item.available_stock,
                requested: quantity,
            });
        }
        item.quantity = quantity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    pub fn total_units(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line totals, before tax.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.line_total())
    }

    /// Computes subtotal, IGV and grand total for the draft.
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_subtotal(self.subtotal())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn medicine(id: &str, code: &str, price_cents: i64, stock: i64) -> Medicine {
        Medicine {
            id: id.into(),
            code: code.into(),
            name: format!("{code} test"),
            description: None,
            category: "Analgésicos".into(),
            laboratory: None,
            active_ingredient: None,
            concentration: None,
            presentation: None,
            unit_price_cents: price_cents,
            stock,
            min_stock: 5,
            requires_prescription: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_and_totals_end_to_end() {
        // PAR500, qty 3 at S/ 5.00 → 15.00 / 2.70 / 17.70
        let mut cart = Cart::new();
        cart.add_item(&medicine("m1", "PAR500", 500, 50), 3).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 1500);
        assert_eq!(totals.tax_cents, 270);
        assert_eq!(totals.total_cents, 1770);
    }

    #[test]
    fn test_duplicate_add_merges() {
        let mut cart = Cart::new();
        let med = medicine("m1", "PAR500", 500, 50);
        cart.add_item(&med, 2).unwrap();
        cart.add_item(&med, 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total_units(), 5);
    }

    #[test]
    fn test_stock_checked_on_merge() {
        let mut cart = Cart::new();
        let med = medicine("m1", "PAR500", 500, 4);
        cart.add_item(&med, 3).unwrap();

        let err = cart.add_item(&med, 2).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                code: "PAR500".into(),
                available: 4,
                requested: 5,
            }
        );
        // Failed add leaves the line untouched
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let med = medicine("m1", "PAR500", 500, 50);
        assert!(cart.add_item(&med, 0).is_err());
        assert!(cart.add_item(&med, -1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new();
        let med = medicine("m1", "PAR500", 500, 100_000);
        let err = cart.add_item(&med, MAX_ITEM_QUANTITY + 1).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }

    #[test]
    fn test_distinct_item_limit() {
        let mut cart = Cart::new();
        for n in 0..MAX_CART_ITEMS {
            let med = medicine(&format!("m{n}"), &format!("MED{n:03}"), 100, 10);
            cart.add_item(&med, 1).unwrap();
        }
        let extra = medicine("overflow", "MEDX", 100, 10);
        let err = cart.add_item(&extra, 1).unwrap_err();
        assert_eq!(err, CoreError::CartTooLarge { max: MAX_CART_ITEMS });
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        let med = medicine("m1", "PAR500", 500, 50);
        cart.add_item(&med, 2).unwrap();

        cart.set_quantity("m1", 7).unwrap();
        assert_eq!(cart.items()[0].quantity, 7);

        // Zero removes
        cart.set_quantity("m1", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_item() {
        let mut cart = Cart::new();
        let err = cart.set_quantity("ghost", 1).unwrap_err();
        assert!(matches!(err, CoreError::MedicineNotFound { .. }));
    }

    #[test]
    fn test_multi_item_subtotal() {
        let mut cart = Cart::new();
        cart.add_item(&medicine("m1", "PAR500", 500, 50), 3).unwrap();
        cart.add_item(&medicine("m2", "AMX500", 1250, 20), 2).unwrap();

        // 3×500 + 2×1250 = 4000
        assert_eq!(cart.subtotal().cents(), 4000);
        assert_eq!(cart.totals().tax_cents, 720);
        assert_eq!(cart.totals().total_cents, 4720);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let cart = Cart::new();
        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 0);
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, 0);
    }
}
