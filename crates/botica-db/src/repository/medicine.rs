//! # Medicine Repository
//!
//! Catalog CRUD and stock management.
//!
//! ## Stock Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Stock Changes                                 │
//! │                                                                     │
//! │  Every stock change goes through adjust_stock(), which writes       │
//! │  the new level AND an append-only stock_movements row in one        │
//! │  transaction. The history feeds the inventory report.               │
//! │                                                                     │
//! │  adjust_stock(id, Entry, 50)  → stock += 50, movement logged        │
//! │  adjust_stock(id, Exit, 3)    → stock -= 3,  movement logged        │
//! │                                  (rejected if it would go negative) │
//! │                                                                     │
//! │  Order creation only VERIFIES sufficiency; it never debits here.    │
//! │  Dispatch debits stock through adjust_stock(Exit) when the order    │
//! │  actually leaves the shelf.                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use botica_core::{CoreError, Medicine, MovementKind, NewMedicine, StockMovement};

/// Repository for medicine catalog operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Creates a catalog entry from validated input.
    ///
    /// ## Errors
    /// - `DbError::Domain` on validation failure
    /// - `DbError::UniqueViolation` when the code is already taken
    pub async fn create(&self, input: &NewMedicine) -> DbResult<Medicine> {
        input.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let medicine = Medicine {
            id: Uuid::new_v4().to_string(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            category: input.category.trim().to_string(),
            laboratory: input.laboratory.clone(),
            active_ingredient: input.active_ingredient.clone(),
            concentration: input.concentration.clone(),
            presentation: input.presentation.clone(),
            unit_price_cents: input.unit_price_cents,
            stock: input.stock,
            min_stock: input.min_stock,
            requires_prescription: input.requires_prescription,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %medicine.id, code = %medicine.code, "Creating medicine");

        sqlx::query(
            r#"
            INSERT INTO medicines (
                id, code, name, description, category,
                laboratory, active_ingredient, concentration, presentation,
                unit_price_cents, stock, min_stock,
                requires_prescription, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&medicine.id)
        .bind(&medicine.code)
        .bind(&medicine.name)
        .bind(&medicine.description)
        .bind(&medicine.category)
        .bind(&medicine.laboratory)
        .bind(&medicine.active_ingredient)
        .bind(&medicine.concentration)
        .bind(&medicine.presentation)
        .bind(medicine.unit_price_cents)
        .bind(medicine.stock)
        .bind(medicine.min_stock)
        .bind(medicine.requires_prescription)
        .bind(medicine.is_active)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(medicine)
    }

    /// Gets a medicine by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Medicine> {
        let medicine = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE code = ?1",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        medicine.ok_or_else(|| {
            DbError::Domain(CoreError::MedicineNotFound {
                code: code.to_string(),
            })
        })
    }

    /// Gets a medicine by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Medicine> {
        let medicine = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        medicine.ok_or_else(|| DbError::not_found("Medicine", id))
    }

    /// Lists active medicines ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Lists medicines the order form can actually sell: active and in
    /// stock, ordered by category then name.
    pub async fn list_available(&self) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE is_active = 1 AND stock > 0 ORDER BY category, name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Whether `quantity` units of a medicine can be promised right now.
    ///
    /// An unknown or inactive id reads as insufficient, not as an error,
    /// so the order form can treat the answer as a plain yes/no.
    pub async fn has_sufficient_stock(&self, id: &str, quantity: i64) -> DbResult<bool> {
        let stock: Option<i64> = sqlx::query_scalar(
            "SELECT stock FROM medicines WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match stock {
            Some(stock) => quantity > 0 && quantity <= stock,
            None => false,
        })
    }

    /// Lists active medicines of a category, ordered by name.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE is_active = 1 AND category = ?1 ORDER BY name",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Distinct categories among active medicines, for catalog browsing.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM medicines WHERE is_active = 1 ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Searches active medicines by name, code or active ingredient.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Medicine>> {
        let pattern = format!("%{}%", query.trim());

        let medicines = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT * FROM medicines
            WHERE is_active = 1
              AND (name LIKE ?1 OR code LIKE ?1 OR active_ingredient LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Updates the unit price of a medicine.
    ///
    /// Existing order lines keep their price snapshots.
    pub async fn update_price(&self, id: &str, unit_price_cents: i64) -> DbResult<()> {
        botica_core::validation::validate_price_cents(unit_price_cents)
            .map_err(CoreError::from)?;

        let result = sqlx::query(
            "UPDATE medicines SET unit_price_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(unit_price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        Ok(())
    }

    /// Adjusts stock and logs the movement in one transaction.
    ///
    /// `quantity` is always positive; `kind` carries the direction. An
    /// `Adjustment` sets the level to `quantity` directly.
    ///
    /// ## Errors
    /// - `DbError::Domain(InsufficientStock)` when an exit would drive the
    ///   level negative
    pub async fn adjust_stock(
        &self,
        id: &str,
        kind: MovementKind,
        quantity: i64,
        note: Option<&str>,
    ) -> DbResult<StockMovement> {
        if quantity <= 0 {
            return Err(DbError::Domain(
                botica_core::ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let medicine = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Medicine", id))?;

        let stock_after = match kind {
            MovementKind::Entry => medicine.stock + quantity,
            MovementKind::Exit => {
                if quantity > medicine.stock {
                    return Err(DbError::Domain(CoreError::InsufficientStock {
                        code: medicine.code.clone(),
                        available: medicine.stock,
                        requested: quantity,
                    }));
                }
                medicine.stock - quantity
            }
            MovementKind::Adjustment => quantity,
        };

        let now = Utc::now();

        sqlx::query("UPDATE medicines SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stock_after)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            medicine_id: id.to_string(),
            kind,
            quantity,
            stock_before: medicine.stock,
            stock_after,
            note: note.map(str::to_string),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, medicine_id, kind, quantity,
                stock_before, stock_after, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.medicine_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(&movement.note)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            id = %id,
            before = movement.stock_before,
            after = movement.stock_after,
            "Stock adjusted"
        );

        Ok(movement)
    }

    /// Soft-deletes or restores a catalog entry.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE medicines SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        Ok(())
    }

    /// Active medicines at or below their minimum stock level.
    pub async fn low_stock(&self) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(
            "SELECT * FROM medicines WHERE is_active = 1 AND stock <= min_stock ORDER BY stock",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Stock movement history for a medicine, newest first.
    pub async fn movements(&self, medicine_id: &str, limit: i64) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE medicine_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(medicine_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
