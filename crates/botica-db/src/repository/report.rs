//! # Report Repository
//!
//! Read-only aggregations for the sales and inventory dashboards.
//!
//! ## Revenue Recognition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Which Orders Count As Revenue?                      │
//! │                                                                     │
//! │  PENDING             ✗  nothing committed yet                       │
//! │  PROFORMA_GENERATED  ✗  quote only                                  │
//! │  CONFIRMED           ✗  promised, not paid                          │
//! │  PAID                ✓                                              │
//! │  SHIPPED             ✓                                              │
//! │  DELIVERED           ✓                                              │
//! │  CANCELLED           ✗                                              │
//! │                                                                     │
//! │  Every aggregation in this module filters on the same set, so the   │
//! │  daily chart, the category ranking and the dashboard figure always  │
//! │  agree with each other.                                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;
use botica_core::{CustomerTier, Money, MovementKind};

/// SQL fragment for the revenue-recognized status set.
///
/// Keep in sync with `OrderStatus::is_revenue_recognized`.
const REVENUE_STATUSES: &str = "('PAID', 'SHIPPED', 'DELIVERED')";

// =============================================================================
// Report Row Types
// =============================================================================

/// One day of sales activity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailySales {
    /// Calendar day, `YYYY-MM-DD`.
    pub day: String,
    pub order_count: i64,
    pub revenue_cents: i64,
}

impl DailySales {
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

/// Sales ranking entry for one medicine.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicineSales {
    pub code: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Sales aggregated by catalog category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategorySales {
    pub category: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Customer ranking entry with lifetime figures.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerSales {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub total_purchases: i64,
    pub total_spent_cents: i64,
}

impl CustomerSales {
    /// Classification used by the customer report.
    pub fn tier(&self) -> CustomerTier {
        CustomerTier::for_purchases(self.total_purchases)
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    /// Orders created today (any status).
    pub orders_today: i64,
    /// Revenue-recognized total for orders created today.
    pub revenue_today_cents: i64,
    /// Orders created this calendar month (any status).
    pub orders_this_month: i64,
    /// Revenue-recognized total for orders created this calendar month.
    pub revenue_this_month_cents: i64,
    /// Orders still waiting for a proforma or confirmation.
    pub open_orders: i64,
    /// Active medicines at or below their minimum stock.
    pub low_stock_medicines: i64,
    /// Registered customers.
    pub total_customers: i64,
}

/// One row of the inventory-movement log, with the catalog entry joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovementLogEntry {
    pub code: String,
    pub name: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Count of orders per status.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub order_count: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reporting aggregations. Read-only.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue and order count per day over the last `days` days.
    ///
    /// Days without any revenue-recognized order are absent from the result.
    pub async fn daily_sales(&self, days: i64) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(&format!(
            r#"
            SELECT
                DATE(created_at) AS day,
                COUNT(*) AS order_count,
                SUM(total_cents) AS revenue_cents
            FROM orders
            WHERE status IN {REVENUE_STATUSES}
              AND DATE(created_at) >= DATE('now', '-' || ?1 || ' days')
            GROUP BY DATE(created_at)
            ORDER BY day
            "#
        ))
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Best-selling medicines over the last `days` days, by units sold.
    pub async fn top_medicines(&self, days: i64, limit: i64) -> DbResult<Vec<MedicineSales>> {
        let rows = sqlx::query_as::<_, MedicineSales>(&format!(
            r#"
            SELECT
                l.code_snapshot AS code,
                l.name_snapshot AS name,
                SUM(l.quantity) AS units_sold,
                SUM(l.line_total_cents) AS revenue_cents
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            WHERE o.status IN {REVENUE_STATUSES}
              AND DATE(o.created_at) >= DATE('now', '-' || ?1 || ' days')
            GROUP BY l.code_snapshot, l.name_snapshot
            ORDER BY units_sold DESC, revenue_cents DESC
            LIMIT ?2
            "#
        ))
        .bind(days)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sales grouped by catalog category over the last `days` days.
    ///
    /// Categories come from the current catalog row, not a snapshot, so a
    /// recategorized medicine moves its history with it.
    pub async fn sales_by_category(&self, days: i64) -> DbResult<Vec<CategorySales>> {
        let rows = sqlx::query_as::<_, CategorySales>(&format!(
            r#"
            SELECT
                m.category AS category,
                SUM(l.quantity) AS units_sold,
                SUM(l.line_total_cents) AS revenue_cents
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            JOIN medicines m ON m.id = l.medicine_id
            WHERE o.status IN {REVENUE_STATUSES}
              AND DATE(o.created_at) >= DATE('now', '-' || ?1 || ' days')
            GROUP BY m.category
            ORDER BY revenue_cents DESC
            "#
        ))
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Customers ranked by lifetime spend.
    pub async fn top_customers(&self, limit: i64) -> DbResult<Vec<CustomerSales>> {
        let rows = sqlx::query_as::<_, CustomerSales>(
            r#"
            SELECT id, name, phone, total_purchases, total_spent_cents
            FROM customers
            WHERE total_purchases > 0
            ORDER BY total_spent_cents DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Order counts per status, for the pipeline view.
    pub async fn status_breakdown(&self) -> DbResult<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS order_count
            FROM orders
            GROUP BY status
            ORDER BY order_count DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Recent stock movements across the whole catalog, newest first,
    /// with the medicine's code and name joined in.
    pub async fn recent_stock_movements(&self, limit: i64) -> DbResult<Vec<MovementLogEntry>> {
        let rows = sqlx::query_as::<_, MovementLogEntry>(
            r#"
            SELECT
                m.code, m.name,
                s.kind, s.quantity, s.stock_before, s.stock_after,
                s.note, s.created_at
            FROM stock_movements s
            JOIN medicines m ON m.id = s.medicine_id
            ORDER BY s.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Headline numbers for the dashboard, computed in one pass each.
    pub async fn dashboard(&self) -> DbResult<DashboardMetrics> {
        let orders_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE DATE(created_at) = DATE('now')",
        )
        .fetch_one(&self.pool)
        .await?;

        let revenue_today_cents: Option<i64> = sqlx::query_scalar(&format!(
            r#"
            SELECT SUM(total_cents) FROM orders
            WHERE status IN {REVENUE_STATUSES}
              AND DATE(created_at) = DATE('now')
            "#
        ))
        .fetch_one(&self.pool)
        .await?;

        let orders_this_month: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE strftime('%Y-%m', created_at) = strftime('%Y-%m', 'now')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let revenue_this_month_cents: Option<i64> = sqlx::query_scalar(&format!(
            r#"
            SELECT SUM(total_cents) FROM orders
            WHERE status IN {REVENUE_STATUSES}
              AND strftime('%Y-%m', created_at) = strftime('%Y-%m', 'now')
            "#
        ))
        .fetch_one(&self.pool)
        .await?;

        let open_orders: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE status IN ('PENDING', 'PROFORMA_GENERATED', 'CONFIRMED')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let low_stock_medicines: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM medicines WHERE is_active = 1 AND stock <= min_stock",
        )
        .fetch_one(&self.pool)
        .await?;

        let total_customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardMetrics {
            orders_today,
            revenue_today_cents: revenue_today_cents.unwrap_or(0),
            orders_this_month,
            revenue_this_month_cents: revenue_this_month_cents.unwrap_or(0),
            open_orders,
            low_stock_medicines,
            total_customers,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
