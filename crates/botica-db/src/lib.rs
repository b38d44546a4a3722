//! # botica-db: Database Layer for Botica
//!
//! This crate provides database access for the Botica order-management
//! backend. It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Botica Data Flow                             │
//! │                                                                     │
//! │  Caller (order form, report view, seed script)                      │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                    botica-db (THIS CRATE)                     │ │
//! │  │                                                               │ │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐  │ │
//! │  │   │   Database    │   │  Repositories  │   │  Migrations  │  │ │
//! │  │   │   (pool.rs)   │   │  customer      │   │  (embedded)  │  │ │
//! │  │   │               │   │  medicine      │   │              │  │ │
//! │  │   │ SqlitePool    │◄──│  order         │   │ 001_init.sql │  │ │
//! │  │   │ Connection    │   │  notification  │   │  ...         │  │ │
//! │  │   │ Management    │   │  report        │   │              │  │ │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘  │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite Database (botica.db)                                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botica_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/botica.db")).await?;
//!
//! let customer = db.customers().find_by_phone("+51900000000").await?;
//! let daily = db.reports().daily_sales(30).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::medicine::MedicineRepository;
pub use repository::notification::NotificationRepository;
pub use repository::order::{OrderDetails, OrderLineInput, OrderRepository, OrderSummary};
pub use repository::report::{DashboardMetrics, MovementLogEntry, ReportRepository};
