//! # Repository Module
//!
//! Database repository implementations for Botica.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  The Repository pattern abstracts database access behind a clean   │
//! │  API.                                                               │
//! │                                                                     │
//! │  Caller                                                             │
//! │       │  db.orders().create_order(...)                              │
//! │       ▼                                                             │
//! │  OrderRepository                                                    │
//! │  ├── create_order(&self, customer_id, items, address, notes)        │
//! │  ├── transition(&self, id, target)                                  │
//! │  ├── record_payment(&self, id, amount, method, reference)           │
//! │  └── get_by_number(&self, order_number)                             │
//! │       │  SQL Query                                                  │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  Benefits:                                                          │
//! │  • Clean separation of concerns                                     │
//! │  • SQL is isolated in one place                                     │
//! │  • Easy to test against an in-memory database                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`customer::CustomerRepository`] - Customer lookup and registration
//! - [`medicine::MedicineRepository`] - Catalog CRUD and stock adjustments
//! - [`order::OrderRepository`] - Order lifecycle and payments
//! - [`notification::NotificationRepository`] - Outbound message audit log
//! - [`report::ReportRepository`] - Sales and inventory aggregations

pub mod customer;
pub mod medicine;
pub mod notification;
pub mod order;
pub mod report;
