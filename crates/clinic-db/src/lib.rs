//! # clinic-db: Storage Layer and Order Commit Engine for Clinic POS
//!
//! This crate provides database access for the clinic point-of-sale and
//! hosts the Order Commit Engine. It uses SQLite with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Clinic POS Data Flow                              │
//! │                                                                         │
//! │  Caller (web UI / RPC): submit cart, render result                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     clinic-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │  Repositories  │   │ CommitEngine │   │   │
//! │  │   │   (pool.rs)   │   │ (medicine.rs,  │   │ (engine.rs)  │   │   │
//! │  │   │               │   │  order.rs)     │   │              │   │   │
//! │  │   │ SqlitePool    │◄──│ reads + edits  │   │ THE checkout │   │   │
//! │  │   │ + migrations  │   │                │   │ transaction  │   │   │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, CHECK (quantity >= 0))                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (medicine, order)
//! - [`engine`] - The Order Commit Engine (atomic checkout)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinic_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/clinic.db")).await?;
//!
//! // Inventory search for the cart builder's upstream UI
//! let results = db.medicines().search("amox", 5).await?;
//!
//! // Checkout: the cart is consumed by value, the engine re-reads
//! // authoritative stock and prices inside one transaction
//! let result = db.engine().commit(cart.into_commit_lines()).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::OrderCommitEngine;
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::medicine::MedicineRepository;
pub use repository::order::OrderRepository;
