//! # Order Repository
//!
//! Read-side database operations for committed orders.
//!
//! ## Write Side Lives Elsewhere
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Data Flow                                   │
//! │                                                                         │
//! │  WRITE (exactly once per checkout)                                     │
//! │     OrderCommitEngine::commit() ──► orders + order_lines + decrement   │
//! │                                     (one transaction, engine.rs)        │
//! │                                                                         │
//! │  READ (this module)                                                    │
//! │     get_by_id()     ──► one order header                               │
//! │     get_lines()     ──► its lines, insertion order                     │
//! │     list_recent()   ──► order history for the UI                       │
//! │                                                                         │
//! │  Orders are immutable after commit; there is no update path.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;
use clinic_core::{Order, OrderLine};

/// Repository for order database reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order: Option<Order> = sqlx::query_as(
            r#"
            SELECT id, total_cents, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all lines for an order, in the order they were committed.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines: Vec<OrderLine> = sqlx::query_as(
            r#"
            SELECT id, order_id, medicine_id, name_snapshot, unit_snapshot,
                   quantity, unit_price_cents
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists the most recent orders, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders: Vec<Order> = sqlx::query_as(
            r#"
            SELECT id, total_cents, created_at
            FROM orders
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts committed orders (for diagnostics and atomicity tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
