//! # Order Commit Engine
//!
//! The single atomic operation that turns a cart into an order: re-validate
//! stock against authoritative data, decrement inventory, record the order.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    commit(lines) - one invocation                       │
//! │                                                                         │
//! │  Pending                                                                │
//! │     │  coalesce_lines(): empty? non-positive qty? merge duplicates      │
//! │     ▼                                                                   │
//! │  Validating (inside ONE transaction)                                    │
//! │     │  for each line: SELECT current medicine row                       │
//! │     │    missing/inactive ──► UnknownMedicine                           │
//! │     │    quantity < requested ──► collect shortage                      │
//! │     │  any shortage ──► InsufficientStock (all shortages listed)        │
//! │     ▼                                                                   │
//! │  Apply (same transaction)                                               │
//! │     │  INSERT order + order_lines (authoritative prices)                │
//! │     │  UPDATE medicines SET quantity = quantity - n                     │
//! │     │      WHERE id = ? AND quantity >= n   ← guarded decrement         │
//! │     ▼                                                                   │
//! │  Committed ─── or ─── Rejected (rollback, nothing observable)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//! The engine is stateless between invocations and holds no in-memory
//! lock: serializable isolation for the check-then-decrement sequence
//! comes entirely from the storage layer's transaction. Two concurrent
//! commits racing for the last unit both enter `Validating`; SQLite's
//! single-writer semantics order them, and the loser either re-reads the
//! decremented stock (InsufficientStock) or trips the guarded decrement /
//! SQLITE_BUSY (TransactionConflict). Exactly one can win.
//!
//! ## No Idempotency
//! Each successful call creates a new order and a new decrement. Callers
//! must clear the cart on success and must NOT auto-retry an ambiguous
//! failure (e.g. a timeout) without idempotency safeguards - a retry
//! after an already-applied commit double-decrements stock. The two
//! retryable kinds (`TransactionConflict`, `StorageUnavailable`) are safe
//! precisely because nothing was applied.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use clinic_core::validation::coalesce_lines;
use clinic_core::{
    CommitError, CommitLine, CommitReceipt, CommitResult, Medicine, Money, StockShortage,
};

/// The order commit engine - sole mutating entry point for checkout.
///
/// Cheap to clone; holds only the pool handle.
#[derive(Debug, Clone)]
pub struct OrderCommitEngine {
    pool: SqlitePool,
}

impl OrderCommitEngine {
    /// Creates a new engine over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        OrderCommitEngine { pool }
    }

    /// Commits a cart: validate, decrement stock, record one order -
    /// atomically.
    ///
    /// This is the commit boundary: every [`CommitError`] is recovered
    /// into a structured [`CommitResult::Failure`]; no fault propagates
    /// to the caller. On failure, no partial mutation is observable by
    /// any concurrent reader.
    pub async fn commit(&self, lines: Vec<CommitLine>) -> CommitResult {
        match self.try_commit(lines).await {
            Ok(receipt) => {
                info!(
                    order_id = %receipt.order_id,
                    total_cents = receipt.total_cents,
                    lines = receipt.line_count,
                    "Order committed"
                );
                CommitResult::from(receipt)
            }
            Err(err) => {
                warn!(error = %err, retryable = err.is_retryable(), "Commit rejected");
                CommitResult::from(err)
            }
        }
    }

    /// The fallible commit path. Any early return drops the transaction,
    /// which rolls back every pending write.
    async fn try_commit(&self, lines: Vec<CommitLine>) -> Result<CommitReceipt, CommitError> {
        // Pure pre-validation: empty cart, non-positive quantities, and
        // duplicate-line coalescing (combined demand per medicine).
        let lines = coalesce_lines(lines)?;

        debug!(lines = lines.len(), "Starting commit transaction");

        let mut tx = self.pool.begin().await.map_err(db_to_commit)?;

        // ---------------------------------------------------------------------
        // Validating: re-read every medicine inside the transaction.
        // Cart-time snapshots of price and stock are deliberately absent
        // from CommitLine; these rows are the only truth used below.
        // ---------------------------------------------------------------------
        let mut unknown: Vec<String> = Vec::new();
        let mut shortages: Vec<StockShortage> = Vec::new();
        let mut granted: Vec<(CommitLine, Medicine)> = Vec::with_capacity(lines.len());

        for line in lines {
            let medicine: Option<Medicine> = sqlx::query_as(
                r#"
                SELECT id, name, unit, price_cents, quantity, active, created_at, updated_at
                FROM medicines
                WHERE id = ?1
                "#,
            )
            .bind(&line.medicine_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_to_commit)?;

            // Inactive counts as unknown: silently skipping the line would
            // hand the patient a partial order.
            let Some(medicine) = medicine.filter(|m| m.active) else {
                unknown.push(line.medicine_id);
                continue;
            };

            if medicine.quantity < line.requested_quantity {
                shortages.push(StockShortage {
                    medicine_id: medicine.id.clone(),
                    name: medicine.name.clone(),
                    available: medicine.quantity,
                    requested: line.requested_quantity,
                });
                continue;
            }

            granted.push((line, medicine));
        }

        if !unknown.is_empty() {
            return Err(CommitError::UnknownMedicine {
                medicine_ids: unknown,
            });
        }

        if !shortages.is_empty() {
            return Err(CommitError::InsufficientStock { shortages });
        }

        // ---------------------------------------------------------------------
        // Apply: order record, lines, guarded decrements - same transaction.
        // ---------------------------------------------------------------------
        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let total: Money = granted
            .iter()
            .map(|(line, m)| Money::from_cents(m.price_cents).times(line.requested_quantity))
            .sum();

        sqlx::query(
            r#"
            INSERT INTO orders (id, total_cents, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&order_id)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_to_commit)?;

        let line_count = granted.len();

        for (line, medicine) in &granted {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, medicine_id,
                    name_snapshot, unit_snapshot,
                    quantity, unit_price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&medicine.id)
            .bind(&medicine.name)
            .bind(&medicine.unit)
            .bind(line.requested_quantity)
            .bind(medicine.price_cents)
            .execute(&mut *tx)
            .await
            .map_err(db_to_commit)?;

            // The `quantity >= n` guard re-asserts sufficiency at write
            // time. A zero-row update means a conflicting writer slipped
            // between our read and this write; abort the whole commit.
            let result = sqlx::query(
                r#"
                UPDATE medicines
                SET quantity = quantity - ?2, updated_at = ?3
                WHERE id = ?1 AND quantity >= ?2
                "#,
            )
            .bind(&medicine.id)
            .bind(line.requested_quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_to_commit)?;

            if result.rows_affected() == 0 {
                return Err(CommitError::TransactionConflict {
                    message: format!(
                        "stock of '{}' changed during commit",
                        medicine.name
                    ),
                });
            }
        }

        tx.commit().await.map_err(db_to_commit)?;

        Ok(CommitReceipt {
            order_id,
            total_cents: total.cents(),
            line_count,
        })
    }
}

/// Maps storage failures into the commit taxonomy.
///
/// Both resulting kinds promise "nothing was applied", which holds here:
/// any storage error aborts the transaction before commit.
fn db_to_commit(err: sqlx::Error) -> CommitError {
    match DbError::from(err) {
        DbError::Conflict { message } => CommitError::TransactionConflict { message },
        // The guarded decrement makes a CHECK trip a concurrency artifact,
        // not a caller mistake - retryable.
        DbError::CheckViolation { message } => CommitError::TransactionConflict { message },
        other => CommitError::StorageUnavailable {
            message: other.to_string(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use clinic_core::FailureKind;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_medicine(db: &Database, name: &str, price_cents: i64, quantity: i64) -> String {
        let now = Utc::now();
        let medicine = Medicine {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            unit: "box".to_string(),
            price_cents,
            quantity,
            active: true,
            created_at: now,
            updated_at: now,
        };
        db.medicines().insert(&medicine).await.unwrap();
        medicine.id
    }

    fn line(id: &str, qty: i64) -> CommitLine {
        CommitLine {
            medicine_id: id.to_string(),
            requested_quantity: qty,
        }
    }

    fn expect_failure(result: CommitResult) -> (FailureKind, String, Vec<String>, bool) {
        match result {
            CommitResult::Failure {
                kind,
                message,
                offending,
                retryable,
            } => (kind, message, offending, retryable),
            CommitResult::Success { .. } => panic!("expected failure, got success"),
        }
    }

    #[tokio::test]
    async fn test_successful_commit_decrements_and_records() {
        // Scenario: stock 5 at price 1000, buy 3 → success, stock 2, total 3000
        let db = test_db().await;
        let id = seed_medicine(&db, "Paracetamol 500mg", 1000, 5).await;

        let result = db.engine().commit(vec![line(&id, 3)]).await;

        let CommitResult::Success {
            order_id,
            total_cents,
        } = result
        else {
            panic!("expected success, got {:?}", result);
        };
        assert_eq!(total_cents, 3000);

        let medicine = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(medicine.quantity, 2);

        let order = db.orders().get_by_id(&order_id).await.unwrap().unwrap();
        assert_eq!(order.total_cents, 3000);

        let lines = db.orders().get_lines(&order_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].medicine_id, id);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].unit_price_cents, 1000);
        assert_eq!(lines[0].name_snapshot, "Paracetamol 500mg");
    }

    #[tokio::test]
    async fn test_commit_refreshes_updated_at() {
        let db = test_db().await;
        let id = seed_medicine(&db, "Ibuprofen 400mg", 1200, 5).await;
        let before = db.medicines().get_by_id(&id).await.unwrap().unwrap();

        let result = db.engine().commit(vec![line(&id, 1)]).await;
        assert!(result.is_success());

        let after = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_insufficient_stock_fails_whole_commit() {
        // Scenario: stock 2, request 5 → InsufficientStock, stock unchanged
        let db = test_db().await;
        let id = seed_medicine(&db, "Amoxicillin 250mg", 3000, 2).await;

        let result = db.engine().commit(vec![line(&id, 5)]).await;

        let (kind, message, offending, retryable) = expect_failure(result);
        assert_eq!(kind, FailureKind::InsufficientStock);
        assert!(message.contains("Amoxicillin 250mg"));
        assert!(message.contains("available 2"));
        assert!(message.contains("requested 5"));
        assert_eq!(offending, vec![id.clone()]);
        assert!(!retryable);

        let medicine = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(medicine.quantity, 2);
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;

        let (kind, _, offending, retryable) = expect_failure(db.engine().commit(vec![]).await);
        assert_eq!(kind, FailureKind::EmptyCart);
        assert!(offending.is_empty());
        assert!(!retryable);
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let db = test_db().await;
        let id = seed_medicine(&db, "Vitamin C", 900, 10).await;

        let (kind, _, offending, _) =
            expect_failure(db.engine().commit(vec![line(&id, -1)]).await);
        assert_eq!(kind, FailureKind::InvalidQuantity);
        assert_eq!(offending, vec![id.clone()]);

        // No mutation
        let medicine = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(medicine.quantity, 10);
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_as_combined_demand() {
        // Two lines for the same medicine (2 + 3) against stock 4 must be
        // treated as demand 5, not pass independently.
        let db = test_db().await;
        let id = seed_medicine(&db, "Cough Syrup", 2000, 4).await;

        let result = db.engine().commit(vec![line(&id, 2), line(&id, 3)]).await;

        let (kind, message, _, _) = expect_failure(result);
        assert_eq!(kind, FailureKind::InsufficientStock);
        assert!(message.contains("available 4"));
        assert!(message.contains("requested 5"));

        let medicine = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(medicine.quantity, 4);
    }

    #[tokio::test]
    async fn test_duplicate_lines_merge_into_one_order_line() {
        let db = test_db().await;
        let id = seed_medicine(&db, "Cough Syrup", 2000, 5).await;

        let result = db.engine().commit(vec![line(&id, 2), line(&id, 3)]).await;

        let CommitResult::Success {
            order_id,
            total_cents,
        } = result
        else {
            panic!("expected success");
        };
        assert_eq!(total_cents, 10000);

        let lines = db.orders().get_lines(&order_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);

        let medicine = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(medicine.quantity, 0);
    }

    #[tokio::test]
    async fn test_atomicity_one_bad_line_rolls_back_all() {
        // A cart with one satisfiable and one short line must change nothing.
        let db = test_db().await;
        let ok_id = seed_medicine(&db, "Paracetamol 500mg", 1000, 10).await;
        let short_id = seed_medicine(&db, "Amoxicillin 250mg", 3000, 1).await;

        let result = db
            .engine()
            .commit(vec![line(&ok_id, 2), line(&short_id, 3)])
            .await;

        let (kind, _, offending, _) = expect_failure(result);
        assert_eq!(kind, FailureKind::InsufficientStock);
        assert_eq!(offending, vec![short_id.clone()]);

        assert_eq!(
            db.medicines()
                .get_by_id(&ok_id)
                .await
                .unwrap()
                .unwrap()
                .quantity,
            10
        );
        assert_eq!(
            db.medicines()
                .get_by_id(&short_id)
                .await
                .unwrap()
                .unwrap()
                .quantity,
            1
        );
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_medicines_rejected() {
        let db = test_db().await;
        let retired = seed_medicine(&db, "Retired Syrup", 2000, 10).await;
        db.medicines().soft_delete(&retired).await.unwrap();

        // Inactive at commit time is treated as unknown, not skipped
        let (kind, _, offending, _) =
            expect_failure(db.engine().commit(vec![line(&retired, 1)]).await);
        assert_eq!(kind, FailureKind::UnknownMedicine);
        assert_eq!(offending, vec![retired.clone()]);

        // Never-existed ID
        let (kind, message, _, _) =
            expect_failure(db.engine().commit(vec![line("no-such-id", 1)]).await);
        assert_eq!(kind, FailureKind::UnknownMedicine);
        assert!(message.contains("no-such-id"));

        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_uses_authoritative_price_not_cart_snapshot() {
        // The cart was built at price 1000; the price is edited to 1200
        // before checkout. The order total must reflect 1200.
        let db = test_db().await;
        let id = seed_medicine(&db, "Vitamin C", 1000, 10).await;

        let mut medicine = db.medicines().get_by_id(&id).await.unwrap().unwrap();
        medicine.price_cents = 1200;
        db.medicines().update(&medicine).await.unwrap();

        let result = db.engine().commit(vec![line(&id, 2)]).await;

        let CommitResult::Success { total_cents, .. } = result else {
            panic!("expected success");
        };
        assert_eq!(total_cents, 2400);
    }

    #[tokio::test]
    async fn test_sequential_resubmission_is_not_idempotent() {
        // Committing the same payload twice is two sales - by design.
        let db = test_db().await;
        let id = seed_medicine(&db, "Paracetamol 500mg", 1000, 10).await;

        let first = db.engine().commit(vec![line(&id, 2)]).await;
        let second = db.engine().commit(vec![line(&id, 2)]).await;
        assert!(first.is_success());
        assert!(second.is_success());

        assert_eq!(db.orders().count().await.unwrap(), 2);
        assert_eq!(
            db.medicines()
                .get_by_id(&id)
                .await
                .unwrap()
                .unwrap()
                .quantity,
            6
        );
    }

    #[tokio::test]
    async fn test_concurrent_commits_cannot_oversell_last_unit() {
        // Two doctors race for the last unit: exactly one wins.
        let db = test_db().await;
        let id = seed_medicine(&db, "Last Box", 5000, 1).await;

        let engine_a = db.engine();
        let engine_b = db.engine();
        let (id_a, id_b) = (id.clone(), id.clone());

        let a = tokio::spawn(async move { engine_a.commit(vec![line(&id_a, 1)]).await });
        let b = tokio::spawn(async move { engine_b.commit(vec![line(&id_b, 1)]).await });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_success()).count();
        assert_eq!(successes, 1, "exactly one commit may win: {:?}", results);

        // The loser was turned away for stock (or, under lock contention,
        // with a retryable conflict) - never a partial application.
        for result in &results {
            if let CommitResult::Failure { kind, .. } = result {
                assert!(matches!(
                    *kind,
                    FailureKind::InsufficientStock | FailureKind::TransactionConflict
                ));
            }
        }

        assert_eq!(
            db.medicines()
                .get_by_id(&id)
                .await
                .unwrap()
                .unwrap()
                .quantity,
            0
        );
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_multi_line_commit_orders_lines_and_sums_total() {
        let db = test_db().await;
        let a = seed_medicine(&db, "Paracetamol 500mg", 1000, 10).await;
        let b = seed_medicine(&db, "Ibuprofen 400mg", 1500, 10).await;

        let result = db.engine().commit(vec![line(&a, 2), line(&b, 3)]).await;

        let CommitResult::Success {
            order_id,
            total_cents,
        } = result
        else {
            panic!("expected success");
        };
        assert_eq!(total_cents, 2 * 1000 + 3 * 1500);

        let lines = db.orders().get_lines(&order_id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].medicine_id, a);
        assert_eq!(lines[1].medicine_id, b);

        let recent = db.orders().list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, order_id);
    }
}
