//! # Medicine Repository
//!
//! Database operations for the medicine inventory.
//!
//! ## Key Operations
//! - Name search over active medicines (the cart builder's upstream UI)
//! - CRUD with soft delete
//! - Guarded stock adjustments for inventory edits
//!
//! ## What Does NOT Live Here
//! The checkout decrement. Selling stock is the Order Commit Engine's
//! job, inside its transaction; `adjust_stock` below exists for manual
//! restocks and corrections only.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use clinic_core::validation::{
    validate_medicine_name, validate_price_cents, validate_stock_quantity, validate_unit,
};
use clinic_core::Medicine;

/// Repository for medicine database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = MedicineRepository::new(pool);
///
/// // Search active medicines by name
/// let results = repo.search("amox", 5).await?;
///
/// // Get by ID
/// let medicine = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Searches active medicines by name substring.
    ///
    /// ## How It Works
    /// - Case-insensitive `LIKE '%query%'` over the name column
    /// - Inactive medicines are always excluded (soft delete)
    /// - Empty query falls back to the plain active listing
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial)
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Medicine>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching medicines");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", query);

        let medicines: Vec<Medicine> = sqlx::query_as(
            r#"
            SELECT id, name, unit, price_cents, quantity, active, created_at, updated_at
            FROM medicines
            WHERE active = 1 AND name LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = medicines.len(), "Search returned medicines");
        Ok(medicines)
    }

    /// Lists active medicines sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Medicine>> {
        let medicines: Vec<Medicine> = sqlx::query_as(
            r#"
            SELECT id, name, unit, price_cents, quantity, active, created_at, updated_at
            FROM medicines
            WHERE active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Gets a medicine by its ID (active or not).
    ///
    /// ## Returns
    /// * `Ok(Some(Medicine))` - Medicine found
    /// * `Ok(None)` - Medicine not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Medicine>> {
        let medicine: Option<Medicine> = sqlx::query_as(
            r#"
            SELECT id, name, unit, price_cents, quantity, active, created_at, updated_at
            FROM medicines
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(medicine)
    }

    /// Inserts a new medicine.
    ///
    /// Field validation runs first, so a bad inventory form never reaches
    /// the database.
    pub async fn insert(&self, medicine: &Medicine) -> DbResult<()> {
        validate_medicine_name(&medicine.name)?;
        validate_unit(&medicine.unit)?;
        validate_price_cents(medicine.price_cents)?;
        validate_stock_quantity(medicine.quantity)?;

        debug!(id = %medicine.id, name = %medicine.name, "Inserting medicine");

        sqlx::query(
            r#"
            INSERT INTO medicines (id, name, unit, price_cents, quantity, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&medicine.id)
        .bind(&medicine.name)
        .bind(&medicine.unit)
        .bind(medicine.price_cents)
        .bind(medicine.quantity)
        .bind(medicine.active)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing medicine (inventory edit).
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Medicine doesn't exist
    pub async fn update(&self, medicine: &Medicine) -> DbResult<()> {
        validate_medicine_name(&medicine.name)?;
        validate_unit(&medicine.unit)?;
        validate_price_cents(medicine.price_cents)?;
        validate_stock_quantity(medicine.quantity)?;

        debug!(id = %medicine.id, "Updating medicine");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medicines SET
                name = ?2,
                unit = ?3,
                price_cents = ?4,
                quantity = ?5,
                active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&medicine.id)
        .bind(&medicine.name)
        .bind(&medicine.unit)
        .bind(medicine.price_cents)
        .bind(medicine.quantity)
        .bind(medicine.active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", &medicine.id));
        }

        Ok(())
    }

    /// Adjusts stock by a delta (positive restock, negative correction).
    ///
    /// ## Guarded Delta Pattern
    /// ```text
    /// UPDATE medicines SET quantity = quantity + delta
    /// WHERE id = ? AND quantity + delta >= 0
    /// ```
    /// The guard keeps the `quantity >= 0` invariant even when two
    /// corrections race; a correction that would go negative is rejected
    /// rather than clamped.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medicines
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1 AND quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish "no such medicine" from "would go negative"
            return match self.get_by_id(id).await? {
                None => Err(DbError::not_found("Medicine", id)),
                Some(m) => Err(DbError::CheckViolation {
                    message: format!(
                        "stock adjustment {} would make quantity of '{}' negative (current {})",
                        delta, m.name, m.quantity
                    ),
                }),
            };
        }

        Ok(())
    }

    /// Soft-deletes a medicine by setting active = false.
    ///
    /// ## Why Soft Delete?
    /// - Historical order lines still reference this medicine
    /// - Can be restored if deleted by mistake
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting medicine");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medicines
            SET active = 0, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        Ok(())
    }

    /// Counts active medicines (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new medicine ID.
pub fn generate_medicine_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn medicine(name: &str, price_cents: i64, quantity: i64) -> Medicine {
        let now = Utc::now();
        Medicine {
            id: generate_medicine_id(),
            name: name.to_string(),
            unit: "box".to_string(),
            price_cents,
            quantity,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.medicines();

        let m = medicine("Paracetamol 500mg", 1500, 20);
        repo.insert(&m).await.unwrap();

        let found = repo.get_by_id(&m.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Paracetamol 500mg");
        assert_eq!(found.quantity, 20);
        assert!(found.active);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_fields() {
        let db = test_db().await;
        let repo = db.medicines();

        let mut m = medicine("", 1500, 20);
        assert!(repo.insert(&m).await.is_err());

        m.name = "Valid".to_string();
        m.price_cents = -5;
        assert!(repo.insert(&m).await.is_err());
    }

    #[tokio::test]
    async fn test_search_matches_substring_and_excludes_inactive() {
        let db = test_db().await;
        let repo = db.medicines();

        repo.insert(&medicine("Amoxicillin 250mg", 3000, 10))
            .await
            .unwrap();
        repo.insert(&medicine("Ibuprofen 400mg", 1200, 10))
            .await
            .unwrap();
        let retired = medicine("Amoxicillin 500mg", 4500, 0);
        repo.insert(&retired).await.unwrap();
        repo.soft_delete(&retired.id).await.unwrap();

        let results = repo.search("amox", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Amoxicillin 250mg");

        // Empty query lists all active medicines
        let all = repo.search("  ", 10).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_adjust_stock_guards_negative() {
        let db = test_db().await;
        let repo = db.medicines();

        let m = medicine("Cough Syrup", 2200, 5);
        repo.insert(&m).await.unwrap();

        repo.adjust_stock(&m.id, 10).await.unwrap();
        let found = repo.get_by_id(&m.id).await.unwrap().unwrap();
        assert_eq!(found.quantity, 15);

        // A correction below zero is rejected, stock untouched
        let err = repo.adjust_stock(&m.id, -20).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        let found = repo.get_by_id(&m.id).await.unwrap().unwrap();
        assert_eq!(found.quantity, 15);

        // Unknown medicine
        let err = repo.adjust_stock("no-such-id", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_and_count() {
        let db = test_db().await;
        let repo = db.medicines();

        let mut m = medicine("Vitamin C", 900, 50);
        repo.insert(&m).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        m.price_cents = 1100;
        repo.update(&m).await.unwrap();
        let found = repo.get_by_id(&m.id).await.unwrap().unwrap();
        assert_eq!(found.price_cents, 1100);

        repo.soft_delete(&m.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        // Still fetchable by ID for referential history
        assert!(repo.get_by_id(&m.id).await.unwrap().is_some());
    }
}
