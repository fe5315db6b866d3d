//! # Validation Module
//!
//! Input validation for Clinic POS.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web UI (TypeScript)                                          │
//! │  ├── Basic format checks, advisory stock bounds (cart builder)         │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure Rust)                                      │
//! │  ├── Cart payload checks: non-empty, positive quantities               │
//! │  └── Duplicate-line coalescing (combined demand per medicine)          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0), NOT NULL, foreign keys                     │
//! │  └── Guarded decrement inside the commit transaction                   │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CommitError, ValidationError, ValidationResult};
use crate::types::CommitLine;
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Cart Payload Validation
// =============================================================================

/// Validates and coalesces a cart payload before the commit transaction.
///
/// ## Rules
/// - An empty payload is rejected with [`CommitError::EmptyCart`]
/// - Any `requested_quantity <= 0` is rejected with
///   [`CommitError::InvalidQuantity`]
/// - Duplicate `medicine_id`s are merged by **summing** quantities,
///   preserving first-occurrence order
///
/// ## Why Coalesce?
/// ```text
/// Payload:  [{m-1 × 2}, {m-1 × 3}]   stock of m-1: 4
///
/// Per-line checking:  2 <= 4 ✓ and 3 <= 4 ✓  → oversells to -1  ❌
/// Coalesced checking: 5 <= 4 ✗               → InsufficientStock ✓
/// ```
/// Combined demand per medicine is the only sound unit of stock
/// validation, so the merge happens here, once, before any I/O.
pub fn coalesce_lines(lines: Vec<CommitLine>) -> Result<Vec<CommitLine>, CommitError> {
    if lines.is_empty() {
        return Err(CommitError::EmptyCart);
    }

    let mut merged: Vec<CommitLine> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.requested_quantity <= 0 {
            return Err(CommitError::InvalidQuantity {
                medicine_id: line.medicine_id,
                requested: line.requested_quantity,
            });
        }

        match merged
            .iter_mut()
            .find(|m| m.medicine_id == line.medicine_id)
        {
            Some(existing) => {
                existing.requested_quantity += line.requested_quantity;
            }
            None => merged.push(line),
        }
    }

    Ok(merged)
}

// =============================================================================
// Inventory Edit Validators
// =============================================================================

/// Validates a medicine name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a unit-of-sale label ("box", "bottle", ...).
pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    let unit = unit.trim();

    if unit.is_empty() {
        return Err(ValidationError::Required {
            field: "unit".to_string(),
        });
    }

    if unit.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "unit".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// ## Rules
/// - Must be non-negative (zero is allowed for free samples)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level for an inventory edit.
///
/// ## Rules
/// - Must be non-negative; the `quantity >= 0` invariant holds for every
///   medicine at all times, including manual restocks
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, qty: i64) -> CommitLine {
        CommitLine {
            medicine_id: id.to_string(),
            requested_quantity: qty,
        }
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(
            coalesce_lines(Vec::new()),
            Err(CommitError::EmptyCart)
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let err = coalesce_lines(vec![line("m-1", -1)]).unwrap_err();
        match err {
            CommitError::InvalidQuantity {
                medicine_id,
                requested,
            } => {
                assert_eq!(medicine_id, "m-1");
                assert_eq!(requested, -1);
            }
            _ => panic!("expected InvalidQuantity"),
        }

        assert!(coalesce_lines(vec![line("m-1", 0)]).is_err());
    }

    #[test]
    fn test_duplicate_lines_are_summed() {
        // Combined demand must be checked as one line, not independently.
        let merged = coalesce_lines(vec![line("m-1", 2), line("m-2", 1), line("m-1", 3)]).unwrap();

        assert_eq!(merged, vec![line("m-1", 5), line("m-2", 1)]);
    }

    #[test]
    fn test_order_preserved() {
        let merged = coalesce_lines(vec![line("b", 1), line("a", 1), line("b", 1)]).unwrap();
        assert_eq!(merged[0].medicine_id, "b");
        assert_eq!(merged[1].medicine_id, "a");
    }

    #[test]
    fn test_validate_medicine_name() {
        assert!(validate_medicine_name("Paracetamol 500mg").is_ok());
        assert!(validate_medicine_name("").is_err());
        assert!(validate_medicine_name("   ").is_err());
        assert!(validate_medicine_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1500).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(999).is_ok());
        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
