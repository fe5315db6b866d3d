//! # Error Types
//!
//! Domain-specific error types for clinic-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  clinic-core errors (this file)                                        │
//! │  ├── CommitError      - Why a checkout was rejected                    │
//! │  └── ValidationError  - Input validation failures (inventory edits)    │
//! │                                                                         │
//! │  clinic-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: DbError ──► CommitError ──► CommitResult::Failure ──► Web UI    │
//! │                                                                         │
//! │  Every CommitError is recovered at the commit boundary and turned      │
//! │  into a structured Failure result; none propagates to the caller       │
//! │  as an unhandled fault.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (medicine name, current stock)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message naming the
//!    offending medicine(s) - never a bare "error"

use thiserror::Error;

// =============================================================================
// Stock Shortage
// =============================================================================

/// One cart line that cannot be satisfied by current stock.
///
/// Carried by [`CommitError::InsufficientStock`] so the UI can tell the
/// doctor exactly which medicines are short and what is actually left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortage {
    /// Medicine ID of the offending line.
    pub medicine_id: String,

    /// Medicine name at commit time (for the user-facing message).
    pub name: String,

    /// Authoritative stock read inside the commit transaction.
    pub available: i64,

    /// Combined quantity the cart asked for.
    pub requested: i64,
}

impl std::fmt::Display for StockShortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: available {}, requested {}",
            self.name, self.available, self.requested
        )
    }
}

// =============================================================================
// Commit Error
// =============================================================================

/// Why an order commit was rejected.
///
/// ## Taxonomy
/// ```text
/// ┌────────────────────────┬──────────────────────────┬───────────────┐
/// │ Variant                │ Detected by              │ Safe to retry │
/// ├────────────────────────┼──────────────────────────┼───────────────┤
/// │ EmptyCart              │ pre-validation (pure)    │ no            │
/// │ InvalidQuantity        │ pre-validation (pure)    │ no            │
/// │ UnknownMedicine        │ commit transaction       │ no            │
/// │ InsufficientStock      │ commit transaction       │ no            │
/// │ TransactionConflict    │ storage atomic commit    │ yes           │
/// │ StorageUnavailable     │ transport/pool           │ yes (backoff) │
/// └────────────────────────┴──────────────────────────┴───────────────┘
/// ```
///
/// The non-retryable variants require the user to revise the cart;
/// retrying them verbatim would fail again (or, after a success response
/// was lost, double-decrement stock - see [`CommitError::is_retryable`]).
#[derive(Debug, Error)]
pub enum CommitError {
    /// The submitted cart had no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line carried a non-positive quantity.
    ///
    /// ## When This Occurs
    /// Only from a buggy or hostile caller: the cart builder never
    /// produces quantities below 1.
    #[error("Invalid quantity {requested} for medicine {medicine_id}")]
    InvalidQuantity {
        medicine_id: String,
        requested: i64,
    },

    /// One or more lines reference a medicine that does not exist or is
    /// no longer active.
    ///
    /// ## When This Occurs
    /// - ID never existed (hostile caller)
    /// - Medicine was soft-deleted between cart build and commit
    ///
    /// Inactive-at-commit is deliberately treated the same as missing:
    /// silently skipping the line would hand the patient a partial order.
    #[error("Unknown or inactive medicine(s): {}", medicine_ids.join(", "))]
    UnknownMedicine { medicine_ids: Vec<String> },

    /// One or more lines exceed authoritative current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Amoxicillin × 5)
    ///      │
    ///      ▼
    /// Engine re-reads stock: available = 2
    ///      │
    ///      ▼
    /// InsufficientStock { shortages: [Amoxicillin: 2 < 5] }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock - Amoxicillin: available 2, requested 5"
    /// ```
    ///
    /// The whole commit fails; no stock was mutated for any line.
    #[error("Insufficient stock - {}", shortages.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("; "))]
    InsufficientStock { shortages: Vec<StockShortage> },

    /// The storage layer's atomic-commit mechanism detected a conflicting
    /// writer and aborted. Nothing was applied; safe to retry.
    #[error("Commit aborted by a concurrent transaction: {message}")]
    TransactionConflict { message: String },

    /// Transport or infrastructure failure before the transaction could
    /// complete. Nothing was applied; safe to retry with backoff.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },
}

impl CommitError {
    /// Whether the caller may retry the same cart automatically.
    ///
    /// Only conflict and availability failures are retryable: for both,
    /// the engine guarantees nothing was applied. Every other variant
    /// needs the user to revise the cart first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CommitError::TransactionConflict { .. } | CommitError::StorageUnavailable { .. }
        )
    }

    /// IDs of the medicines at fault, when the failure is line-specific.
    pub fn offending_ids(&self) -> Vec<String> {
        match self {
            CommitError::InvalidQuantity { medicine_id, .. } => vec![medicine_id.clone()],
            CommitError::UnknownMedicine { medicine_ids } => medicine_ids.clone(),
            CommitError::InsufficientStock { shortages } => {
                shortages.iter().map(|s| s.medicine_id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for inventory edits.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before a medicine row is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Result type alias for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
