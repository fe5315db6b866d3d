//! # Domain Types
//!
//! Core domain types used throughout Clinic POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Medicine     │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  name, unit     │   │  total_cents    │   │  medicine_id    │       │
//! │  │  price_cents    │   │  created_at     │   │  quantity       │       │
//! │  │  quantity       │   └─────────────────┘   │  unit_price     │       │
//! │  │  active         │                         └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────────────────────────┐     │
//! │  │   CommitLine    │   │             CommitResult                │     │
//! │  │  ─────────────  │   │  ─────────────────────────────────────  │     │
//! │  │  medicine_id    │   │  Success { order_id, total_cents }      │     │
//! │  │  requested_qty  │   │  Failure { kind, message, offending }   │     │
//! │  └─────────────────┘   └─────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `CartLine` (see [`crate::cart`]) is the transient, unpersisted
//! precursor of an `OrderLine`; the engine only ever receives the stripped
//! `CommitLine` form, because prior price/stock snapshots must not be
//! trusted at commit time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CommitError;

// =============================================================================
// Medicine
// =============================================================================

/// A medicine in the clinic inventory.
///
/// Owned by the inventory store; `quantity` is mutated only by inventory
/// edits and by the Order Commit Engine's stock decrement.
///
/// ## Invariants
/// - `quantity >= 0` always (also enforced by a database CHECK constraint)
/// - `active = false` is a soft delete: excluded from search and listing,
///   retained so historical order lines keep a valid reference
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in search results and on the order.
    pub name: String,

    /// Display unit of sale ("box", "blister", "bottle").
    pub unit: String,

    /// Price per unit in minor currency units. Never negative.
    pub price_cents: i64,

    /// Current stock level. Never negative.
    pub quantity: i64,

    /// Whether the medicine is active (soft delete flag).
    pub active: bool,

    /// When the medicine was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the medicine was last updated (inventory edit or sale).
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// A completed checkout. Created exactly once per successful commit by the
/// Order Commit Engine; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Sum of quantity × unit price over all lines, computed from the
    /// authoritative prices read inside the commit transaction. Never
    /// taken from the client.
    pub total_cents: i64,

    /// When the order was committed.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One line of a committed order.
///
/// ## Snapshot Pattern
/// Name, unit, and price are copied from the medicine row at commit time,
/// so the receipt history survives later inventory edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Order this line belongs to.
    pub order_id: String,

    /// Medicine sold.
    pub medicine_id: String,

    /// Medicine name at commit time (frozen).
    pub name_snapshot: String,

    /// Unit of sale at commit time (frozen).
    pub unit_snapshot: String,

    /// Units sold.
    pub quantity: i64,

    /// Authoritative per-unit price at commit time (frozen).
    pub unit_price_cents: i64,
}

// =============================================================================
// Commit Request
// =============================================================================

/// One line of a cart as submitted to the Order Commit Engine.
///
/// Deliberately carries no price and no stock snapshot: the engine trusts
/// neither, and re-reads both inside the commit transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommitLine {
    /// Medicine to sell.
    pub medicine_id: String,

    /// Units requested. Must be >= 1; validated by the engine.
    pub requested_quantity: i64,
}

// =============================================================================
// Commit Result
// =============================================================================

/// What the engine records about a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// ID of the order that was created.
    pub order_id: String,

    /// Server-computed order total in minor units.
    pub total_cents: i64,

    /// Number of (coalesced) lines on the order.
    pub line_count: usize,
}

/// Failure category of a rejected commit, mirrored to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum FailureKind {
    /// Submitted cart had no lines.
    EmptyCart,

    /// A line carried a non-positive quantity.
    InvalidQuantity,

    /// A referenced medicine is missing or inactive.
    UnknownMedicine,

    /// Current stock cannot satisfy one or more lines.
    InsufficientStock,

    /// A concurrent transaction won; nothing applied, safe to retry.
    TransactionConflict,

    /// Infrastructure failure; nothing applied, retry with backoff.
    StorageUnavailable,
}

/// Discriminated checkout result handed back to the caller.
///
/// The UI uses this purely to render a toast and decide whether to clear
/// the cart (on success) or retain it for revision (on failure).
///
/// ## Serialized Form
/// ```json
/// { "status": "success", "orderId": "…", "totalCents": 3000 }
/// { "status": "failure", "kind": "insufficientStock",
///   "message": "Insufficient stock - …", "offending": ["m-1"],
///   "retryable": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "camelCase")]
#[ts(export)]
pub enum CommitResult {
    /// Commit applied: stock decremented and one order recorded.
    #[serde(rename_all = "camelCase")]
    Success {
        /// ID of the created order.
        order_id: String,

        /// Server-computed total in minor units.
        total_cents: i64,
    },

    /// Commit rejected: no stock mutated, no order recorded.
    #[serde(rename_all = "camelCase")]
    Failure {
        /// Failure category.
        kind: FailureKind,

        /// Explanatory message naming the medicine(s) at fault.
        message: String,

        /// IDs of the offending medicines, when line-specific.
        offending: Vec<String>,

        /// Whether the caller may retry the same cart automatically.
        retryable: bool,
    },
}

impl CommitResult {
    /// Whether the commit succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CommitResult::Success { .. })
    }
}

impl From<CommitReceipt> for CommitResult {
    fn from(receipt: CommitReceipt) -> Self {
        CommitResult::Success {
            order_id: receipt.order_id,
            total_cents: receipt.total_cents,
        }
    }
}

impl From<&CommitError> for FailureKind {
    fn from(err: &CommitError) -> Self {
        match err {
            CommitError::EmptyCart => FailureKind::EmptyCart,
            CommitError::InvalidQuantity { .. } => FailureKind::InvalidQuantity,
            CommitError::UnknownMedicine { .. } => FailureKind::UnknownMedicine,
            CommitError::InsufficientStock { .. } => FailureKind::InsufficientStock,
            CommitError::TransactionConflict { .. } => FailureKind::TransactionConflict,
            CommitError::StorageUnavailable { .. } => FailureKind::StorageUnavailable,
        }
    }
}

impl From<CommitError> for CommitResult {
    /// Recovers a commit error into the structured failure DTO.
    ///
    /// This is the commit boundary from §error docs: every error becomes a
    /// renderable result, never an unhandled fault.
    fn from(err: CommitError) -> Self {
        CommitResult::Failure {
            kind: FailureKind::from(&err),
            offending: err.offending_ids(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
