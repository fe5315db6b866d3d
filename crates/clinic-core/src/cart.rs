//! # Cart Builder
//!
//! Session-scoped accumulation of medicines into a cart, with optimistic
//! stock-bound checks.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Builder Operations                            │
//! │                                                                         │
//! │  UI Action                Operation              Cart Change            │
//! │  ─────────────            ─────────────          ─────────────          │
//! │                                                                         │
//! │  Click search result ───► add_line() ──────────► lines.push / merge    │
//! │                                                                         │
//! │  Edit quantity field ───► set_quantity() ─────► line.qty = clamp(n)    │
//! │                                                                         │
//! │  Click trash icon ──────► remove_line() ──────► lines.remove           │
//! │                                                                         │
//! │  Click checkout ────────► into_commit_lines() ─► cart consumed,        │
//! │                                                  payload to the engine  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Advisory Bounds Only
//! Every stock check here compares against the stock observed when the
//! medicine was added - a cache of last-known truth, useful for immediate
//! UX feedback and nothing more. True stock can change between build time
//! and commit time; the Order Commit Engine in clinic-db re-reads
//! authoritative stock inside its transaction and is the sole source of
//! truth.
//!
//! ## Ownership
//! A `Cart` is a plain value owned by one client session. There is no
//! shared singleton and no lock: the caller keeps it in its session state
//! and hands it once, by value, to the engine at submit time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CommitLine, Medicine};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One medicine in the cart, with the medicine data frozen at add time.
///
/// ## Design Notes
/// - `unit_price_cents` and `stock_snapshot` are display/UX snapshots.
///   Neither is ever forwarded to the commit engine; see [`CommitLine`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    /// Medicine ID (UUID v4).
    pub medicine_id: String,

    /// Medicine name at time of adding (frozen).
    pub name: String,

    /// Unit of sale at time of adding (frozen).
    pub unit: String,

    /// Price in minor units at time of adding (display only).
    pub unit_price_cents: i64,

    /// Stock level last observed for this medicine (advisory bound).
    pub stock_snapshot: i64,

    /// Units the user wants to buy. Always >= 1.
    pub requested_quantity: i64,

    /// When this line was added to the cart.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a cart line from a medicine and quantity.
    fn from_medicine(medicine: &Medicine, quantity: i64) -> Self {
        CartLine {
            medicine_id: medicine.id.clone(),
            name: medicine.name.clone(),
            unit: medicine.unit.clone(),
            unit_price_cents: medicine.price_cents,
            stock_snapshot: medicine.quantity,
            requested_quantity: quantity,
            added_at: Utc::now(),
        }
    }

    /// Largest quantity this line will accept locally.
    fn bound(&self) -> i64 {
        self.stock_snapshot.min(MAX_LINE_QUANTITY)
    }

    /// Line total at the snapshot price (informational).
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).times(self.requested_quantity)
    }
}

// =============================================================================
// Cart Update Signal
// =============================================================================

/// Outcome of a cart mutation.
///
/// The UI maps these onto toasts: `Clamped` and `RejectedStockBound`
/// become "only N in stock" warnings, `RejectedOutOfStock` an error.
/// Nothing is ever silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CartUpdate {
    /// New line inserted at the requested quantity.
    Added,

    /// Medicine was already in the cart; its quantity was incremented.
    Merged,

    /// Quantity was reduced to the last-known stock bound.
    Clamped { granted: i64, stock: i64 },

    /// No-op: the increment would exceed the last-known stock.
    RejectedStockBound { stock: i64 },

    /// No-op: last-known stock is zero, nothing to sell.
    RejectedOutOfStock,

    /// No-op: the cart already holds the maximum number of lines.
    RejectedCartFull,

    /// Line removed.
    Removed,

    /// No line with that medicine ID exists.
    NotInCart,
}

// =============================================================================
// Cart
// =============================================================================

/// The session-scoped cart.
///
/// ## Invariants
/// - Lines are unique by `medicine_id` (adding the same medicine merges)
/// - `requested_quantity >= 1` on every line
/// - At local mutation time, `requested_quantity <= stock_snapshot`
///   (advisory; the engine re-validates against authoritative stock)
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a medicine to the cart, or increments its quantity if present.
    ///
    /// ## Behavior
    /// - Present: increments by `qty`, rejecting the whole increment
    ///   (no-op + [`CartUpdate::RejectedStockBound`]) if the new total
    ///   would exceed the last-known stock.
    /// - Absent: inserts with `min(qty, stock)`, signalling
    ///   [`CartUpdate::Clamped`] when reduced, and rejecting entirely
    ///   ([`CartUpdate::RejectedOutOfStock`]) when stock is 0.
    pub fn add_line(&mut self, medicine: &Medicine, qty: i64) -> CartUpdate {
        // A non-positive qty is a caller bug; treat it as a single click.
        let qty = qty.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.medicine_id == medicine.id)
        {
            // Refresh the advisory bound with the stock the caller just saw.
            line.stock_snapshot = medicine.quantity;

            let bound = line.bound();
            let new_qty = line.requested_quantity + qty;
            if new_qty > bound {
                return CartUpdate::RejectedStockBound { stock: bound };
            }
            line.requested_quantity = new_qty;
            return CartUpdate::Merged;
        }

        if medicine.quantity <= 0 {
            return CartUpdate::RejectedOutOfStock;
        }

        if self.lines.len() >= MAX_CART_LINES {
            return CartUpdate::RejectedCartFull;
        }

        let bound = medicine.quantity.min(MAX_LINE_QUANTITY);
        let granted = qty.min(bound);
        self.lines.push(CartLine::from_medicine(medicine, granted));

        if granted < qty {
            CartUpdate::Clamped {
                granted,
                stock: bound,
            }
        } else {
            CartUpdate::Added
        }
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - `qty <= 0`: removes the line
    /// - `qty` above the last-known stock: clamps to the stock bound with
    ///   a [`CartUpdate::Clamped`] signal (never silently dropped)
    /// - otherwise: sets exactly
    pub fn set_quantity(&mut self, medicine_id: &str, qty: i64) -> CartUpdate {
        if qty <= 0 {
            return self.remove_line(medicine_id);
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.medicine_id == medicine_id) else {
            return CartUpdate::NotInCart;
        };

        let bound = line.bound();
        if qty > bound {
            line.requested_quantity = bound;
            return CartUpdate::Clamped {
                granted: bound,
                stock: bound,
            };
        }

        line.requested_quantity = qty;
        CartUpdate::Merged
    }

    /// Removes a line unconditionally.
    pub fn remove_line(&mut self, medicine_id: &str) -> CartUpdate {
        let before = self.lines.len();
        self.lines.retain(|l| l.medicine_id != medicine_id);

        if self.lines.len() == before {
            CartUpdate::NotInCart
        } else {
            CartUpdate::Removed
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of snapshot price × quantity over all lines.
    ///
    /// Purely informational for the cart footer; the billing total is
    /// computed by the engine from authoritative prices at commit time.
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.line_total()).sum()
    }

    /// Number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consumes the cart into the payload submitted to the commit engine.
    ///
    /// Only IDs and quantities survive: snapshot prices and stock are
    /// stripped here, so stale data physically cannot reach the commit
    /// path. By-value consumption also makes accidental resubmission of
    /// the same cart a compile error for the caller.
    pub fn into_commit_lines(self) -> Vec<CommitLine> {
        self.lines
            .into_iter()
            .map(|l| CommitLine {
                medicine_id: l.medicine_id,
                requested_quantity: l.requested_quantity,
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(id: &str, price_cents: i64, stock: i64) -> Medicine {
        Medicine {
            id: id.to_string(),
            name: format!("Medicine {}", id),
            unit: "box".to_string(),
            price_cents,
            quantity: stock,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 10);

        assert_eq!(cart.add_line(&m, 2), CartUpdate::Added);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total().cents(), 3000);
    }

    #[test]
    fn test_add_same_medicine_merges() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 10);

        cart.add_line(&m, 2);
        assert_eq!(cart.add_line(&m, 3), CartUpdate::Merged);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines[0].requested_quantity, 5);
    }

    #[test]
    fn test_add_rejects_increment_past_stock() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 3);

        cart.add_line(&m, 3);
        // Increment would exceed last-known stock: whole increment refused.
        assert_eq!(
            cart.add_line(&m, 1),
            CartUpdate::RejectedStockBound { stock: 3 }
        );
        assert_eq!(cart.lines[0].requested_quantity, 3);
    }

    #[test]
    fn test_add_out_of_stock_is_zero_op() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 0);

        assert_eq!(cart.add_line(&m, 1), CartUpdate::RejectedOutOfStock);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_clamps_first_insert_to_stock() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 4);

        assert_eq!(
            cart.add_line(&m, 9),
            CartUpdate::Clamped {
                granted: 4,
                stock: 4
            }
        );
        assert_eq!(cart.lines[0].requested_quantity, 4);
    }

    #[test]
    fn test_set_quantity_clamps_to_stock() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 5);

        cart.add_line(&m, 1);
        assert_eq!(
            cart.set_quantity("m-1", 50),
            CartUpdate::Clamped {
                granted: 5,
                stock: 5
            }
        );
        assert_eq!(cart.lines[0].requested_quantity, 5);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        let m = medicine("m-1", 1500, 5);

        cart.add_line(&m, 2);
        assert_eq!(cart.set_quantity("m-1", 0), CartUpdate::Removed);
        assert!(cart.is_empty());

        assert_eq!(cart.set_quantity("m-1", 1), CartUpdate::NotInCart);
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new();
        cart.add_line(&medicine("m-1", 1500, 5), 1);
        cart.add_line(&medicine("m-2", 800, 5), 1);

        assert_eq!(cart.remove_line("m-1"), CartUpdate::Removed);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.remove_line("m-1"), CartUpdate::NotInCart);
    }

    #[test]
    fn test_into_commit_lines_strips_snapshots() {
        let mut cart = Cart::new();
        cart.add_line(&medicine("m-1", 1500, 5), 2);
        cart.add_line(&medicine("m-2", 800, 9), 3);

        let lines = cart.into_commit_lines();
        assert_eq!(
            lines,
            vec![
                CommitLine {
                    medicine_id: "m-1".to_string(),
                    requested_quantity: 2
                },
                CommitLine {
                    medicine_id: "m-2".to_string(),
                    requested_quantity: 3
                },
            ]
        );
    }
}
