//! # clinic-core: Pure Business Logic for Clinic POS
//!
//! This crate is the **heart** of the clinic point-of-sale. It contains the
//! checkout business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Clinic POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web UI (TypeScript)                          │   │
//! │  │    Search UI ──► Cart UI ──► Checkout button ──► Toast         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ submits cart, renders CommitResult     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ clinic-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │ Medicine  │  │   Money   │  │   Cart    │  │ coalesce  │  │   │
//! │  │   │   Order   │  │  totals   │  │ CartLine  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  clinic-db (Storage Layer)                      │   │
//! │  │        SQLite repositories + the Order Commit Engine            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Medicine, Order, CommitLine, CommitResult)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Session-scoped cart builder with advisory stock bounds
//! - [`error`] - Domain and commit error types
//! - [`validation`] - Cart payload validation shared with the engine
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in minor units (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **Advisory Cart**: the cart's stock bounds are last-known hints; only
//!    the Order Commit Engine in clinic-db reads authoritative stock
//!
//! ## Example Usage
//!
//! ```rust
//! use clinic_core::cart::{Cart, CartUpdate};
//! use clinic_core::validation::coalesce_lines;
//! # use clinic_core::types::Medicine;
//! # use chrono::Utc;
//! # let paracetamol = Medicine {
//! #     id: "m-1".into(), name: "Paracetamol 500mg".into(), unit: "box".into(),
//! #     price_cents: 1500, quantity: 20, active: true,
//! #     created_at: Utc::now(), updated_at: Utc::now(),
//! # };
//!
//! let mut cart = Cart::new();
//! assert_eq!(cart.add_line(&paracetamol, 2), CartUpdate::Added);
//!
//! // The payload handed to the commit engine
//! let lines = coalesce_lines(cart.into_commit_lines()).unwrap();
//! assert_eq!(lines[0].requested_quantity, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use clinic_core::Money` instead of
// `use clinic_core::money::Money`

pub use cart::{Cart, CartLine, CartUpdate};
pub use error::{CommitError, StockShortage, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// A clinic prescription rarely exceeds a dozen medicines; this bound
/// prevents runaway carts and keeps commit transactions small.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single medicine in one cart line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
