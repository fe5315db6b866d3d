//! # Repository Module
//!
//! Repository implementations for database entities.
//!
//! ## Repository Pattern
//! Each entity gets a repository struct wrapping the connection pool:
//!
//! - [`medicine::MedicineRepository`] - inventory reads and edits
//! - [`order::OrderRepository`] - order history reads
//!
//! Checkout mutation deliberately does NOT live here: the
//! check-then-decrement-then-record sequence must run inside one
//! transaction, which is the job of [`crate::engine::OrderCommitEngine`].

pub mod medicine;
pub mod order;
