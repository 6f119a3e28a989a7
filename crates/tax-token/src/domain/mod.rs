//! # Domain Layer
//!
//! Pure ledger, registry, tax and permit logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod entities;
pub mod invariants;
pub mod ledger;
pub mod permit;
pub mod registry;
pub mod tax;
pub mod value_objects;
