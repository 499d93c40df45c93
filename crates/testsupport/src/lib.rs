//! Test support utilities for the relational-operator workspace.
//!
//! Provides:
//! - Fixtures for building schemas, heap files, and hash indexes on disk
//! - An in-memory [`fixtures::RowsOperator`] for driving operator trees
//!   without storage
//! - Property-based generators for values and join relations
//! - Assertion helpers for comparing operator output as multisets

pub mod assertions;
pub mod fixtures;
pub mod proptest_generators;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::fixtures::*;
    pub use crate::proptest_generators::*;
}
