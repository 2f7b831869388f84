//! This module holds the label side of a table: the per-field sparse index,
//! the multi-field store built on it, and the term query engine.
//!
//! Nothing here knows about the data matrix. The `table` module pairs a store
//! with a matrix and keeps their row counts in step.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Per-field label index: unique labels plus one row mask each.
pub mod catalog;

/// Term parsing and mask evaluation over a store.
pub mod query;

/// The ordered collection of fields and the cross-field rules.
pub mod store;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::catalog::{DenseLabels, LabelCatalog, ReplaceMethod, COLLAPSED_PREFIX};
pub use self::query::{QueryEngine, Term, WILDCARD_MARKER};
pub use self::store::{LabelGroup, LabelStore};

#[cfg(test)]
mod store_tests;
