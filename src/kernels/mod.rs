//! This module serves as the public API for the collection of pure, stateless
//! bit kernels that the label index is built on.
//!
//! Nothing in here knows about fields, labels or tables. The kernels operate on
//! row masks (`Mask`) and row-index lists only, which keeps them easy to test
//! and benchmark in isolation.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Mask algebra: and/or/not, row gathering and concatenation.
pub mod mask;

/// The bulk mask construction primitive (row-index lists -> masks).
pub mod assign_true;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use assign_true::{assign_true, assign_true_each, assign_true_one};
pub use mask::Mask;
