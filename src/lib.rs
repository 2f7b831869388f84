//! This file is the root of the `labelframe` Rust crate.
//!
//! `labelframe` provides row-oriented, label-indexed data tables: a numeric or
//! cell matrix where every row carries one categorical label per field, and
//! rows are selected by composing label terms instead of numeric indices.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`labels`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the types a caller needs to build and query a table.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod config;
pub mod data;
pub mod error;
pub mod kernels;
pub mod labels;
pub mod table;
pub mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use config::{LabelFrameConfig, MaskStrategy};
pub use data::{DataMatrix, Operand, Reduction};
pub use error::LabelFrameError;
pub use kernels::{assign_true, assign_true_each, assign_true_one, Mask};
pub use labels::{
    DenseLabels, LabelCatalog, LabelGroup, LabelStore, QueryEngine, ReplaceMethod, Term,
};
pub use observability::enable_verbose_logging;
pub use table::{
    FieldBundle, LabelSummary, Mismatch, Table, TableArray, TableBundle, TableOperand,
};
pub use types::{ArithOp, CellValue, DataType, Element};
