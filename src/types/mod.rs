//! This module defines the core, strongly-typed payload representations used
//! throughout labelframe.
//!
//! It includes the `DataType` enum, which names the two payload kinds a data
//! matrix may hold, and the element types those payloads are built from.

pub mod data_type;
pub mod element;

// Re-export the main type(s) for easier access.
pub use data_type::DataType;
pub use element::{ArithOp, CellValue, Element};
