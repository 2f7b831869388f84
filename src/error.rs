// In: src/error.rs

//! This module defines the single, unified error type for the entire labelframe library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelFrameError {
    // =========================================================================
    // === Shape & Type Errors
    // =========================================================================
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Inconsistent dimensions: {0}")]
    InconsistentDimensions(String),

    #[error("Inconsistent dtype: {0}")]
    InconsistentDtype(String),

    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Data has {data_rows} rows but the label store has {label_rows}")]
    RowLabelMismatch { data_rows: usize, label_rows: usize },

    // =========================================================================
    // === Field-Level Errors
    // =========================================================================
    #[error("Field '{0}' does not exist")]
    FieldNotFound(String),

    #[error("Field '{0}' already exists")]
    FieldExists(String),

    #[error("Field sets do not match: {0}")]
    FieldSetMismatch(String),

    /// Two catalogs for different fields were combined.
    #[error("Cannot combine field '{expected}' with field '{found}'")]
    FieldMismatch { expected: String, found: String },

    #[error("A table requires at least one label field")]
    EmptyLabelSet,

    #[error("Inconsistent labels: {0}")]
    InconsistentLabels(String),

    /// A row carries zero or more than one label within a single field.
    #[error("Field '{field}' breaks the one-label-per-row rule at row {row}")]
    BrokenPartition { field: String, row: usize },

    // =========================================================================
    // === Label & Query Errors
    // =========================================================================
    #[error("Label '{0}' was not found")]
    LabelNotFound(String),

    #[error("Invalid label in field '{field}': {reason}")]
    InvalidLabelKind { field: String, reason: String },

    #[error("Term '{term}' matches labels in more than one field: {fields:?}")]
    AmbiguousTerm { term: String, fields: Vec<String> },

    #[error("Label '{label}' already exists in field '{field}'")]
    AmbiguousTarget { label: String, field: String },

    #[error("Cannot determine the concatenation axis: {0}")]
    AmbiguousConcatenationAxis(String),

    #[error("Unsupported replacement: {0}")]
    UnsupportedReplace(String),

    // =========================================================================
    // === Kernel Errors
    // =========================================================================
    #[error("Index {index} is out of bounds for a mask of length {len}")]
    InvalidIndex { index: u64, len: usize },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading a config or bundle.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error originating from the underlying I/O subsystem (e.g. opening a log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
