// In: src/table/mod.rs

//! This module is the user-facing table: a `DataMatrix` paired with a
//! `LabelStore` over the same rows.
//!
//! The pairing is the table's core invariant and is checked by `Table::new`,
//! which every operation below goes through. Tables are values: each
//! operation returns a new table and leaves its inputs untouched.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Arrays of tables and the flatten operation.
pub mod array;

/// The persistence boundary type.
pub mod bundle;

/// The per-field label summary.
pub mod display;

pub use self::array::{Consistency, TableArray};
pub use self::bundle::{FieldBundle, TableBundle};
pub use self::display::{FieldSummary, LabelSummary};

use std::fmt;

use crate::data::{DataMatrix, Operand, Reduction};
use crate::error::LabelFrameError;
use crate::kernels::mask::{self, Mask};
use crate::labels::{LabelStore, ReplaceMethod, Term, COLLAPSED_PREFIX};
use crate::types::{ArithOp, DataType};

//==================================================================================
// 2. Types
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    data: DataMatrix,
    labels: LabelStore,
}

/// The right-hand side of a table arithmetic operation.
#[derive(Debug, Clone, Copy)]
pub enum TableOperand<'a> {
    Table(&'a Table),
    Scalar(f64),
}

impl From<f64> for TableOperand<'_> {
    fn from(value: f64) -> Self {
        TableOperand::Scalar(value)
    }
}

impl<'a> From<&'a Table> for TableOperand<'a> {
    fn from(table: &'a Table) -> Self {
        TableOperand::Table(table)
    }
}

/// Why two tables are not equal. Checked in this order; the first failing
/// check is reported.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    RowCount { left: usize, right: usize },
    Dtype { left: DataType, right: DataType },
    Shape { left: (usize, usize), right: (usize, usize) },
    Data,
    Labels(String),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::RowCount { left, right } => write!(f, "row counts differ ({} vs {})", left, right),
            Mismatch::Dtype { left, right } => write!(f, "dtypes differ ({} vs {})", left, right),
            Mismatch::Shape { left, right } => write!(f, "shapes differ ({:?} vs {:?})", left, right),
            Mismatch::Data => write!(f, "data values differ"),
            Mismatch::Labels(reason) => write!(f, "labels differ: {}", reason),
        }
    }
}

//==================================================================================
// 3. Construction & Accessors
//==================================================================================

impl Table {
    /// Pairs a matrix with a label store.
    ///
    /// # Errors
    /// * `RowLabelMismatch` if the row counts differ.
    /// * `EmptyLabelSet` if the store has no fields.
    /// * Any error from `LabelStore::check_consistency`.
    pub fn new(data: DataMatrix, labels: LabelStore) -> Result<Self, LabelFrameError> {
        if data.rows() != labels.n_rows() {
            return Err(LabelFrameError::RowLabelMismatch {
                data_rows: data.rows(),
                label_rows: labels.n_rows(),
            });
        }
        if labels.is_empty() {
            return Err(LabelFrameError::EmptyLabelSet);
        }
        labels.check_consistency()?;
        Ok(Self { data, labels })
    }

    /// Builds a table from a matrix and raw `(field, labels)` columns.
    pub fn from_columns<F, S>(data: DataMatrix, columns: &[(F, Vec<S>)]) -> Result<Self, LabelFrameError>
    where
        F: AsRef<str>,
        S: AsRef<str>,
    {
        let labels = if columns.is_empty() {
            LabelStore::new(data.rows())
        } else {
            LabelStore::from_columns(columns)?
        };
        Self::new(data, labels)
    }

    pub fn data(&self) -> &DataMatrix {
        &self.data
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn into_parts(self) -> (DataMatrix, LabelStore) {
        (self.data, self.labels)
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn n_rows(&self) -> usize {
        self.labels.n_rows()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.labels.field_names()
    }

    fn with_labels(&self, labels: LabelStore) -> Result<Self, LabelFrameError> {
        Self::new(self.data.clone(), labels)
    }
}

//==================================================================================
// 4. Row Selection
//==================================================================================

impl Table {
    /// The row mask a list of terms selects (see `QueryEngine`).
    pub fn query<T: AsRef<str>>(
        &self,
        terms: &[T],
        restrict_fields: Option<&[&str]>,
    ) -> Result<Mask, LabelFrameError> {
        self.labels.query(terms, restrict_fields)
    }

    /// The rows matching every term.
    pub fn select<T: AsRef<str>>(&self, terms: &[T]) -> Result<Self, LabelFrameError> {
        let rows = self.query(terms, None)?;
        self.select_where(&rows)
    }

    /// Like `select`, with the candidate fields of every term restricted.
    pub fn select_in<T: AsRef<str>>(
        &self,
        terms: &[T],
        restrict_fields: &[&str],
    ) -> Result<Self, LabelFrameError> {
        let rows = self.query(terms, Some(restrict_fields))?;
        self.select_where(&rows)
    }

    pub fn select_terms(&self, terms: &[Term]) -> Result<Self, LabelFrameError> {
        let rows = self.labels.query_terms(terms, None)?;
        self.select_where(&rows)
    }

    /// The rows set in `rows`, in order.
    pub fn select_where(&self, rows: &Mask) -> Result<Self, LabelFrameError> {
        let data = self.data.select_rows(rows)?;
        let labels = self.labels.select(rows)?;
        log::debug!("selected {} of {} rows", labels.n_rows(), self.n_rows());
        Self::new(data, labels)
    }

    /// Field-scoped filter; see `QueryEngine::only`.
    pub fn only<F, L>(&self, constraints: &[(F, Vec<L>)]) -> Result<Self, LabelFrameError>
    where
        F: AsRef<str>,
        L: AsRef<str>,
    {
        let rows = self.labels.only(constraints)?;
        self.select_where(&rows)
    }

    /// Every row except those the terms select.
    pub fn remove<T: AsRef<str>>(&self, terms: &[T]) -> Result<Self, LabelFrameError> {
        let rows = self.query(terms, None)?;
        self.select_where(&mask::not(&rows))
    }

    /// True when at least one row matches every term.
    pub fn matches<T: AsRef<str>>(&self, terms: &[T]) -> Result<bool, LabelFrameError> {
        Ok(self.query(terms, None)?.any())
    }
}

//==================================================================================
// 5. Concatenation
//==================================================================================

impl Table {
    /// Stacks tables vertically. Data and labels are concatenated
    /// independently and the result is re-validated.
    ///
    /// # Errors
    /// * `InconsistentDtype` / `DimensionMismatch` from the data.
    /// * `FieldSetMismatch` / `AmbiguousTarget` from the labels.
    pub fn concatenate(tables: &[&Table]) -> Result<Self, LabelFrameError> {
        let (first, rest) = tables.split_first().ok_or_else(|| {
            LabelFrameError::DimensionMismatch("nothing to concatenate".to_string())
        })?;

        let matrices: Vec<&DataMatrix> = tables.iter().map(|t| &t.data).collect();
        let data = DataMatrix::concatenate(&matrices)?;
        let labels = rest
            .iter()
            .try_fold(first.labels.clone(), |acc, t| acc.append(&t.labels))?;

        log::info!(
            "concatenated {} tables into {} rows",
            tables.len(),
            labels.n_rows()
        );
        Self::new(data, labels)
    }

    pub fn append(&self, other: &Table) -> Result<Self, LabelFrameError> {
        Self::concatenate(&[self, other])
    }
}

//==================================================================================
// 6. Arithmetic
//==================================================================================

impl Table {
    /// Applies `op` row by row. A table operand must carry the same labels on
    /// every row; the result keeps `self`'s labels.
    pub fn apply(&self, op: ArithOp, rhs: TableOperand<'_>) -> Result<Self, LabelFrameError> {
        let data = match rhs {
            TableOperand::Scalar(s) => self.data.apply(op, Operand::Scalar(s))?,
            TableOperand::Table(other) => {
                if !self.labels.rows_match(&other.labels) {
                    return Err(LabelFrameError::InconsistentLabels(
                        "row labels of the operands differ".to_string(),
                    ));
                }
                self.data.apply(op, Operand::Matrix(&other.data))?
            }
        };
        Ok(Self {
            data,
            labels: self.labels.clone(),
        })
    }

    pub fn add<'a>(&self, rhs: impl Into<TableOperand<'a>>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Add, rhs.into())
    }

    pub fn subtract<'a>(&self, rhs: impl Into<TableOperand<'a>>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Subtract, rhs.into())
    }

    pub fn multiply<'a>(&self, rhs: impl Into<TableOperand<'a>>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Multiply, rhs.into())
    }

    pub fn divide<'a>(&self, rhs: impl Into<TableOperand<'a>>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Divide, rhs.into())
    }
}

//==================================================================================
// 7. Equality
//==================================================================================

impl Table {
    /// The first difference between two tables, or `None` if they are equal.
    ///
    /// Labels are compared as sets: same field set and, per field, the same
    /// unique labels. Which row carries which label is not compared.
    pub fn compare(&self, other: &Table) -> Option<Mismatch> {
        if self.n_rows() != other.n_rows() {
            return Some(Mismatch::RowCount {
                left: self.n_rows(),
                right: other.n_rows(),
            });
        }
        if self.dtype() != other.dtype() {
            return Some(Mismatch::Dtype {
                left: self.dtype(),
                right: other.dtype(),
            });
        }
        if self.shape() != other.shape() {
            return Some(Mismatch::Shape {
                left: self.shape(),
                right: other.shape(),
            });
        }
        if self.data != other.data {
            return Some(Mismatch::Data);
        }
        self.labels.equivalent(&other.labels).err().map(Mismatch::Labels)
    }

    pub fn equals(&self, other: &Table) -> bool {
        self.compare(other).is_none()
    }
}

//==================================================================================
// 8. Field & Label Delegates
//==================================================================================

impl Table {
    pub fn add_field<S: AsRef<str>>(&self, name: &str, raw_labels: &[S]) -> Result<Self, LabelFrameError> {
        self.with_labels(self.labels.add_field(name, raw_labels)?)
    }

    pub fn add_field_shared<S: AsRef<str>>(
        &self,
        name: &str,
        raw_labels: &[S],
    ) -> Result<Self, LabelFrameError> {
        self.with_labels(self.labels.add_field_shared(name, raw_labels)?)
    }

    /// Removing the last field fails with `EmptyLabelSet`.
    pub fn remove_field(&self, name: &str) -> Result<Self, LabelFrameError> {
        self.with_labels(self.labels.remove_field(name)?)
    }

    pub fn rename_field(&self, from: &str, to: &str) -> Result<Self, LabelFrameError> {
        self.with_labels(self.labels.rename_field(from, to)?)
    }

    pub fn replace(
        &self,
        search: &str,
        replacement: &str,
        method: ReplaceMethod,
        restrict_fields: Option<&[&str]>,
    ) -> Result<Self, LabelFrameError> {
        self.with_labels(
            self.labels
                .replace(search, replacement, method, restrict_fields)?,
        )
    }

    pub fn set_all(&self, field: &str, value: &str) -> Result<Self, LabelFrameError> {
        self.with_labels(self.labels.set_all(field, value)?)
    }

    pub fn collapse(&self, field: &str) -> Result<Self, LabelFrameError> {
        self.with_labels(self.labels.collapse(field)?)
    }
}

//==================================================================================
// 9. Grouping
//==================================================================================

impl Table {
    /// Splits the table into one sub-table per label combination of `fields`,
    /// in order of first appearance.
    pub fn group_by(&self, fields: &[&str]) -> Result<Vec<(Vec<String>, Table)>, LabelFrameError> {
        self.labels
            .combinations(fields)?
            .into_iter()
            .map(|group| Ok((group.labels, self.select_where(&group.mask)?)))
            .collect()
    }

    /// One row per label combination of `fields`, folding the numeric rows of
    /// each group with `how`.
    ///
    /// Grouped fields carry the group's label. Every other field keeps its
    /// label where the whole group agrees on it and becomes `all__<field>`
    /// where it does not.
    pub fn reduce_by(&self, fields: &[&str], how: Reduction) -> Result<Self, LabelFrameError> {
        let groups = self.labels.combinations(fields)?;
        let indices: Vec<Vec<usize>> = groups.iter().map(|g| mask::indices(&g.mask)).collect();
        let data = self.data.reduce_rows(&indices, how)?;

        let mut labels = LabelStore::new(groups.len());
        for catalog in self.labels.catalogs() {
            let dense = catalog.decompress();
            let fallback = format!("{}{}", COLLAPSED_PREFIX, catalog.field());
            let column: Vec<String> = indices
                .iter()
                .map(|rows| {
                    let first = rows.first().and_then(|&r| dense.get(r));
                    match first {
                        Some(label) if rows.iter().all(|&r| dense.get(r) == Some(label)) => {
                            label.to_string()
                        }
                        _ => fallback.clone(),
                    }
                })
                .collect();
            // Carried labels already satisfied the store's rules before grouping.
            labels = labels.add_field_shared(catalog.field(), &column)?;
        }

        log::info!(
            "reduced {} rows into {} groups by {:?}",
            self.n_rows(),
            groups.len(),
            fields
        );
        Self::new(data, labels)
    }
}
