// In: src/data/matrix.rs

//! The row-aligned payload of a table.
//!
//! A `DataMatrix` is either a homogeneous `f64` matrix or a matrix of
//! heterogeneous cells. The variant is the dtype and never changes; every
//! operation that would mix the two fails with `InconsistentDtype`.
//!
//! Shapes are always checked explicitly. `ndarray` would otherwise broadcast
//! a `1 x n` operand over an `m x n` one, which is not a row-wise operation.

use ndarray::{concatenate, Array2, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::error::LabelFrameError;
use crate::kernels::mask::{self, Mask};
use crate::types::{ArithOp, CellValue, DataType, Element};

/// How `reduce_rows` folds a group of rows into one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

/// The right-hand side of a matrix arithmetic operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Matrix(&'a DataMatrix),
    Scalar(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataMatrix {
    Numeric(Array2<f64>),
    Cell(Array2<CellValue>),
}

/// Runs the same expression against whichever array the matrix holds and
/// rewraps the result in the same variant.
macro_rules! map_variant {
    ($matrix:expr, |$arr:ident| $body:expr) => {
        match $matrix {
            DataMatrix::Numeric($arr) => DataMatrix::Numeric($body),
            DataMatrix::Cell($arr) => DataMatrix::Cell($body),
        }
    };
}

//==================================================================================
// 1. Construction & Shape
//==================================================================================

impl DataMatrix {
    pub fn numeric(data: Array2<f64>) -> Self {
        DataMatrix::Numeric(data)
    }

    pub fn cells(data: Array2<CellValue>) -> Self {
        DataMatrix::Cell(data)
    }

    /// Builds a matrix from raw row-major elements.
    ///
    /// The first element decides the dtype. An input with no elements at all
    /// is an empty numeric matrix.
    ///
    /// # Errors
    /// * `UnsupportedDtype` if the first element is bare text.
    /// * `InconsistentDtype` if a later element is of the other kind.
    /// * `DimensionMismatch` if the rows are ragged.
    pub fn from_elements(rows: &[Vec<Element>]) -> Result<Self, LabelFrameError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some((at, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "row {} has {} elements, expected {}",
                at,
                row.len(),
                n_cols
            )));
        }

        let dtype = match rows.iter().flatten().next() {
            Some(first) => DataType::from_element(first)?,
            None => DataType::Numeric,
        };

        let mismatch = |at: usize, found: &Element| {
            LabelFrameError::InconsistentDtype(format!(
                "element {} is {:?} but the matrix is {}",
                at, found, dtype
            ))
        };

        match dtype {
            DataType::Numeric => {
                let values = rows
                    .iter()
                    .flatten()
                    .enumerate()
                    .map(|(at, e)| match e {
                        Element::Number(v) => Ok(*v),
                        other => Err(mismatch(at, other)),
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                Ok(DataMatrix::Numeric(shaped(n_rows, n_cols, values)?))
            }
            DataType::Cell => {
                let values = rows
                    .iter()
                    .flatten()
                    .enumerate()
                    .map(|(at, e)| match e {
                        Element::Cell(c) => Ok(c.clone()),
                        other => Err(mismatch(at, other)),
                    })
                    .collect::<Result<Vec<CellValue>, _>>()?;
                Ok(DataMatrix::Cell(shaped(n_rows, n_cols, values)?))
            }
        }
    }

    /// The inverse of `from_elements`.
    pub fn to_elements(&self) -> Vec<Vec<Element>> {
        match self {
            DataMatrix::Numeric(a) => a
                .rows()
                .into_iter()
                .map(|row| row.iter().map(|&v| Element::Number(v)).collect())
                .collect(),
            DataMatrix::Cell(a) => a
                .rows()
                .into_iter()
                .map(|row| row.iter().cloned().map(Element::Cell).collect())
                .collect(),
        }
    }

    pub fn dtype(&self) -> DataType {
        match self {
            DataMatrix::Numeric(_) => DataType::Numeric,
            DataMatrix::Cell(_) => DataType::Cell,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            DataMatrix::Numeric(a) => a.dim(),
            DataMatrix::Cell(a) => a.dim(),
        }
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    pub fn as_numeric(&self) -> Option<&Array2<f64>> {
        match self {
            DataMatrix::Numeric(a) => Some(a),
            DataMatrix::Cell(_) => None,
        }
    }

    pub fn as_cells(&self) -> Option<&Array2<CellValue>> {
        match self {
            DataMatrix::Cell(a) => Some(a),
            DataMatrix::Numeric(_) => None,
        }
    }
}

fn shaped<T>(n_rows: usize, n_cols: usize, values: Vec<T>) -> Result<Array2<T>, LabelFrameError> {
    Array2::from_shape_vec((n_rows, n_cols), values)
        .map_err(|e| LabelFrameError::DimensionMismatch(e.to_string()))
}

//==================================================================================
// 2. Arithmetic
//==================================================================================

impl DataMatrix {
    /// Applies `op` element by element.
    ///
    /// Matrix operands must have the same dtype and the same shape. Numeric
    /// data supports all four operators; cell data supports add and subtract
    /// only, combining each pair of cells (see `CellValue::combine`).
    pub fn apply(&self, op: ArithOp, rhs: Operand<'_>) -> Result<Self, LabelFrameError> {
        if let (DataMatrix::Cell(_), false) = (self, op.allowed_on_cells()) {
            return Err(LabelFrameError::UnsupportedOperation(format!(
                "{:?} is not defined for cell data",
                op
            )));
        }

        match rhs {
            Operand::Scalar(s) => match self {
                DataMatrix::Numeric(a) => Ok(DataMatrix::Numeric(a.mapv(|x| op.apply(x, s)))),
                DataMatrix::Cell(a) => {
                    let scalar = CellValue::Scalar(s);
                    let cells = a
                        .iter()
                        .map(|c| c.combine(&scalar, op))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(DataMatrix::Cell(shaped(a.nrows(), a.ncols(), cells)?))
                }
            },
            Operand::Matrix(other) => {
                if self.shape() != other.shape() {
                    return Err(LabelFrameError::DimensionMismatch(format!(
                        "cannot combine a {:?} matrix with a {:?} matrix",
                        self.shape(),
                        other.shape()
                    )));
                }
                match (self, other) {
                    (DataMatrix::Numeric(a), DataMatrix::Numeric(b)) => Ok(DataMatrix::Numeric(
                        Zip::from(a).and(b).map_collect(|&x, &y| op.apply(x, y)),
                    )),
                    (DataMatrix::Cell(a), DataMatrix::Cell(b)) => {
                        let cells = a
                            .iter()
                            .zip(b.iter())
                            .map(|(x, y)| x.combine(y, op))
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(DataMatrix::Cell(shaped(a.nrows(), a.ncols(), cells)?))
                    }
                    _ => Err(LabelFrameError::InconsistentDtype(format!(
                        "cannot combine {} data with {} data",
                        self.dtype(),
                        other.dtype()
                    ))),
                }
            }
        }
    }

    pub fn add(&self, rhs: Operand<'_>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Add, rhs)
    }

    pub fn subtract(&self, rhs: Operand<'_>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Subtract, rhs)
    }

    pub fn multiply(&self, rhs: Operand<'_>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Multiply, rhs)
    }

    pub fn divide(&self, rhs: Operand<'_>) -> Result<Self, LabelFrameError> {
        self.apply(ArithOp::Divide, rhs)
    }
}

//==================================================================================
// 3. Stacking
//==================================================================================

/// Checks that every part has the dtype of the first, and returns it.
fn common_dtype(parts: &[&DataMatrix]) -> Result<DataType, LabelFrameError> {
    let first = parts.first().ok_or_else(|| {
        LabelFrameError::DimensionMismatch("nothing to concatenate".to_string())
    })?;
    let dtype = first.dtype();
    if let Some(other) = parts.iter().find(|p| p.dtype() != dtype) {
        return Err(LabelFrameError::InconsistentDtype(format!(
            "cannot stack {} data with {} data",
            dtype,
            other.dtype()
        )));
    }
    Ok(dtype)
}

fn stack<T: Clone>(axis: Axis, views: &[ArrayView2<'_, T>]) -> Result<Array2<T>, LabelFrameError> {
    concatenate(axis, views).map_err(|e| LabelFrameError::DimensionMismatch(e.to_string()))
}

fn stack_along(axis: Axis, parts: &[&DataMatrix]) -> Result<DataMatrix, LabelFrameError> {
    match common_dtype(parts)? {
        DataType::Numeric => {
            let views: Vec<_> = parts.iter().filter_map(|p| p.as_numeric()).map(|a| a.view()).collect();
            Ok(DataMatrix::Numeric(stack(axis, &views)?))
        }
        DataType::Cell => {
            let views: Vec<_> = parts.iter().filter_map(|p| p.as_cells()).map(|a| a.view()).collect();
            Ok(DataMatrix::Cell(stack(axis, &views)?))
        }
    }
}

impl DataMatrix {
    /// Vertical stacking: the rows of every part, in order.
    ///
    /// # Errors
    /// * `InconsistentDtype` if the parts do not share one dtype.
    /// * `DimensionMismatch` if their column counts differ.
    pub fn concatenate(parts: &[&DataMatrix]) -> Result<Self, LabelFrameError> {
        common_dtype(parts)?;
        let cols = parts[0].cols();
        if let Some(bad) = parts.iter().find(|p| p.cols() != cols) {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "cannot stack a matrix with {} columns onto one with {}",
                bad.cols(),
                cols
            )));
        }
        stack_along(Axis(0), parts)
    }

    /// Horizontal stacking: the columns of every part, side by side.
    pub fn concatenate_columns(parts: &[&DataMatrix]) -> Result<Self, LabelFrameError> {
        common_dtype(parts)?;
        let rows = parts[0].rows();
        if let Some(bad) = parts.iter().find(|p| p.rows() != rows) {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "cannot join a matrix with {} rows beside one with {}",
                bad.rows(),
                rows
            )));
        }
        stack_along(Axis(1), parts)
    }
}

//==================================================================================
// 4. Row Selection & Reduction
//==================================================================================

impl DataMatrix {
    /// The rows set in `rows`, in order.
    pub fn select_rows(&self, rows: &Mask) -> Result<Self, LabelFrameError> {
        if rows.len() != self.rows() {
            return Err(LabelFrameError::DimensionMismatch(format!(
                "row mask has {} rows but the matrix has {}",
                rows.len(),
                self.rows()
            )));
        }
        let picked = mask::indices(rows);
        Ok(map_variant!(self, |a| a.select(Axis(0), &picked)))
    }

    /// Folds each group of row indices into one output row. Numeric data only.
    pub fn reduce_rows(&self, groups: &[Vec<usize>], how: Reduction) -> Result<Self, LabelFrameError> {
        let a = self.as_numeric().ok_or_else(|| {
            LabelFrameError::UnsupportedOperation(format!("{:?} is not defined for cell data", how))
        })?;

        let mut out = Array2::<f64>::zeros((groups.len(), a.ncols()));
        for (group, mut target) in groups.iter().zip(out.rows_mut()) {
            if group.is_empty() {
                return Err(LabelFrameError::DimensionMismatch(
                    "cannot reduce an empty group of rows".to_string(),
                ));
            }
            if let Some(&bad) = group.iter().find(|&&r| r >= a.nrows()) {
                return Err(LabelFrameError::InvalidIndex {
                    index: bad as u64,
                    len: a.nrows(),
                });
            }
            let summed = a.select(Axis(0), group).sum_axis(Axis(0));
            match how {
                Reduction::Sum => target.assign(&summed),
                Reduction::Mean => target.assign(&(summed / group.len() as f64)),
            }
        }
        Ok(DataMatrix::Numeric(out))
    }
}
