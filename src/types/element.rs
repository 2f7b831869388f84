//! Element-level payload types: the values a data matrix is built from, and
//! the element-wise arithmetic of heterogeneous cells.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::LabelFrameError;

//==================================================================================
// 1. Arithmetic Operators
//==================================================================================

/// The row-wise arithmetic operators a table supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithOp {
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Subtract => lhs - rhs,
            ArithOp::Multiply => lhs * rhs,
            ArithOp::Divide => lhs / rhs,
        }
    }

    /// Cell payloads only define addition and subtraction.
    pub fn allowed_on_cells(self) -> bool {
        matches!(self, ArithOp::Add | ArithOp::Subtract)
    }
}

//==================================================================================
// 2. Cell Values
//==================================================================================

/// The contents of one heterogeneous cell.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CellValue {
    Scalar(f64),
    Array(Array1<f64>),
    Text(String),
}

impl CellValue {
    /// Combines two cells element by element.
    ///
    /// Scalars broadcast against arrays; arrays must have equal lengths. Text
    /// cells and any operator other than add/subtract are rejected.
    pub fn combine(&self, rhs: &CellValue, op: ArithOp) -> Result<CellValue, LabelFrameError> {
        if !op.allowed_on_cells() {
            return Err(LabelFrameError::UnsupportedOperation(format!(
                "{:?} is not defined for cell data",
                op
            )));
        }
        match (self, rhs) {
            (CellValue::Scalar(a), CellValue::Scalar(b)) => Ok(CellValue::Scalar(op.apply(*a, *b))),
            (CellValue::Array(a), CellValue::Array(b)) => {
                if a.len() != b.len() {
                    return Err(LabelFrameError::DimensionMismatch(format!(
                        "cell arrays of length {} and {} cannot be combined",
                        a.len(),
                        b.len()
                    )));
                }
                let values = a.iter().zip(b.iter()).map(|(x, y)| op.apply(*x, *y));
                Ok(CellValue::Array(values.collect()))
            }
            (CellValue::Scalar(a), CellValue::Array(b)) => {
                Ok(CellValue::Array(b.mapv(|y| op.apply(*a, y))))
            }
            (CellValue::Array(a), CellValue::Scalar(b)) => {
                Ok(CellValue::Array(a.mapv(|x| op.apply(x, *b))))
            }
            (CellValue::Text(_), _) | (_, CellValue::Text(_)) => {
                Err(LabelFrameError::UnsupportedOperation(
                    "arithmetic on text cells".to_string(),
                ))
            }
        }
    }
}

//==================================================================================
// 3. Raw Payload Elements
//==================================================================================

/// One raw payload element as supplied across the persistence boundary.
///
/// The variant of the first element decides the dtype of the whole matrix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Element {
    Number(f64),
    Cell(CellValue),
    Text(String),
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Element::Number(value)
    }
}

impl From<CellValue> for Element {
    fn from(value: CellValue) -> Self {
        Element::Cell(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scalar_broadcasts_over_array() {
        let a = CellValue::Array(array![1.0, 2.0, 3.0]);
        let b = CellValue::Scalar(10.0);
        assert_eq!(
            a.combine(&b, ArithOp::Add).unwrap(),
            CellValue::Array(array![11.0, 12.0, 13.0])
        );
        assert_eq!(
            b.combine(&a, ArithOp::Subtract).unwrap(),
            CellValue::Array(array![9.0, 8.0, 7.0])
        );
    }

    #[test]
    fn test_mismatched_arrays_rejected() {
        let a = CellValue::Array(array![1.0, 2.0]);
        let b = CellValue::Array(array![1.0]);
        assert!(matches!(
            a.combine(&b, ArithOp::Add),
            Err(LabelFrameError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_divide_and_text_rejected() {
        let a = CellValue::Scalar(4.0);
        assert!(matches!(
            a.combine(&a, ArithOp::Divide),
            Err(LabelFrameError::UnsupportedOperation(_))
        ));
        let t = CellValue::Text("abc".into());
        assert!(matches!(
            t.combine(&a, ArithOp::Add),
            Err(LabelFrameError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_untagged_element_json() {
        let parsed: Vec<Element> =
            serde_json::from_str(r#"[1.5, "oops", {"Scalar": 2.0}]"#).unwrap();
        assert_eq!(parsed[0], Element::Number(1.5));
        assert_eq!(parsed[1], Element::Text("oops".into()));
        assert_eq!(parsed[2], Element::Cell(CellValue::Scalar(2.0)));
    }
}
