//! This module defines the canonical, type-safe representation of a data
//! matrix's payload kind.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LabelFrameError;
use crate::types::element::Element;

/// The payload kind of a `DataMatrix`.
///
/// A matrix holds exactly one kind for its whole life; changing it means
/// building a new matrix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// A homogeneous `f64` matrix.
    Numeric,
    /// A matrix of heterogeneous cells, each holding its own composite value.
    Cell,
}

impl DataType {
    /// Determines the dtype of a payload from its first element.
    ///
    /// Bare numbers make a numeric payload and composite cells make a cell
    /// payload. Anything else is rejected.
    pub fn from_element(element: &Element) -> Result<Self, LabelFrameError> {
        match element {
            Element::Number(_) => Ok(Self::Numeric),
            Element::Cell(_) => Ok(Self::Cell),
            Element::Text(text) => Err(LabelFrameError::UnsupportedDtype(format!(
                "cannot build a data matrix from bare text ('{}')",
                text
            ))),
        }
    }

    /// Returns `true` if the payload supports all four arithmetic operators.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric)
    }
}

/// Provides the canonical string representation for a `DataType`.
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Cell => write!(f, "cell"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    #[test]
    fn test_from_first_element() {
        assert_eq!(
            DataType::from_element(&Element::Number(1.0)).unwrap(),
            DataType::Numeric
        );
        assert_eq!(
            DataType::from_element(&Element::Cell(CellValue::Scalar(1.0))).unwrap(),
            DataType::Cell
        );
        assert!(matches!(
            DataType::from_element(&Element::Text("x".into())),
            Err(LabelFrameError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_display_and_serde_names_agree() {
        assert_eq!(DataType::Numeric.to_string(), "numeric");
        assert_eq!(serde_json::to_string(&DataType::Cell).unwrap(), "\"cell\"");
    }
}
