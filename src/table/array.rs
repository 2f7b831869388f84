// In: src/table/array.rs

//! An ordered collection of tables ("points") and the rules for folding them
//! into one.
//!
//! Consistency is derived from the points and cached on first use. A new
//! array, with an empty cache, is returned by every operation that changes
//! the points.

use std::cell::OnceCell;
use std::collections::BTreeSet;

use crate::data::DataMatrix;
use crate::error::LabelFrameError;
use crate::table::Table;

/// Aggregate properties of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    /// Every point carries the same field set.
    pub consistent_labels: bool,
    /// Every point has the same dtype and shape.
    pub consistent_data: bool,
}

impl Consistency {
    pub fn consistent_obj(&self) -> bool {
        self.consistent_labels && self.consistent_data
    }
}

/// Compares every point's field set and data signature against the first.
/// An empty or single-point input is consistent.
pub fn determine_consistency(points: &[Table]) -> Consistency {
    let Some(first) = points.first() else {
        return Consistency {
            consistent_labels: true,
            consistent_data: true,
        };
    };

    let fields: BTreeSet<&str> = first.field_names().into_iter().collect();
    let consistent_labels = points.iter().all(|p| {
        let names = p.field_names();
        names.len() == fields.len() && names.iter().all(|n| fields.contains(n))
    });
    let consistent_data = points
        .iter()
        .all(|p| p.dtype() == first.dtype() && p.shape() == first.shape());

    Consistency {
        consistent_labels,
        consistent_data,
    }
}

/// The axis `flatten` joins along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinAxis {
    Rows,
    Columns,
}

#[derive(Debug, Clone, Default)]
pub struct TableArray {
    points: Vec<Table>,
    consistency: OnceCell<Consistency>,
}

impl PartialEq for TableArray {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl TableArray {
    pub fn new(points: Vec<Table>) -> Self {
        Self {
            points,
            consistency: OnceCell::new(),
        }
    }

    pub fn points(&self) -> &[Table] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Table> {
        self.points.get(index)
    }

    /// A new array with `point` appended.
    pub fn with_point(&self, point: Table) -> Self {
        let mut points = self.points.clone();
        points.push(point);
        Self::new(points)
    }

    pub fn consistency(&self) -> Consistency {
        *self
            .consistency
            .get_or_init(|| determine_consistency(&self.points))
    }

    pub fn consistent_labels(&self) -> bool {
        self.consistency().consistent_labels
    }

    pub fn consistent_data(&self) -> bool {
        self.consistency().consistent_data
    }

    pub fn consistent_obj(&self) -> bool {
        self.consistency().consistent_obj()
    }

    /// The one axis along which the points' shapes differ from the first.
    fn join_axis(&self) -> Result<JoinAxis, LabelFrameError> {
        let (rows, cols) = self.points[0].shape();
        let mut axis: Option<JoinAxis> = None;

        for (at, point) in self.points.iter().enumerate().skip(1) {
            let (r, c) = point.shape();
            let this = match (r != rows, c != cols) {
                (false, false) => continue,
                (true, true) => {
                    return Err(LabelFrameError::AmbiguousConcatenationAxis(format!(
                        "point {} is {}x{} but point 0 is {}x{}",
                        at, r, c, rows, cols
                    )))
                }
                (true, false) => JoinAxis::Rows,
                (false, true) => JoinAxis::Columns,
            };
            match axis {
                Some(seen) if seen != this => {
                    return Err(LabelFrameError::InconsistentDimensions(format!(
                        "points differ along more than one axis (point {} is {}x{})",
                        at, r, c
                    )))
                }
                _ => axis = Some(this),
            }
        }

        Ok(axis.unwrap_or(JoinAxis::Rows))
    }

    /// Folds every point into one table.
    ///
    /// Points whose shapes differ only in row count, or not at all, are
    /// stacked vertically and their labels appended. Points that differ only
    /// in column count are joined side by side; they must then carry the same
    /// labels on every row.
    ///
    /// # Errors
    /// * `InconsistentLabels` if the field sets differ, or if a column join
    ///   meets rows labelled differently.
    /// * `InconsistentDtype` if the dtypes differ.
    /// * `AmbiguousConcatenationAxis` if a point differs in rows and columns.
    /// * `InconsistentDimensions` if points differ along different axes.
    pub fn flatten(&self) -> Result<Table, LabelFrameError> {
        let first = self.points.first().ok_or_else(|| {
            LabelFrameError::DimensionMismatch("cannot flatten an empty array".to_string())
        })?;

        if !self.consistent_labels() {
            return Err(LabelFrameError::InconsistentLabels(
                "points do not share one field set".to_string(),
            ));
        }
        if let Some(other) = self.points.iter().find(|p| p.dtype() != first.dtype()) {
            return Err(LabelFrameError::InconsistentDtype(format!(
                "cannot flatten {} points with {} points",
                first.dtype(),
                other.dtype()
            )));
        }

        let axis = self.join_axis()?;
        log::info!("flattening {} points along {:?}", self.points.len(), axis);

        let refs: Vec<&Table> = self.points.iter().collect();
        match axis {
            JoinAxis::Rows => Table::concatenate(&refs),
            JoinAxis::Columns => {
                if let Some(at) = self
                    .points
                    .iter()
                    .position(|p| !p.labels().rows_match(first.labels()))
                {
                    return Err(LabelFrameError::InconsistentLabels(format!(
                        "point {} labels its rows differently from point 0",
                        at
                    )));
                }
                let matrices: Vec<&DataMatrix> = refs.iter().map(|t| t.data()).collect();
                let data = DataMatrix::concatenate_columns(&matrices)?;
                Table::new(data, first.labels().clone())
            }
        }
    }
}

impl From<Vec<Table>> for TableArray {
    fn from(points: Vec<Table>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::mask;
    use ndarray::Array2;

    fn point(rows: usize, cols: usize, trial: &str) -> Table {
        let data = DataMatrix::numeric(Array2::from_elem((rows, cols), 1.0));
        Table::from_columns(
            data,
            &[("trial", vec![trial; rows]), ("cond", vec!["ctl"; rows])],
        )
        .unwrap()
    }

    #[test]
    fn test_consistency_is_cached_per_array() {
        let array = TableArray::new(vec![point(2, 3, "t1"), point(2, 3, "t2")]);
        assert!(array.consistent_obj());

        let grown = array.with_point(point(4, 3, "t3"));
        assert!(grown.consistent_labels());
        assert!(!grown.consistent_data());
        assert!(array.consistent_data());
    }

    #[test]
    fn test_flatten_stacks_rows() {
        let array = TableArray::new(vec![point(2, 3, "t1"), point(1, 3, "t2")]);
        let flat = array.flatten().unwrap();
        assert_eq!(flat.shape(), (3, 3));
        let rows = flat.query(&["t2"], None).unwrap();
        assert_eq!(mask::indices(&rows), vec![2]);
    }

    #[test]
    fn test_flatten_joins_columns_when_rows_agree() {
        let array = TableArray::new(vec![point(2, 3, "t1"), point(2, 1, "t1")]);
        let flat = array.flatten().unwrap();
        assert_eq!(flat.shape(), (2, 4));

        let relabelled = TableArray::new(vec![point(2, 3, "t1"), point(2, 1, "t2")]);
        assert!(matches!(
            relabelled.flatten(),
            Err(LabelFrameError::InconsistentLabels(_))
        ));
    }

    #[test]
    fn test_flatten_axis_errors() {
        let both = TableArray::new(vec![point(2, 3, "t1"), point(1, 2, "t2")]);
        assert!(matches!(
            both.flatten(),
            Err(LabelFrameError::AmbiguousConcatenationAxis(_))
        ));

        let split = TableArray::new(vec![point(2, 3, "t1"), point(1, 3, "t2"), point(2, 1, "t1")]);
        assert!(matches!(
            split.flatten(),
            Err(LabelFrameError::InconsistentDimensions(_))
        ));
    }

    #[test]
    fn test_flatten_requires_same_fields() {
        let other = Table::from_columns(
            DataMatrix::numeric(Array2::zeros((1, 3))),
            &[("trial", vec!["t9"])],
        )
        .unwrap();
        let array = TableArray::new(vec![point(1, 3, "t1"), other]);
        assert!(!array.consistent_labels());
        assert!(matches!(
            array.flatten(),
            Err(LabelFrameError::InconsistentLabels(_))
        ));
    }
}
