// In: src/table/bundle.rs

//! The persistence boundary.
//!
//! Loaders outside this crate hand tables over as a `TableBundle`: the raw
//! payload rows plus one array of labels per field. The only contract is that
//! a bundle round-trips through `Table` construction, so every check lives in
//! `Table::new` and its callees. Labels arrive as arbitrary JSON values and
//! anything that is not a string is rejected here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::DataMatrix;
use crate::error::LabelFrameError;
use crate::labels::LabelStore;
use crate::table::Table;
use crate::types::Element;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldBundle {
    pub name: String,
    pub labels: Vec<Value>,
    /// The field may carry labels that also occur in other fields.
    #[serde(default)]
    pub shared: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TableBundle {
    /// Row-major payload, one inner vector per row.
    pub data: Vec<Vec<Element>>,
    pub fields: Vec<FieldBundle>,
}

impl TableBundle {
    pub fn from_json_str(json: &str) -> Result<Self, LabelFrameError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, LabelFrameError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FieldBundle {
    fn string_labels(&self) -> Result<Vec<&str>, LabelFrameError> {
        self.labels
            .iter()
            .enumerate()
            .map(|(row, value)| {
                value.as_str().ok_or_else(|| LabelFrameError::InvalidLabelKind {
                    field: self.name.clone(),
                    reason: format!("row {} holds {} instead of a string", row, value),
                })
            })
            .collect()
    }
}

impl Table {
    /// Validates and builds a table from a bundle.
    pub fn from_bundle(bundle: &TableBundle) -> Result<Self, LabelFrameError> {
        let data = DataMatrix::from_elements(&bundle.data)?;
        let mut labels = LabelStore::new(data.rows());
        for field in &bundle.fields {
            let raw = field.string_labels()?;
            labels = if field.shared {
                labels.add_field_shared(&field.name, &raw)?
            } else {
                labels.add_field(&field.name, &raw)?
            };
        }
        Self::new(data, labels)
    }

    pub fn to_bundle(&self) -> TableBundle {
        let store = self.labels();
        let shared = store.shared_labels();
        let fields = store
            .catalogs()
            .iter()
            .map(|catalog| FieldBundle {
                name: catalog.field().to_string(),
                labels: catalog
                    .decompress()
                    .iter()
                    .map(|label| Value::String(label.to_string()))
                    .collect(),
                shared: catalog.unique_labels().iter().any(|l| shared.contains(l)),
            })
            .collect();
        TableBundle {
            data: self.data().to_elements(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BUNDLE: &str = r#"{
        "data": [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
        "fields": [
            {"name": "outcome", "labels": ["hit", "miss", "hit"]},
            {"name": "trial", "labels": ["t1", "t1", "t2"]}
        ]
    }"#;

    #[test]
    fn test_bundle_round_trips_through_table() {
        let bundle = TableBundle::from_json_str(BUNDLE).unwrap();
        let table = Table::from_bundle(&bundle).unwrap();
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(table.field_names(), vec!["outcome", "trial"]);

        let back = table.to_bundle();
        assert_eq!(back, bundle);

        let json = back.to_json_string().unwrap();
        let reread = Table::from_bundle(&TableBundle::from_json_str(&json).unwrap()).unwrap();
        assert!(reread.equals(&table));
    }

    #[test]
    fn test_shared_fields_survive_the_round_trip() {
        let table = Table::from_columns(
            DataMatrix::from_elements(&[vec![Element::Number(1.0)], vec![Element::Number(2.0)]])
                .unwrap(),
            &[("a", vec!["x", "y"])],
        )
        .unwrap()
        .add_field_shared("b", &["z", "x"])
        .unwrap();

        let bundle = table.to_bundle();
        assert!(bundle.fields.iter().all(|f| f.shared));

        let json = bundle.to_json_string().unwrap();
        let reread = Table::from_bundle(&TableBundle::from_json_str(&json).unwrap()).unwrap();
        assert_eq!(reread, table);

        // Without the flag the shared label is refused as before.
        let mut strict = bundle.clone();
        strict.fields.iter_mut().for_each(|f| f.shared = false);
        assert!(matches!(
            Table::from_bundle(&strict),
            Err(LabelFrameError::AmbiguousTarget { .. })
        ));
    }

    #[test]
    fn test_non_string_label_rejected() {
        let bundle = TableBundle {
            data: vec![vec![Element::Number(1.0)]],
            fields: vec![FieldBundle {
                name: "trial".to_string(),
                labels: vec![json!(7)],
                shared: false,
            }],
        };
        assert!(matches!(
            Table::from_bundle(&bundle),
            Err(LabelFrameError::InvalidLabelKind { ref field, .. }) if field == "trial"
        ));
    }

    #[test]
    fn test_bundle_checks_row_counts() {
        let bundle = TableBundle {
            data: vec![vec![Element::Number(1.0)], vec![Element::Number(2.0)]],
            fields: vec![FieldBundle {
                name: "trial".to_string(),
                labels: vec![json!("t1")],
                shared: false,
            }],
        };
        assert!(matches!(
            Table::from_bundle(&bundle),
            Err(LabelFrameError::DimensionMismatch(_))
        ));

        let unlabelled = TableBundle {
            data: vec![vec![Element::Number(1.0)]],
            fields: vec![],
        };
        assert!(matches!(
            Table::from_bundle(&unlabelled),
            Err(LabelFrameError::EmptyLabelSet)
        ));
    }
}
