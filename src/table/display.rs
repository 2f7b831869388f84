// In: src/table/display.rs

//! A read-only projection of a table's labels for display: per field, the
//! sorted unique labels, capped unless the config asks for everything.

use std::fmt;

use colored::*;

use crate::config::LabelFrameConfig;
use crate::table::Table;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub field: String,
    /// Total number of unique labels, including any not listed.
    pub n_labels: usize,
    /// The listed labels, sorted.
    pub labels: Vec<String>,
}

impl FieldSummary {
    pub fn hidden(&self) -> usize {
        self.n_labels - self.labels.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSummary {
    pub n_rows: usize,
    pub dtype: DataType,
    pub shape: (usize, usize),
    pub fields: Vec<FieldSummary>,
}

impl Table {
    pub fn describe(&self, config: &LabelFrameConfig) -> LabelSummary {
        let cap = config.label_cap();
        let fields = self
            .labels()
            .catalogs()
            .iter()
            .map(|catalog| {
                let sorted = catalog.sorted_labels();
                let shown = cap.map_or(sorted.len(), |c| c.min(sorted.len()));
                FieldSummary {
                    field: catalog.field().to_string(),
                    n_labels: sorted.len(),
                    labels: sorted[..shown].iter().map(|s| s.to_string()).collect(),
                }
            })
            .collect();

        LabelSummary {
            n_rows: self.n_rows(),
            dtype: self.dtype(),
            shape: self.shape(),
            fields,
        }
    }
}

impl fmt::Display for LabelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}x{} {} table",
            "Table".bold(),
            self.shape.0,
            self.shape.1,
            self.dtype.to_string().cyan()
        )?;
        for field in &self.fields {
            write!(
                f,
                "  {} ({}): {}",
                field.field.green().bold(),
                field.n_labels,
                field.labels.join(", ")
            )?;
            if field.hidden() > 0 {
                write!(f, " {}", format!("... {} more", field.hidden()).dimmed())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataMatrix;
    use ndarray::Array2;

    fn table() -> Table {
        let subjects: Vec<String> = (0..25).map(|i| format!("s{:02}", 24 - i)).collect();
        Table::from_columns(
            DataMatrix::numeric(Array2::zeros((25, 1))),
            &[("subject", subjects)],
        )
        .unwrap()
    }

    #[test]
    fn test_describe_caps_at_threshold() {
        let summary = table().describe(&LabelFrameConfig::default());
        let subject = &summary.fields[0];
        assert_eq!(subject.n_labels, 25);
        assert_eq!(subject.labels.len(), 20);
        assert_eq!(subject.labels[0], "s00");
        assert_eq!(subject.hidden(), 5);
    }

    #[test]
    fn test_verbose_lists_everything() {
        let config = LabelFrameConfig {
            verbose: true,
            ..Default::default()
        };
        let summary = table().describe(&config);
        assert_eq!(summary.fields[0].labels.len(), 25);

        colored::control::set_override(false);
        let text = summary.to_string();
        assert!(text.contains("subject (25): s00, s01"));
        assert!(!text.contains("more"));
    }
}
