// In: src/config.rs

//! The single source of truth for labelframe runtime configuration.
//!
//! `LabelFrameConfig` is created once at the application boundary (from a JSON
//! document or with `Default`) and passed by reference to the few operations
//! whose behavior is tunable: the display projection and the dense-to-sparse
//! mask construction path.

use serde::{Deserialize, Serialize};

use crate::error::LabelFrameError;

//==================================================================================
// I. Configuration Enums
//==================================================================================

/// Selects how per-label masks are produced when a dense label column is
/// converted back into its sparse catalog form.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// **Default:** Every label's row-index list is handed to the accelerator in
    /// one batch, which validates all indices up front and fills every mask in
    /// a single pass.
    #[default]
    Batched,

    /// One mask allocation and fill per label. Kept as the reference path and
    /// for benchmarking against `Batched`.
    PerLabel,
}

//==================================================================================
// II. The Unified LabelFrameConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct LabelFrameConfig {
    /// Maximum number of labels listed per field by `Table::describe`.
    #[serde(default = "default_display_threshold")]
    pub display_threshold: usize,

    /// If true, `Table::describe` lists every label regardless of the threshold.
    #[serde(default)]
    pub verbose: bool,

    /// The mask construction path used when building catalogs.
    #[serde(default)]
    pub mask_strategy: MaskStrategy,

    /// Log level used by `init_logging` (e.g. "debug"). `None` means "info".
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for LabelFrameConfig {
    fn default() -> Self {
        Self {
            display_threshold: default_display_threshold(),
            verbose: false,
            mask_strategy: MaskStrategy::default(),
            log_level: None,
        }
    }
}

impl LabelFrameConfig {
    /// Parses a configuration from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, LabelFrameError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The number of labels to show per field, or `None` when uncapped.
    pub fn label_cap(&self) -> Option<usize> {
        if self.verbose {
            None
        } else {
            Some(self.display_threshold)
        }
    }

    /// Installs the crate logger at the configured level.
    pub fn init_logging(&self, log_file: Option<&str>) -> Result<(), LabelFrameError> {
        let level = match self.log_level.as_deref() {
            Some(raw) => raw.parse::<log::LevelFilter>().map_err(|_| {
                LabelFrameError::TypeMismatch(format!("'{}' is not a log level", raw))
            })?,
            None => log::LevelFilter::Info,
        };
        crate::observability::enable_logging_at(level, log_file)
    }
}

/// Helper for `serde` to provide a default for `display_threshold`.
fn default_display_threshold() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = LabelFrameConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LabelFrameConfig::default());
        assert_eq!(config.display_threshold, 20);
        assert_eq!(config.label_cap(), Some(20));
    }

    #[test]
    fn test_parse_overrides() {
        let config = LabelFrameConfig::from_json_str(
            r#"{"display_threshold": 5, "verbose": true, "mask_strategy": "per_label"}"#,
        )
        .unwrap();
        assert_eq!(config.display_threshold, 5);
        assert_eq!(config.mask_strategy, MaskStrategy::PerLabel);
        assert_eq!(config.label_cap(), None);
    }

    #[test]
    fn test_malformed_document_is_a_serde_error() {
        let result = LabelFrameConfig::from_json_str(r#"{"display_threshold": "many"}"#);
        assert!(matches!(result, Err(LabelFrameError::SerdeJson(_))));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let config = LabelFrameConfig {
            log_level: Some("chatty".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.init_logging(None),
            Err(LabelFrameError::TypeMismatch(_))
        ));
    }
}
