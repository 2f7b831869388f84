//! This module provides the logging and diagnostics hooks for labelframe.
//!
//! Label indexes are cheap to query and expensive to rebuild, so it pays to see
//! when a rebuild happens. The `log_metric!` macro emits one structured
//! key-value line per event through the `log` facade. Its body sits behind
//! `#[cfg(debug_assertions)]`, so release builds compile every call out.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::LabelFrameError;

/// Logs a structured key-value metric line at debug level, only in debug builds.
///
/// # Example
/// ```
/// use labelframe::log_metric;
/// let n_labels = 4;
/// log_metric!("event"="assign_true", "lists"=&n_labels);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            // Collect each pair as a JSON string fragment
            let mut parts: Vec<String> = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::observability::emit_metric(&parts);
        }
    };
}

/// Sink for `log_metric!`. Not meant to be called directly.
#[doc(hidden)]
pub fn emit_metric(parts: &[String]) {
    log::debug!("LABELFRAME_METRIC: {{ {} }}", parts.join(", "));
}

//==================================================================================
// Logger Installation
//==================================================================================

static INIT_LOGGER: Once = Once::new();

/// Turns on `Info`-level logging for the whole crate, optionally appending to a file.
/// Only the first call installs a logger; later calls are no-ops.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), LabelFrameError> {
    enable_logging_at(LevelFilter::Info, log_file)
}

pub(crate) fn enable_logging_at(
    level: LevelFilter,
    log_file: Option<&str>,
) -> Result<(), LabelFrameError> {
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_logging_is_idempotent() {
        enable_verbose_logging(None).unwrap();
        enable_verbose_logging(None).unwrap();
        log_metric!("event" = "test", "value" = 1);
    }

    #[test]
    fn test_unwritable_log_file_is_an_io_error() {
        let result = enable_verbose_logging(Some("/nonexistent-dir/labelframe/log.txt"));
        assert!(matches!(result, Err(LabelFrameError::Io(_))));
    }
}
