//! JSON output helpers.
//!
//! `--json` swaps YAML documents for pretty-printed JSON and turns failures
//! into an error object on stdout.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::error::{ChartError, ConfigurationError, ResolutionError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable `code` for the error object, from the typed error at the root
/// of the chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<ConfigurationError>().is_some() {
        "configuration"
    } else if err.downcast_ref::<ResolutionError>().is_some() {
        "resolution"
    } else if err.downcast_ref::<ChartError>().is_some() {
        "chart"
    } else {
        "error"
    }
}

/// Pretty-print any serializable value.
///
/// # Errors
///
/// Returns an error if `value` cannot be represented as JSON.
pub fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}
