//! JSON output helpers for `--json` code paths.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::Host;

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

/// Host summary as listed by `hap hosts --json`.
#[derive(Serialize)]
struct HostSummary<'a> {
    #[serde(flatten)]
    host: &'a Host,
    auth: &'static str,
}

/// Format resolved hosts as a pretty-printed JSON array. Secrets are never
/// included; only the authentication kind is.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_hosts(hosts: &[Host]) -> Result<String> {
    let summaries: Vec<_> = hosts
        .iter()
        .map(|host| HostSummary {
            host,
            auth: match host.auth {
                crate::domain::Auth::Identity(_) => "identity",
                crate::domain::Auth::Password(_) => "password",
            },
        })
        .collect();
    serde_json::to_string_pretty(&summaries).context("JSON serialization failed")
}
