//! Formatted output helpers for CLI commands.
//!
//! Provides consistent placeholders for missing values and compact
//! rendering of flags and timestamps.

use std::fmt::Display;

/// Formats an optional value, using "-" when absent.
#[must_use]
pub fn format_optional<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Formats a capability flag as "yes" or "no".
#[must_use]
pub const fn format_flag(enabled: bool) -> &'static str {
    if enabled { "yes" } else { "no" }
}

/// Shortens an RFC 3339 timestamp to `YYYY-MM-DD HH:MM:SS`.
///
/// Strings too short to be a timestamp are returned unchanged.
#[must_use]
pub fn format_timestamp(rfc3339: &str) -> String {
    rfc3339.get(..19).unwrap_or(rfc3339).replacen('T', " ", 1)
}
