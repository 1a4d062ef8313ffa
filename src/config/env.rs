//! # Environment Readers
//!
//! Typed readers over a key provider (`Fn(&str) -> Option<String>`), so
//! the same code reads the process environment in production and a map in
//! tests. Each reader falls back to its default when the key is missing
//! or the value is not understood.
//!
//! # Example
//! ```rust
//! use final_handler::config::env::{read_flag_from, read_usize_from};
//!
//! let get = |k: &str| match k {
//!     "STACKTRACE" => Some("'On'".to_string()),
//!     "LIMIT" => Some(" 4096 ".to_string()),
//!     _ => None,
//! };
//! assert!(read_flag_from(&get, "STACKTRACE", false));
//! assert_eq!(read_usize_from(&get, "LIMIT", 1), 4096);
//! assert_eq!(read_usize_from(&get, "MISSING", 1), 1);
//! ```

/// Interpret `raw` as a boolean switch.
///
/// Case-insensitive, surrounding whitespace and quotes ignored.
fn parse_flag(raw: &str) -> Option<bool> {
    let value = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_ascii_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Reads a boolean switch named `name` from `provider`.
pub fn read_flag_from<F>(provider: F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    provider(name)
        .and_then(|raw| parse_flag(&raw))
        .unwrap_or(default)
}

/// Reads a non-negative size named `name` from `provider`.
pub fn read_usize_from<F>(provider: F, name: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    provider(name)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
