use std::borrow::Cow;

use axum::http::StatusCode;

/// Canonical reason phrase for a status code (e.g. 404 → `"Not Found"`).
///
/// Codes without a registered phrase fall back to their decimal form.
pub fn reason_phrase(status: StatusCode) -> Cow<'static, str> {
    match status.canonical_reason() {
        Some(reason) => Cow::Borrowed(reason),
        None => Cow::Owned(status.as_u16().to_string()),
    }
}
