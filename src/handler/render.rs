//! # Body Rendering
//!
//! Turns a resolved status and message into response bytes, either as a
//! minimal HTML document or as a single line of plain text.
//!
//! # Examples
//! ```rust
//! use axum::http::StatusCode;
//! use final_handler::handler::negotiate::MediaKind;
//! use final_handler::handler::render::render;
//!
//! let body = render(MediaKind::Text, StatusCode::NOT_FOUND, "Cannot GET /missing");
//! assert_eq!(&body.bytes[..], b"Cannot GET /missing\n");
//! assert_eq!(body.content_type, "text/plain; charset=utf-8");
//! ```

use askama::Template;
use axum::{body::Bytes, http::StatusCode};
use tracing::debug;

use crate::handler::negotiate::MediaKind;
use crate::handler::reason::reason_phrase;

/// Encoded response body tagged with its media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedBody {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

impl RenderedBody {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Static document shell. Both fields are escaped before rendering.
#[derive(Template)]
#[template(
    source = "<!DOCTYPE html><html lang=en><head><meta charset=utf-8><title>{{ title|safe }}</title></head><body>{{ body|safe }}</body></html>",
    ext = "html"
)]
struct ErrorDocument<'a> {
    title: &'a str,
    body: &'a str,
}

/// Render `message` in the negotiated representation.
pub fn render(kind: MediaKind, status: StatusCode, message: &str) -> RenderedBody {
    match kind {
        MediaKind::Html => render_html(status, message).unwrap_or_else(|e| {
            debug!(error = %e, "error document failed to render, using plain text");
            render_text(message)
        }),
        MediaKind::Text => render_text(message),
    }
}

/// HTML document whose title is the reason phrase for `status`.
///
/// Newlines in the message become `<br>` and runs of two spaces keep
/// their width with a non-breaking space.
pub fn render_html(status: StatusCode, message: &str) -> Result<RenderedBody, askama::Error> {
    let title = escape_html(&reason_phrase(status));
    let body = escape_html(message)
        .replace('\n', "<br>")
        .replace("  ", " &nbsp;");

    let html = ErrorDocument {
        title: &title,
        body: &body,
    }
    .render()?;

    Ok(RenderedBody {
        bytes: Bytes::from(html),
        content_type: MediaKind::Html.content_type(),
    })
}

/// The message followed by a newline.
pub fn render_text(message: &str) -> RenderedBody {
    let mut text = String::with_capacity(message.len() + 1);
    text.push_str(message);
    text.push('\n');

    RenderedBody {
        bytes: Bytes::from(text),
        content_type: MediaKind::Text.content_type(),
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
