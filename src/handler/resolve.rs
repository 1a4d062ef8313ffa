//! # Status and Message Resolution
//!
//! Decides what the final response says: which status code, which
//! message, and whether any response should be produced at all.
//!
//! The resolver is pure. Scheduling the error reporter and destroying the
//! socket are left to [`FinalHandler`](crate::handler::FinalHandler).

use axum::http::{HeaderMap, Method, StatusCode};

use crate::error::signal::HandlerError;
use crate::handler::reason::reason_phrase;

/// Request/response state read by the resolver.
#[derive(Clone, Copy, Debug)]
pub struct Exchange<'a> {
    pub method: &'a Method,
    /// Current (possibly rewritten) request URL.
    pub url: &'a str,
    /// URL as originally received, before any mount-point rewriting.
    pub original_url: Option<&'a str>,
    /// Status code currently set on the response.
    pub current_status: u16,
    pub headers_sent: bool,
}

/// The decided response.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub status: StatusCode,
    pub message: String,
    /// Headers contributed by the error signal.
    pub headers: HeaderMap,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// No error and the response is already in flight: do nothing.
    Skip,
    Respond(Outcome),
}

/// Resolve the final status and message for one invocation.
///
/// # Example
/// ```
/// use axum::http::{Method, StatusCode};
/// use final_handler::handler::resolve::{resolve, Exchange, Resolution};
///
/// let exchange = Exchange {
///     method: &Method::GET,
///     url: "/missing",
///     original_url: None,
///     current_status: 200,
///     headers_sent: false,
/// };
///
/// let Resolution::Respond(outcome) = resolve(None, &exchange, false) else {
///     unreachable!()
/// };
/// assert_eq!(outcome.status, StatusCode::NOT_FOUND);
/// assert_eq!(outcome.message, "Cannot GET /missing");
/// ```
pub fn resolve(err: Option<&HandlerError>, exchange: &Exchange<'_>, stacktrace: bool) -> Resolution {
    let Some(err) = err else {
        if exchange.headers_sent {
            return Resolution::Skip;
        }

        let resource = exchange.original_url.unwrap_or(exchange.url);
        return Resolution::Respond(Outcome {
            status: StatusCode::NOT_FOUND,
            message: format!("Cannot {} {}", exchange.method, resource),
            headers: HeaderMap::new(),
        });
    };

    let (status, from_error) = error_status(err, exchange.current_status);

    let message = stacktrace
        .then(|| err.diagnostic_text())
        .flatten()
        .map(str::to_owned)
        .unwrap_or_else(|| reason_phrase(status).into_owned());

    let headers = if from_error {
        err.headers.clone()
    } else {
        HeaderMap::new()
    };

    Resolution::Respond(Outcome {
        status,
        message,
        headers,
    })
}

/// Status for the failure path and whether it came from the error itself.
///
/// The error's preferred status wins over `current_status`. Anything
/// outside `400..=599` becomes `500`.
pub fn error_status(err: &HandlerError, current_status: u16) -> (StatusCode, bool) {
    let (candidate, from_error) = match err.preferred_status() {
        Some(status) => (status, true),
        None => (current_status, false),
    };

    match candidate {
        400..=599 => match StatusCode::from_u16(candidate) {
            Ok(status) => (status, from_error),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, false),
        },
        _ => (StatusCode::INTERNAL_SERVER_ERROR, false),
    }
}
