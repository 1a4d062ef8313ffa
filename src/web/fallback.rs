//! # Router Fallback
//!
//! Axum entry points to the final handler: [`not_found`] as the router
//! fallback and [`respond`] for error-handling middleware.
//!
//! Both read the request's `Accept` header to choose between HTML and
//! plain text, and read the request body off the connection before the
//! response is built.
//!
//! An [`OnError`] request extension receives every error passed to
//! [`respond`]. It runs on a spawned task after the response is built.
//!
//! # Example
//! ```rust,no_run
//! use axum::{routing::get, Extension, Router};
//! use final_handler::config::handler::FinalHandlerConfig;
//! use final_handler::web::fallback::{not_found, OnError};
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "home" }))
//!     .fallback(not_found)
//!     .layer(Extension(OnError::new(|err, ctx| {
//!         eprintln!("{} {} failed: {err}", ctx.method, ctx.url);
//!     })))
//!     .layer(Extension(FinalHandlerConfig::from_env()));
//! ```

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request},
    http::{header::CONNECTION, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::config::handler::FinalHandlerConfig;
use crate::error::signal::HandlerError;
use crate::handler::final_handler::defer;
use crate::handler::finalize::Reply;
use crate::handler::negotiate::{negotiate, Accept};
use crate::handler::render::render;
use crate::handler::resolve::{resolve, Exchange, Resolution};
use crate::web::reply::build_response;

/// What the reporter learns about the failed exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorContext {
    pub method: Method,
    /// Original URL when a router rewrote it.
    pub url: String,
    pub status: StatusCode,
}

/// Error reporter installed as a request extension.
#[derive(Clone)]
pub struct OnError(Arc<dyn Fn(HandlerError, ErrorContext) + Send + Sync>);

impl OnError {
    pub fn new<F>(report: F) -> Self
    where
        F: Fn(HandlerError, ErrorContext) + Send + Sync + 'static,
    {
        Self(Arc::new(report))
    }
}

impl fmt::Debug for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnError")
    }
}

/// Final 404 handler for an axum router.
///
/// Responds `404 Not Found` with a `Cannot <METHOD> <URL>` message.
/// Settings come from a [`FinalHandlerConfig`] request extension when one
/// is installed, defaults otherwise.
pub async fn not_found(req: Request) -> Response {
    let cfg = req
        .extensions()
        .get::<FinalHandlerConfig>()
        .cloned()
        .unwrap_or_default();

    respond(&cfg, None, req).await
}

/// Terminal response for `req`: a 404 without `err`, an error response
/// with it.
///
/// Up to `cfg.drain_limit` bytes of the request body are read first. When
/// the body is larger or fails, the response asks the transport to close
/// the connection.
///
/// When `err` is set and an [`OnError`] extension is installed, the
/// reporter is scheduled after the response is built, never inline.
pub async fn respond(cfg: &FinalHandlerConfig, err: Option<HandlerError>, req: Request) -> Response {
    let (mut parts, body) = req.into_parts();
    let reporter = parts.extensions.remove::<OnError>();

    let url = parts.uri.to_string();
    let original_url = parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.to_string());

    let exchange = Exchange {
        method: &parts.method,
        url: &url,
        original_url: original_url.as_deref(),
        current_status: StatusCode::OK.as_u16(),
        headers_sent: false,
    };

    let outcome = match resolve(err.as_ref(), &exchange, cfg.stacktrace) {
        Resolution::Respond(outcome) => outcome,
        // Only produced for responses already in flight.
        Resolution::Skip => return ().into_response(),
    };
    debug!(status = outcome.status.as_u16(), "default {}", outcome.status.as_u16());

    let drained = axum::body::to_bytes(body, cfg.drain_limit).await.is_ok();

    let kind = negotiate(&Accept::from_headers(&parts.headers));
    let reply = Reply {
        status: outcome.status,
        extra_headers: outcome.headers,
        body: render(kind, outcome.status, &outcome.message),
    };

    let mut response = build_response(reply, &parts.method);
    if !drained {
        debug!(limit = cfg.drain_limit, "request body not drained, closing connection");
        response
            .headers_mut()
            .insert(CONNECTION, HeaderValue::from_static("close"));
    }

    match (err, reporter) {
        (Some(err), Some(OnError(report))) => {
            let ctx = ErrorContext {
                method: parts.method,
                url: original_url.unwrap_or(url),
                status: outcome.status,
            };
            defer(move || report(err, ctx));
        }
        (Some(err), None) => debug!(error = %err, "no error reporter installed"),
        (None, _) => {}
    }
    response
}
