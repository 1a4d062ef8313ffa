//! # Axum Response Building
//!
//! Converts a finalized [`Reply`] into an axum [`Response`], and lets
//! handlers return [`HandlerError`] directly.
//!
//! # Example
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use final_handler::error::signal::HandlerError;
//!
//! async fn load() -> Result<String, HandlerError> {
//!     Err(HandlerError::new("database unavailable").with_status(503))
//! }
//!
//! let app: Router = Router::new().route("/load", get(load));
//! ```

use axum::{
    body::Body,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};

use crate::error::signal::HandlerError;
use crate::handler::finalize::Reply;
use crate::handler::reason::reason_phrase;
use crate::handler::render::render_text;
use crate::handler::resolve::error_status;

/// Build the HTTP response for `reply`. HEAD responses keep the full
/// `Content-Length` but carry no body.
pub fn build_response(reply: Reply, method: &Method) -> Response {
    let headers = reply.headers();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(reply.body.bytes)
    };

    let mut response = Response::new(body);
    *response.status_mut() = reply.status;
    *response.headers_mut() = headers;
    response
}

/// Renders without request context: plain text, reason phrase only.
impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, from_error) = error_status(&self, 500);
        let extra_headers = if from_error { self.headers } else { HeaderMap::new() };

        let reply = Reply {
            status,
            extra_headers,
            body: render_text(&reason_phrase(status)),
        };
        build_response(reply, &Method::GET)
    }
}
