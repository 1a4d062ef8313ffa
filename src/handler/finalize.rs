//! # Response Finalization
//!
//! Writes the terminal response through the [`ResponseSink`] port, but
//! only after the [`RequestStream`] has been fully read. Ending a response
//! while another reader is still consuming the request body can corrupt a
//! pipelined or proxied byte stream.
//!
//! Both ports are cheap, cloneable handles to state owned by the server
//! loop. Methods take `&self`; implementations use interior mutability.

use axum::body::Bytes;
use axum::http::{
    header::{
        CONTENT_ENCODING, CONTENT_LANGUAGE, CONTENT_LENGTH, CONTENT_RANGE,
        CONTENT_SECURITY_POLICY, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS,
    },
    HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
};
use tracing::trace;

use crate::handler::render::RenderedBody;

/// Request side of an in-flight exchange.
pub trait RequestStream: Clone + Send + Sync + 'static {
    fn method(&self) -> Method;

    /// Current request URL (may have been rewritten by a router).
    fn url(&self) -> String;

    /// URL as first received, when it differs from [`RequestStream::url`].
    fn original_url(&self) -> Option<String>;

    /// `true` once every byte of the request has been read.
    fn is_finished(&self) -> bool;

    /// Detach every downstream reader of the request body.
    fn unpipe(&self);

    /// Register `callback` to run once the request is finished.
    ///
    /// Implementations must invoke it exactly once, including when the
    /// request finished between the caller's last [`is_finished`] check
    /// and this registration.
    ///
    /// [`is_finished`]: RequestStream::is_finished
    fn on_finished(&self, callback: Box<dyn FnOnce() + Send>);

    /// Resume reading (and discarding) the request body.
    fn resume(&self);

    /// Forcibly close the underlying connection.
    fn destroy_socket(&self);
}

/// Response side of an in-flight exchange.
pub trait ResponseSink: Clone + Send + Sync + 'static {
    /// Status currently set on the response.
    fn status(&self) -> u16;

    /// `true` once the status line and headers have been transmitted.
    fn headers_sent(&self) -> bool;

    fn set_status(&self, status: StatusCode);

    /// Replace every value of `name` with `value`.
    fn set_header(&self, name: HeaderName, value: HeaderValue);

    /// Add `value` alongside any existing values of `name`.
    fn append_header(&self, name: HeaderName, value: HeaderValue);

    fn remove_header(&self, name: &HeaderName);

    /// Finish the response, optionally writing a body first.
    fn end(&self, body: Option<Bytes>);
}

/// Everything the finalizer writes.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    /// Headers contributed by the error signal.
    pub extra_headers: HeaderMap,
    pub body: RenderedBody,
}

impl Reply {
    /// Full header set of the response, error headers first so the fixed
    /// headers override them.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = self.extra_headers.clone();
        headers.insert(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'"),
        );
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.body.content_type));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        headers
    }
}

/// Write `reply` once `req` is finished.
///
/// Returns `true` when the write happened immediately and `false` when it
/// was deferred until the request finishes.
pub fn finalize<R, S>(req: &R, res: &S, reply: Reply) -> bool
where
    R: RequestStream,
    S: ResponseSink,
{
    if req.is_finished() {
        write(req, res, reply);
        return true;
    }

    trace!(status = reply.status.as_u16(), "deferring write until request finishes");

    let (write_req, write_res) = (req.clone(), res.clone());
    req.unpipe();
    req.on_finished(Box::new(move || write(&write_req, &write_res, reply)));
    req.resume();
    false
}

fn write<R, S>(req: &R, res: &S, reply: Reply)
where
    R: RequestStream,
    S: ResponseSink,
{
    res.set_status(reply.status);

    // Left over from whatever representation an earlier handler started.
    for name in [CONTENT_ENCODING, CONTENT_LANGUAGE, CONTENT_RANGE] {
        res.remove_header(&name);
    }

    let headers = reply.headers();
    for name in headers.keys() {
        let mut values = headers.get_all(name).iter();
        if let Some(first) = values.next() {
            res.set_header(name.clone(), first.clone());
        }
        for value in values {
            res.append_header(name.clone(), value.clone());
        }
    }

    if req.method() == Method::HEAD {
        res.end(None);
    } else {
        res.end(Some(reply.body.bytes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::render::render_text;
    use crate::handler::testing::{MockRequest, MockResponse};
    use axum::http::header::RETRY_AFTER;

    fn reply(message: &str) -> Reply {
        Reply {
            status: StatusCode::NOT_FOUND,
            extra_headers: HeaderMap::new(),
            body: render_text(message),
        }
    }

    #[test]
    fn headers_include_fixed_security_headers() {
        let headers = reply("Not Found").headers();
        assert_eq!(headers.get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(CONTENT_SECURITY_POLICY).unwrap(), "default-src 'none'");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");
        assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "10");
    }

    #[test]
    fn fixed_headers_override_error_headers() {
        let mut r = reply("x");
        r.extra_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        r.extra_headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

        let headers = r.headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");
        assert_eq!(headers.get(RETRY_AFTER).unwrap(), "7");
    }

    #[test]
    fn finished_request_is_written_immediately() {
        let req = MockRequest::finished(Method::GET, "/missing");
        let res = MockResponse::new();

        assert!(finalize(&req, &res, reply("Cannot GET /missing")));

        let sent = res.snapshot();
        assert_eq!(sent.ends, 1);
        assert!(sent.headers_sent);
        assert_eq!(sent.status, 404);
        assert_eq!(sent.body.as_deref(), Some(&b"Cannot GET /missing\n"[..]));
        assert_eq!(sent.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(req.snapshot().unpiped, 0);
    }

    #[test]
    fn unfinished_request_defers_write_until_finished() {
        let req = MockRequest::streaming(Method::POST, "/upload");
        let res = MockResponse::new();

        assert!(!finalize(&req, &res, reply("Cannot POST /upload")));

        let state = req.snapshot();
        assert_eq!(state.calls, vec!["unpipe", "on_finished", "resume"]);
        assert_eq!(state.pending_callbacks, 1);
        assert_eq!(res.snapshot().ends, 0);

        req.finish();

        let sent = res.snapshot();
        assert_eq!(sent.ends, 1);
        assert_eq!(sent.status, 404);
        assert_eq!(sent.header("content-length"), Some("20"));
    }

    #[test]
    fn finished_request_skips_drain_calls() {
        let req = MockRequest::finished(Method::GET, "/");
        let res = MockResponse::default();

        finalize(&req, &res, reply("x"));

        assert!(req.snapshot().calls.is_empty());
        assert_eq!(res.snapshot().ends, 1);
    }

    #[test]
    fn head_request_ends_without_body_but_keeps_length() {
        let req = MockRequest::finished(Method::HEAD, "/missing");
        let res = MockResponse::new();

        finalize(&req, &res, reply("Cannot HEAD /missing"));

        let sent = res.snapshot();
        assert_eq!(sent.ends, 1);
        assert_eq!(sent.body, None);
        assert_eq!(sent.header("content-length"), Some("21"));
    }

    #[test]
    fn stale_representation_headers_are_removed() {
        let req = MockRequest::finished(Method::GET, "/");
        let res = MockResponse::new();
        res.set_header(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        res.set_header(CONTENT_LANGUAGE, HeaderValue::from_static("fr"));

        finalize(&req, &res, reply("x"));

        let sent = res.snapshot();
        assert_eq!(sent.header("content-encoding"), None);
        assert_eq!(sent.header("content-language"), None);
    }

    #[test]
    fn repeated_error_headers_are_all_written() {
        let req = MockRequest::finished(Method::GET, "/");
        let res = MockResponse::new();
        let mut r = reply("x");
        r.extra_headers.append("link", HeaderValue::from_static("</a>"));
        r.extra_headers.append("link", HeaderValue::from_static("</b>"));

        finalize(&req, &res, r);

        assert_eq!(res.snapshot().header_all("link"), vec!["</a>", "</b>"]);
    }
}
