use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::handler::FinalHandlerConfig;
use crate::error::signal::HandlerError;
use crate::handler::finalize::{finalize, Reply, RequestStream, ResponseSink};
use crate::handler::negotiate::{negotiate, Negotiate};
use crate::handler::render::render;
use crate::handler::resolve::{resolve, Exchange, Resolution};

/// Callback receiving every error that reaches the final handler.
pub type ErrorReporter<R, S> = Arc<dyn Fn(HandlerError, R, S) + Send + Sync>;

/// Per-handler options, fixed at construction.
pub struct Options<R, S> {
    /// Invoked with `(error, request, response)` on a later scheduling
    /// turn, never inside [`FinalHandler::handle`].
    pub onerror: Option<ErrorReporter<R, S>>,
    /// Put error detail text into the response body.
    pub stacktrace: bool,
}

impl<R, S> Options<R, S> {
    pub fn from_config(cfg: &FinalHandlerConfig) -> Self {
        Self {
            onerror: None,
            stacktrace: cfg.stacktrace,
        }
    }

    pub fn with_onerror<F>(mut self, onerror: F) -> Self
    where
        F: Fn(HandlerError, R, S) + Send + Sync + 'static,
    {
        self.onerror = Some(Arc::new(onerror));
        self
    }
}

impl<R, S> Default for Options<R, S> {
    fn default() -> Self {
        Self {
            onerror: None,
            stacktrace: false,
        }
    }
}

impl<R, S> Clone for Options<R, S> {
    fn clone(&self) -> Self {
        Self {
            onerror: self.onerror.clone(),
            stacktrace: self.stacktrace,
        }
    }
}

impl<R, S> fmt::Debug for Options<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("onerror", &self.onerror.is_some())
            .field("stacktrace", &self.stacktrace)
            .finish()
    }
}

/// What a single [`FinalHandler::handle`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// No error and the response was already in flight.
    Ignored,
    /// An error arrived after headers were sent; the socket was destroyed.
    SocketDestroyed,
    /// The response was written before `handle` returned.
    Written,
    /// The write waits for the request stream to finish.
    Deferred,
}

/// Terminal handler bound to one request/response pair.
///
/// # Example
/// ```ignore
/// FinalHandler::new(req, res, Options::default()).handle(None); // 404 "Cannot GET /path"
/// ```
pub struct FinalHandler<R, S> {
    req: R,
    res: S,
    options: Options<R, S>,
}

impl<R, S> FinalHandler<R, S>
where
    R: RequestStream + Negotiate,
    S: ResponseSink,
{
    pub fn new(req: R, res: S, options: Options<R, S>) -> Self {
        Self { req, res, options }
    }

    /// Produce the terminal response for `err` (or a 404 when `None`).
    ///
    /// Consumes the handler: one exchange gets exactly one decision.
    pub fn handle(self, err: Option<HandlerError>) -> Disposition {
        let method = self.req.method();
        let url = self.req.url();
        let original_url = self.req.original_url();

        let exchange = Exchange {
            method: &method,
            url: &url,
            original_url: original_url.as_deref(),
            current_status: self.res.status(),
            headers_sent: self.res.headers_sent(),
        };

        let outcome = match resolve(err.as_ref(), &exchange, self.options.stacktrace) {
            Resolution::Skip => {
                debug!("cannot 404 after headers sent");
                return Disposition::Ignored;
            }
            Resolution::Respond(outcome) => outcome,
        };

        debug!(status = outcome.status.as_u16(), "default {}", outcome.status.as_u16());

        if let (Some(err), Some(onerror)) = (err, self.options.onerror) {
            let (req, res) = (self.req.clone(), self.res.clone());
            defer(move || onerror(err, req, res));
        }

        if self.res.headers_sent() {
            debug!("cannot send error after headers sent, destroying socket");
            self.req.destroy_socket();
            return Disposition::SocketDestroyed;
        }

        let kind = negotiate(&self.req);
        let reply = Reply {
            status: outcome.status,
            extra_headers: outcome.headers,
            body: render(kind, outcome.status, &outcome.message),
        };

        if finalize(&self.req, &self.res, reply) {
            Disposition::Written
        } else {
            Disposition::Deferred
        }
    }
}

/// Run `task` after the current call stack unwinds.
///
/// Inside a tokio runtime the task is spawned; otherwise it runs on a
/// detached thread.
pub(crate) fn defer<F>(task: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move { task() });
        }
        Err(_) => {
            std::thread::spawn(task);
        }
    }
}
