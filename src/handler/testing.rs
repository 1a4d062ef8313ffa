//! In-memory [`RequestStream`] / [`ResponseSink`] doubles for unit tests.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::handler::finalize::{RequestStream, ResponseSink};
use crate::handler::negotiate::{MediaKind, Negotiate};

type Callback = Box<dyn FnOnce() + Send>;

struct RequestState {
    method: Method,
    url: String,
    original_url: Option<String>,
    finished: bool,
    drains_on_resume: bool,
    unpiped: usize,
    resumed: usize,
    destroyed: usize,
    callbacks: Vec<Callback>,
    /// Port calls in the order they arrived.
    calls: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequestSnapshot {
    pub finished: bool,
    pub unpiped: usize,
    pub resumed: usize,
    pub destroyed: usize,
    pub pending_callbacks: usize,
    pub calls: Vec<&'static str>,
}

#[derive(Clone)]
pub struct MockRequest(Arc<Mutex<RequestState>>);

impl MockRequest {
    fn build(method: Method, url: &str, finished: bool) -> Self {
        Self(Arc::new(Mutex::new(RequestState {
            method,
            url: url.to_string(),
            original_url: None,
            finished,
            drains_on_resume: false,
            unpiped: 0,
            resumed: 0,
            destroyed: 0,
            callbacks: Vec::new(),
            calls: Vec::new(),
        })))
    }

    /// A request whose body has already been read.
    pub fn finished(method: Method, url: &str) -> Self {
        Self::build(method, url, true)
    }

    /// A request with unread body bytes; call [`MockRequest::finish`].
    pub fn streaming(method: Method, url: &str) -> Self {
        Self::build(method, url, false)
    }

    /// Finish as soon as someone resumes reading.
    pub fn drains_on_resume(self) -> Self {
        self.0.lock().unwrap().drains_on_resume = true;
        self
    }

    pub fn with_original_url(self, url: &str) -> Self {
        self.0.lock().unwrap().original_url = Some(url.to_string());
        self
    }

    /// Mark the request finished and run registered callbacks.
    pub fn finish(&self) {
        let callbacks = {
            let mut state = self.0.lock().unwrap();
            state.finished = true;
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        let state = self.0.lock().unwrap();
        RequestSnapshot {
            finished: state.finished,
            unpiped: state.unpiped,
            resumed: state.resumed,
            destroyed: state.destroyed,
            pending_callbacks: state.callbacks.len(),
            calls: state.calls.clone(),
        }
    }
}

impl RequestStream for MockRequest {
    fn method(&self) -> Method {
        self.0.lock().unwrap().method.clone()
    }

    fn url(&self) -> String {
        self.0.lock().unwrap().url.clone()
    }

    fn original_url(&self) -> Option<String> {
        self.0.lock().unwrap().original_url.clone()
    }

    fn is_finished(&self) -> bool {
        self.0.lock().unwrap().finished
    }

    fn unpipe(&self) {
        let mut state = self.0.lock().unwrap();
        state.unpiped += 1;
        state.calls.push("unpipe");
    }

    fn on_finished(&self, callback: Callback) {
        let mut state = self.0.lock().unwrap();
        state.calls.push("on_finished");
        if state.finished {
            drop(state);
            callback();
        } else {
            state.callbacks.push(callback);
        }
    }

    fn resume(&self) {
        let drain = {
            let mut state = self.0.lock().unwrap();
            state.resumed += 1;
            state.calls.push("resume");
            state.drains_on_resume
        };
        if drain {
            self.finish();
        }
    }

    fn destroy_socket(&self) {
        let mut state = self.0.lock().unwrap();
        state.destroyed += 1;
        state.calls.push("destroy_socket");
    }
}

impl Negotiate for MockRequest {
    fn preferred(&self, candidates: &[MediaKind]) -> Option<MediaKind> {
        // `/html/...` paths ask for HTML, everything else is undecided.
        self.url()
            .starts_with("/html")
            .then_some(MediaKind::Html)
            .filter(|k| candidates.contains(k))
    }
}

#[derive(Clone, Debug)]
pub struct SentResponse {
    pub status: u16,
    pub headers_sent: bool,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub ends: usize,
}

impl SentResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct MockResponse(Arc<Mutex<SentResponse>>);

impl MockResponse {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(SentResponse {
            status: 200,
            headers_sent: false,
            headers: HeaderMap::new(),
            body: None,
            ends: 0,
        })))
    }

    pub fn with_status(self, status: u16) -> Self {
        self.0.lock().unwrap().status = status;
        self
    }

    /// Simulate a response some earlier handler already started sending.
    pub fn with_headers_sent(self) -> Self {
        self.0.lock().unwrap().headers_sent = true;
        self
    }

    pub fn snapshot(&self) -> SentResponse {
        self.0.lock().unwrap().clone()
    }
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for MockResponse {
    fn status(&self) -> u16 {
        self.0.lock().unwrap().status
    }

    fn headers_sent(&self) -> bool {
        self.0.lock().unwrap().headers_sent
    }

    fn set_status(&self, status: StatusCode) {
        self.0.lock().unwrap().status = status.as_u16();
    }

    fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.0.lock().unwrap().headers.insert(name, value);
    }

    fn append_header(&self, name: HeaderName, value: HeaderValue) {
        self.0.lock().unwrap().headers.append(name, value);
    }

    fn remove_header(&self, name: &HeaderName) {
        self.0.lock().unwrap().headers.remove(name);
    }

    fn end(&self, body: Option<Bytes>) {
        let mut state = self.0.lock().unwrap();
        state.headers_sent = true;
        state.body = body;
        state.ends += 1;
    }
}
