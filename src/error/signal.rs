use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

/// An error passed to the final handler by an upstream handler.
///
/// Its presence alone selects the failure path. The optional fields refine
/// the response:
///
/// - `status_code` / `status`: preferred HTTP status. `status_code` is
///   consulted first, then `status`. A value of `0` counts as unset.
/// - `detail`: diagnostic text (a backtrace or long description), shown
///   only when diagnostics are enabled.
/// - `headers`: extra response headers, applied only when the status was
///   taken from this error.
///
/// # Example
/// ```
/// use final_handler::error::signal::HandlerError;
///
/// let err = HandlerError::new("token expired").with_status(401);
/// assert_eq!(err.to_string(), "token expired");
/// assert_eq!(err.preferred_status(), Some(401));
/// ```
#[derive(Clone, Debug, Default, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// String form of the error.
    pub message: String,
    /// Preferred status, consulted before [`HandlerError::status`].
    pub status_code: Option<u16>,
    /// Alternate preferred status.
    pub status: Option<u16>,
    /// Diagnostic text such as a backtrace.
    pub detail: Option<String>,
    /// Extra headers to send along with the error response.
    pub headers: HeaderMap,
}

impl HandlerError {
    /// Create an error carrying only its string form.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Build an error from any [`std::error::Error`], recording the cause
    /// chain as detail text.
    ///
    /// # Example
    /// ```
    /// use final_handler::error::signal::HandlerError;
    ///
    /// let io = std::io::Error::other("disk full");
    /// let err = HandlerError::from_error(&io);
    /// assert_eq!(err.message, "disk full");
    /// assert_eq!(err.detail.as_deref(), Some("disk full"));
    /// ```
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut detail = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            detail.push_str("\n    caused by: ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            detail: Some(detail),
            ..Self::default()
        }
    }

    /// Set the first-class `status_code` field.
    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Set the alternate `status` field.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a header to send with the error response.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// The preferred status: `status_code` if set and non-zero, else
    /// `status` if set and non-zero.
    pub fn preferred_status(&self) -> Option<u16> {
        self.status_code
            .filter(|s| *s != 0)
            .or(self.status.filter(|s| *s != 0))
    }

    /// Text shown when diagnostics are enabled: the detail, falling back
    /// to the string form. `None` when both are empty.
    pub fn diagnostic_text(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(Some(self.message.as_str()).filter(|m| !m.is_empty()))
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            detail: Some(format!("{err:?}")),
            ..Self::default()
        }
    }
}
