//! Slack Web API error types.
//!
//! Errors are categorised so the pipeline can log what went wrong and pick
//! the response status:
//!
//! - **Transport**: the request never produced a response (DNS, connect, TLS)
//! - **Timeout**: the request exceeded the configured bound
//! - **Status**: Slack answered with a non-2xx HTTP status (e.g. 429, 5xx)
//! - **Api**: Slack answered `{"ok": false, "error": ...}`
//! - **Parse**: the response body was not the expected JSON shape
//!
//! None of these are retried by the relay.

use std::fmt;

use thiserror::Error;

/// The kind of Slack API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackErrorKind {
    Transport,
    Timeout,
    Status,
    Api,
    Parse,
}

impl fmt::Display for SlackErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SlackErrorKind::Transport => "transport",
            SlackErrorKind::Timeout => "timeout",
            SlackErrorKind::Status => "status",
            SlackErrorKind::Api => "api",
            SlackErrorKind::Parse => "parse",
        };
        f.write_str(kind)
    }
}

/// A Slack API error with categorisation.
#[derive(Debug, Error)]
pub struct SlackApiError {
    pub kind: SlackErrorKind,

    /// The Web API method that failed (e.g. `files.info`).
    pub method: &'static str,

    /// The HTTP status code, if a response was received.
    pub status_code: Option<u16>,

    /// A human-readable description (Slack's `error` code for `Api` errors).
    pub message: String,

    /// The underlying transport error, if any.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for SlackApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(
                f,
                "Slack {} {} error (HTTP {}): {}",
                self.method, self.kind, code, self.message
            ),
            None => write!(f, "Slack {} {} error: {}", self.method, self.kind, self.message),
        }
    }
}

impl SlackApiError {
    /// Categorises a reqwest error raised while sending or reading.
    pub fn from_reqwest(method: &'static str, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            SlackErrorKind::Timeout
        } else if err.is_decode() || err.is_body() {
            SlackErrorKind::Parse
        } else {
            SlackErrorKind::Transport
        };

        Self {
            kind,
            method,
            status_code: err.status().map(|s| s.as_u16()),
            message: without_url(&err),
            source: Some(err),
        }
    }

    /// Creates an error for a non-2xx response.
    pub fn status(method: &'static str, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: SlackErrorKind::Status,
            method,
            status_code: Some(status_code),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for an `{"ok": false}` response.
    pub fn api(method: &'static str, error_code: impl Into<String>) -> Self {
        Self {
            kind: SlackErrorKind::Api,
            method,
            status_code: None,
            message: error_code.into(),
            source: None,
        }
    }

    /// Creates an error for an unexpected response shape.
    pub fn parse(method: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: SlackErrorKind::Parse,
            method,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }
}

/// Renders a reqwest error with its URL elided.
fn without_url(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    if let Some(url) = err.url() {
        message = message.replace(url.as_str(), "<url>");
    }
    message
}
