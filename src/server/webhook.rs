//! Events API endpoint handler.
//!
//! Verifies the request signature (when a signing secret is configured),
//! answers the `url_verification` handshake, and runs `event_callback`
//! deliveries through the relay pipeline before responding. The response
//! status always reflects the pipeline outcome.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::effects::SlackInterpreter;
use crate::relay::RelayError;
use crate::slack::SlackApiError;
use crate::webhooks::validate::secure_eq;
use crate::webhooks::{ParseError, WebhookPayload, parse_webhook, verify_signature};

const HEADER_SIGNATURE: &str = "x-slack-signature";
const HEADER_TIMESTAMP: &str = "x-slack-request-timestamp";
const HEADER_RETRY_NUM: &str = "x-slack-retry-num";
const HEADER_RETRY_REASON: &str = "x-slack-retry-reason";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing signature header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Stale timestamp or mismatched signature.
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),

    /// `url_verification` with the wrong token.
    #[error("url verification token mismatch")]
    VerificationFailed,

    #[error("unsupported envelope type: {0}")]
    UnsupportedEnvelope(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl WebhookError {
    /// The response status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MissingHeader(_)
            | WebhookError::InvalidSignature
            | WebhookError::InvalidPayload(_)
            | WebhookError::VerificationFailed
            | WebhookError::UnsupportedEnvelope(_) => StatusCode::NOT_FOUND,
            WebhookError::Relay(e) => match e {
                RelayError::Rejected(_) | RelayError::Malformed(_) => StatusCode::NOT_FOUND,
                RelayError::InFlight { .. } => StatusCode::SERVICE_UNAVAILABLE,
                RelayError::Fetch { .. }
                | RelayError::Publish { .. }
                | RelayError::UnexpectedResponse(_) => StatusCode::BAD_GATEWAY,
                RelayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "success": false }))).into_response()
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 200 `{"success": true}`: relayed, or a duplicate of a relayed file
/// - 200 `{"challenge": ...}`: `url_verification` handshake
/// - 404 `{"success": false}`: bad signature, credentials or payload
/// - 503 `{"success": false}`: another request is relaying the same file;
///   Slack retries and the retry sees the final state
/// - 502 `{"success": false}`: a Slack call failed
/// - 500 `{"success": false}`: marker store failure
pub async fn webhook_handler<I>(
    State(app_state): State<AppState<I>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError>
where
    I: SlackInterpreter<Error = SlackApiError> + Send + Sync + 'static,
{
    if let Some(retry_num) = header(&headers, HEADER_RETRY_NUM) {
        info!(
            retry_num = %retry_num,
            retry_reason = header(&headers, HEADER_RETRY_REASON).unwrap_or("unknown"),
            "Slack redelivery"
        );
    }

    if let Some(secret) = app_state.signing_secret() {
        check_signature(&headers, &body, secret).inspect_err(|e| {
            warn!(error = %e, "Rejected unsigned or mis-signed request");
        })?;
    }

    let payload = parse_webhook(&body).inspect_err(|e| {
        warn!(error = %e, "Failed to parse webhook body");
    })?;

    match payload {
        WebhookPayload::UrlVerification { token, challenge } => {
            if !secure_eq(&token, &app_state.relay().credentials().payload_token) {
                warn!("url_verification with wrong token");
                return Err(WebhookError::VerificationFailed);
            }
            info!("Answered url_verification handshake");
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        WebhookPayload::Other { kind } => {
            debug!(kind = %kind, "Ignoring unsupported envelope");
            Err(WebhookError::UnsupportedEnvelope(kind))
        }
        WebhookPayload::Event(event) => {
            debug!(event_id = %event.event_id, "Received event");
            match app_state.relay().process_event(&event).await {
                Ok(outcome) => {
                    debug!(event_id = %event.event_id, file_id = %outcome.file(), "Event handled");
                    Ok(Json(json!({ "success": true })).into_response())
                }
                Err(e) => {
                    warn!(event_id = %event.event_id, error = %e, "Event not relayed");
                    Err(e.into())
                }
            }
        }
    }
}

fn check_signature(headers: &HeaderMap, body: &[u8], secret: &[u8]) -> Result<(), WebhookError> {
    let timestamp =
        header(headers, HEADER_TIMESTAMP).ok_or(WebhookError::MissingHeader(HEADER_TIMESTAMP))?;
    let signature =
        header(headers, HEADER_SIGNATURE).ok_or(WebhookError::MissingHeader(HEADER_SIGNATURE))?;

    if verify_signature(body, timestamp, signature, secret, Utc::now().timestamp()) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerError;
    use crate::types::FileId;
    use crate::webhooks::{ExtractError, Rejection};
    use std::io;

    #[test]
    fn header_present() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_RETRY_NUM, "1".parse().unwrap());
        assert_eq!(header(&headers, HEADER_RETRY_NUM), Some("1"));
        assert_eq!(header(&headers, HEADER_RETRY_REASON), None);
    }

    #[test]
    fn missing_signature_headers_are_reported() {
        let headers = HeaderMap::new();
        let err = check_signature(&headers, b"{}", b"secret").unwrap_err();
        assert!(matches!(err, WebhookError::MissingHeader(HEADER_TIMESTAMP)));
    }

    #[test]
    fn statuses_follow_failure_class() {
        let file = FileId::parse("F1").unwrap();
        let cases = [
            (WebhookError::InvalidSignature, StatusCode::NOT_FOUND),
            (
                WebhookError::Relay(RelayError::Rejected(Rejection::Token)),
                StatusCode::NOT_FOUND,
            ),
            (
                WebhookError::Relay(RelayError::Malformed(ExtractError::NotFound)),
                StatusCode::NOT_FOUND,
            ),
            (
                WebhookError::Relay(RelayError::InFlight { file: file.clone() }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                WebhookError::Relay(RelayError::Fetch {
                    file: file.clone(),
                    source: SlackApiError::api("files.info", "file_not_found"),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                WebhookError::Relay(RelayError::Publish {
                    file,
                    source: SlackApiError::status("chat.postMessage", 503, "unavailable"),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                WebhookError::Relay(RelayError::Store(MarkerError::Io(io::Error::other("disk")))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }
}
