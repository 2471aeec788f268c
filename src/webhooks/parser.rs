//! Slack Events API envelope parser.
//!
//! Two envelope types reach the endpoint:
//!
//! - `url_verification`: the one-off handshake Slack performs when the
//!   request URL is configured. It must be answered with the `challenge`.
//! - `event_callback` (or an envelope without a `type`): a normal event,
//!   parsed into an [`InboundEvent`].
//!
//! Any other envelope type is reported as [`WebhookPayload::Other`] and
//! rejected by the caller. Malformed JSON returns `Err`, never panics.

use serde::Deserialize;
use thiserror::Error;

use crate::types::InboundEvent;

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not valid JSON or does not fit the envelope shape.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A parsed Events API envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookPayload {
    UrlVerification { token: String, challenge: String },
    Event(InboundEvent),
    /// An envelope type the bridge does not handle (e.g. `app_rate_limited`).
    Other { kind: String },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct UrlVerification {
    #[serde(default)]
    token: String,
    challenge: String,
}

/// Parses a raw webhook body.
///
/// # Examples
///
/// ```
/// use dm_relay::webhooks::{parse_webhook, WebhookPayload};
///
/// let body = br#"{"type":"url_verification","token":"t","challenge":"abc"}"#;
/// assert_eq!(
///     parse_webhook(body).unwrap(),
///     WebhookPayload::UrlVerification { token: "t".into(), challenge: "abc".into() }
/// );
/// ```
pub fn parse_webhook(body: &[u8]) -> Result<WebhookPayload, ParseError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let envelope = Envelope::deserialize(&value)?;

    match envelope.kind.as_deref() {
        Some("url_verification") => {
            let handshake: UrlVerification = serde_json::from_value(value)?;
            Ok(WebhookPayload::UrlVerification {
                token: handshake.token,
                challenge: handshake.challenge,
            })
        }
        None | Some("event_callback") => Ok(WebhookPayload::Event(serde_json::from_value(value)?)),
        Some(other) => Ok(WebhookPayload::Other {
            kind: other.to_string(),
        }),
    }
}
