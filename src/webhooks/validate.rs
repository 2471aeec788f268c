//! Credential validation for inbound events.
//!
//! An event is authentic only if its token, team, app and DM channel all
//! match the configured [`Credentials`] and its text is Slackbot's "uploaded
//! a file" notification. There is no partial acceptance.

use std::fmt;

use subtle::ConstantTimeEq;

use crate::config::Credentials;
use crate::types::InboundEvent;

/// Text Slackbot posts into the DM when a file arrives.
pub const UPLOAD_MARKER: &str = "<@USLACKBOT> uploaded a file:";

/// The first check an inbound event failed.
///
/// Carries only the field name, never the received or expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Token,
    TeamId,
    AppId,
    Channel,
    /// The text is not a file-upload notification.
    NotAnUpload,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::Token => "payload token mismatch",
            Rejection::TeamId => "team id mismatch",
            Rejection::AppId => "app id mismatch",
            Rejection::Channel => "channel is not the bot DM",
            Rejection::NotAnUpload => "event is not a file upload notification",
        };
        f.write_str(reason)
    }
}

/// Checks an event against the configured credentials.
///
/// All four credential comparisons run regardless of earlier failures so the
/// time taken does not reveal which field mismatched; only the first failure
/// is reported.
pub fn check_event(event: &InboundEvent, credentials: &Credentials) -> Result<(), Rejection> {
    let checks = [
        (
            secure_eq(&event.token, &credentials.payload_token),
            Rejection::Token,
        ),
        (secure_eq(&event.team_id, &credentials.team_id), Rejection::TeamId),
        (secure_eq(&event.app_id, &credentials.app_id), Rejection::AppId),
        (
            secure_eq(&event.event.channel, &credentials.expected_channel),
            Rejection::Channel,
        ),
    ];

    if let Some((_, rejection)) = checks.iter().find(|(ok, _)| !ok) {
        return Err(*rejection);
    }

    if !event.event.text.contains(UPLOAD_MARKER) {
        return Err(Rejection::NotAnUpload);
    }

    Ok(())
}

/// Returns `true` if the event is an authentic file-upload notification.
pub fn is_authentic(event: &InboundEvent, credentials: &Credentials) -> bool {
    check_event(event, credentials).is_ok()
}

/// Constant-time string equality.
pub(crate) fn secure_eq(received: &str, expected: &str) -> bool {
    received.as_bytes().ct_eq(expected.as_bytes()).into()
}
