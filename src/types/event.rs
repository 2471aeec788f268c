//! Inbound event and outbound message shapes.
//!
//! These mirror the subset of the Slack Events API `event_callback` envelope
//! and the Web API payloads that the bridge reads or writes.

use serde::{Deserialize, Serialize};

use super::ids::{ChannelId, EventId};

/// One Slack Events API delivery.
///
/// Missing string fields deserialize as empty so that an incomplete envelope
/// reaches the credential check (and is rejected there) instead of failing
/// as a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Verification token configured for the app.
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub team_id: String,

    #[serde(default, rename = "api_app_id")]
    pub app_id: String,

    #[serde(default)]
    pub event_id: EventId,

    /// The inner `message.im` event.
    #[serde(default)]
    pub event: MessageEvent,
}

/// The inner event of an [`InboundEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub channel: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub text: String,

    #[serde(default, rename = "ts")]
    pub timestamp: String,
}

/// The parts of a Slack file object the bridge relays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub subject: String,
    pub content: String,
}

/// A message ready to be posted to the target channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: ChannelId,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_event_callback() {
        let body = json!({
            "token": "tok",
            "team_id": "T1",
            "api_app_id": "A1",
            "event_id": "Ev1",
            "type": "event_callback",
            "event": {
                "type": "message",
                "channel": "D1",
                "user": "USLACKBOT",
                "text": "hello",
                "ts": "1355517523.000005"
            }
        });

        let event: InboundEvent = serde_json::from_value(body).unwrap();
        assert_eq!(event.token, "tok");
        assert_eq!(event.app_id, "A1");
        assert_eq!(event.event_id.as_str(), "Ev1");
        assert_eq!(event.event.kind, "message");
        assert_eq!(event.event.channel, "D1");
        assert_eq!(event.event.timestamp, "1355517523.000005");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let event: InboundEvent = serde_json::from_value(json!({"token": "tok"})).unwrap();
        assert_eq!(event.token, "tok");
        assert!(event.team_id.is_empty());
        assert!(event.event.text.is_empty());
    }
}
