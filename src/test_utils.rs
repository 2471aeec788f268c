//! Shared test fixtures: credentials, upload events and a recording Slack mock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use proptest::prelude::*;

use crate::config::Credentials;
use crate::effects::{SlackEffect, SlackInterpreter, SlackResponse};
use crate::slack::SlackApiError;
use crate::types::{EventId, FileId, FileRecord, InboundEvent, MessageEvent};
use crate::webhooks::UPLOAD_MARKER;

pub const PAYLOAD_TOKEN: &str = "payload-token";
pub const TEAM_ID: &str = "T0001";
pub const APP_ID: &str = "A0001";
pub const DM_CHANNEL: &str = "D0001";
pub const TARGET_CHANNEL: &str = "C0001";

pub fn credentials() -> Credentials {
    Credentials {
        payload_token: PAYLOAD_TOKEN.to_string(),
        team_id: TEAM_ID.to_string(),
        app_id: APP_ID.to_string(),
        expected_channel: DM_CHANNEL.to_string(),
    }
}

/// Slackbot's notification text for an uploaded file.
pub fn upload_text(file_id: &str) -> String {
    format!("{UPLOAD_MARKER} <https://example.slack.com/files/U0001/{file_id}/name.txt|name.txt>")
}

/// An event that passes every credential check.
pub fn upload_event(file_id: &str) -> InboundEvent {
    InboundEvent {
        token: PAYLOAD_TOKEN.to_string(),
        team_id: TEAM_ID.to_string(),
        app_id: APP_ID.to_string(),
        event_id: EventId::new(format!("Ev{file_id}")),
        event: MessageEvent {
            kind: "message".to_string(),
            channel: DM_CHANNEL.to_string(),
            user: "USLACKBOT".to_string(),
            text: upload_text(file_id),
            timestamp: "1700000000.000100".to_string(),
        },
    }
}

pub fn invoice() -> FileRecord {
    FileRecord {
        subject: "Invoice".to_string(),
        content: "Pay $10".to_string(),
    }
}

pub fn arb_file_id() -> impl Strategy<Value = FileId> {
    "F[A-Z0-9]{1,12}".prop_map(|s| FileId::parse(s).unwrap())
}

/// A [`SlackInterpreter`] that records every effect.
///
/// Fetches return scripted results in order, then [`invoice`] once the
/// script is exhausted. Publishes succeed unless a publish error is queued.
/// Every call yields to the scheduler before answering, so concurrent
/// requests interleave.
#[derive(Default)]
pub struct RecordingSlack {
    calls: Mutex<Vec<SlackEffect>>,
    fetch_delay: Option<Duration>,
    fetch_results: Mutex<VecDeque<Result<FileRecord, SlackApiError>>>,
    publish_errors: Mutex<VecDeque<SlackApiError>>,
}

impl RecordingSlack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch(self, result: Result<FileRecord, SlackApiError>) -> Self {
        self.fetch_results.lock().unwrap().push_back(result);
        self
    }

    /// Delays every fetch before it answers.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn with_publish_error(self, error: SlackApiError) -> Self {
        self.publish_errors.lock().unwrap().push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<SlackEffect> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|e| matches!(e, SlackEffect::FetchFile { .. }))
            .count()
    }

    /// The `(channel, text)` of every publish, in order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|e| match e {
                SlackEffect::PostMessage { channel, text } => Some((channel.0, text)),
                SlackEffect::FetchFile { .. } => None,
            })
            .collect()
    }
}

impl SlackInterpreter for RecordingSlack {
    type Error = SlackApiError;

    async fn interpret(&self, effect: SlackEffect) -> Result<SlackResponse, Self::Error> {
        self.calls.lock().unwrap().push(effect.clone());
        tokio::task::yield_now().await;
        match effect {
            SlackEffect::FetchFile { .. } => {
                if let Some(delay) = self.fetch_delay {
                    tokio::time::sleep(delay).await;
                }
                let scripted = self.fetch_results.lock().unwrap().pop_front();
                scripted.unwrap_or_else(|| Ok(invoice())).map(SlackResponse::File)
            }
            SlackEffect::PostMessage { .. } => match self.publish_errors.lock().unwrap().pop_front()
            {
                Some(error) => Err(error),
                None => Ok(SlackResponse::Posted {
                    ts: Some("1700000001.000200".to_string()),
                }),
            },
        }
    }
}
