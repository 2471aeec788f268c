//! Effects-as-data for Slack Web API calls.
//!
//! The relay pipeline describes each outbound call as a [`SlackEffect`] and
//! hands it to a [`SlackInterpreter`]. The production interpreter is
//! [`crate::slack::SlackClient`]; tests use a recording mock.

use serde::{Deserialize, Serialize};

pub mod interpreter;

pub use interpreter::SlackInterpreter;

use crate::types::{ChannelId, FileId, FileRecord};

/// A Slack Web API operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEffect {
    /// `files.info`: fetch a file's subject and text content.
    FetchFile { file: FileId },

    /// `chat.postMessage`: post text to a channel as the bot.
    PostMessage { channel: ChannelId, text: String },
}

impl SlackEffect {
    /// Returns the Web API method this effect calls.
    pub fn method(&self) -> &'static str {
        match self {
            SlackEffect::FetchFile { .. } => "files.info",
            SlackEffect::PostMessage { .. } => "chat.postMessage",
        }
    }
}

/// The result of interpreting a [`SlackEffect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackResponse {
    /// Response to [`SlackEffect::FetchFile`].
    File(FileRecord),

    /// Response to [`SlackEffect::PostMessage`].
    Posted {
        /// Timestamp Slack assigned to the posted message, if reported.
        ts: Option<String>,
    },
}
