//! Newtype wrappers for Slack identifiers.
//!
//! These keep file ids, channel ids and event ids from being mixed up, and
//! give the dedup key ([`FileId`]) a single, validated constructor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Slack file identifier (e.g. `F0ABCD123`).
///
/// This is the dedup key for deliveries. A `FileId` is always `F` followed by
/// ASCII word characters, which makes it safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Parses a file id, returning `None` unless it is `F` followed by word
    /// characters (`[A-Za-z0-9_]`).
    pub fn parse(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        let mut chars = s.chars();
        if chars.next() != Some('F') {
            return None;
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(FileId(s))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for FileId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        FileId::parse(s.clone()).ok_or(s)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

/// A Slack channel identifier (`C…`, `D…` or `G…`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(s: impl Into<String>) -> Self {
        ChannelId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_string())
    }
}

/// A Slack Events API event id (`Ev…`).
///
/// Slack reuses the event id when it retries a delivery, but the bridge
/// dedupes on [`FileId`] because the platform also emits distinct events for
/// the same upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(s: impl Into<String>) -> Self {
        EventId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
