//! Parsing of Slack Web API response bodies.
//!
//! Every Web API response is a JSON object with a boolean `ok`. On failure
//! Slack sets `ok: false` and an `error` code while still answering HTTP 200.

use serde::Deserialize;

use crate::types::FileRecord;

use super::error::SlackApiError;

pub(crate) const FILES_INFO: &str = "files.info";
pub(crate) const CHAT_POST_MESSAGE: &str = "chat.postMessage";

#[derive(Deserialize)]
struct Status {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct FilesInfo {
    file: Option<FileObject>,
}

#[derive(Deserialize)]
struct FileObject {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    plain_text: Option<String>,
    #[serde(default)]
    preview: Option<String>,
}

#[derive(Deserialize)]
struct PostMessage {
    #[serde(default)]
    ts: Option<String>,
}

/// Checks the `ok` flag, mapping `ok: false` to an `Api` error.
fn check_ok(method: &'static str, value: &serde_json::Value) -> Result<(), SlackApiError> {
    let status = Status::deserialize(value)
        .map_err(|e| SlackApiError::parse(method, format!("invalid response envelope: {e}")))?;

    match status.ok {
        Some(false) => Err(SlackApiError::api(
            method,
            status.error.unwrap_or_else(|| "unknown_error".to_string()),
        )),
        _ => Ok(()),
    }
}

fn parse_json(method: &'static str, body: &[u8]) -> Result<serde_json::Value, SlackApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| SlackApiError::parse(method, format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(SlackApiError::parse(method, "response is not a JSON object"));
    }
    Ok(value)
}

/// Parses a `files.info` response into a [`FileRecord`].
///
/// The subject comes from `file.subject` (set for emails), falling back to
/// `file.title`. The content comes from `file.plain_text`, falling back to
/// `file.preview`. A response with neither content field is a parse error.
pub fn parse_file_info(body: &[u8]) -> Result<FileRecord, SlackApiError> {
    let value = parse_json(FILES_INFO, body)?;
    check_ok(FILES_INFO, &value)?;

    let info = FilesInfo::deserialize(&value)
        .map_err(|e| SlackApiError::parse(FILES_INFO, format!("invalid file object: {e}")))?;
    let file = info
        .file
        .ok_or_else(|| SlackApiError::parse(FILES_INFO, "response has no file object"))?;

    let content = file
        .plain_text
        .or(file.preview)
        .ok_or_else(|| SlackApiError::parse(FILES_INFO, "file has no text content"))?;

    Ok(FileRecord {
        subject: file.subject.or(file.title).unwrap_or_default(),
        content,
    })
}

/// Parses a `chat.postMessage` response, returning the message timestamp.
pub fn parse_post_message(body: &[u8]) -> Result<Option<String>, SlackApiError> {
    let value = parse_json(CHAT_POST_MESSAGE, body)?;
    check_ok(CHAT_POST_MESSAGE, &value)?;

    let posted = PostMessage::deserialize(&value).map_err(|e| {
        SlackApiError::parse(CHAT_POST_MESSAGE, format!("invalid response: {e}"))
    })?;
    Ok(posted.ts)
}
