//! File-identifier extraction from upload notification text.
//!
//! Slackbot's notification links to the file, e.g.
//! `<https://x.slack.com/files/U123/F0ABCD123/name.txt|name.txt>`. The id is
//! the first path segment that starts with `F` and consists of word
//! characters.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::FileId;

static FILE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(F\w*)/").expect("file segment pattern is valid"));

/// Errors from [`extract_file_id`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The text contains no `/F.../` segment.
    #[error("no file identifier found in event text")]
    NotFound,
}

/// Extracts the uploaded file's id from notification text.
///
/// # Examples
///
/// ```
/// use dm_relay::webhooks::extract_file_id;
///
/// let text = "<@USLACKBOT> uploaded a file: <https://x/files/F0ABCD123/name.txt|name.txt>";
/// assert_eq!(extract_file_id(text).unwrap().as_str(), "F0ABCD123");
///
/// assert!(extract_file_id("no link here").is_err());
/// ```
pub fn extract_file_id(text: &str) -> Result<FileId, ExtractError> {
    FILE_SEGMENT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| FileId::parse(m.as_str()))
        .ok_or(ExtractError::NotFound)
}
