//! Slack Web API client.
//!
//! Only the two methods the relay needs are covered: `files.info` and
//! `chat.postMessage`. Neither is retried.

pub mod client;
pub mod error;
pub mod response;

pub use client::SlackClient;
pub use error::{SlackApiError, SlackErrorKind};
pub use response::{parse_file_info, parse_post_message};
