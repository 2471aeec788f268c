//! Effect interpreter trait.
//!
//! The trait-based design lets the pipeline run against the real Slack API
//! or against a mock that records effects and returns canned responses.

use std::future::Future;

use super::{SlackEffect, SlackResponse};

/// Interprets Slack effects against the Slack Web API.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockSlack {
///     file: FileRecord,
///     calls: Mutex<Vec<SlackEffect>>,
/// }
///
/// impl SlackInterpreter for MockSlack {
///     type Error = SlackApiError;
///
///     async fn interpret(&self, effect: SlackEffect) -> Result<SlackResponse, Self::Error> {
///         self.calls.lock().unwrap().push(effect.clone());
///         match effect {
///             SlackEffect::FetchFile { .. } => Ok(SlackResponse::File(self.file.clone())),
///             SlackEffect::PostMessage { .. } => Ok(SlackResponse::Posted { ts: None }),
///         }
///     }
/// }
/// ```
pub trait SlackInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a Slack effect and return its response.
    fn interpret(
        &self,
        effect: SlackEffect,
    ) -> impl Future<Output = Result<SlackResponse, Self::Error>> + Send;
}
