//! reqwest-based Slack Web API client.
//!
//! `SlackClient` holds one connection-pooled `reqwest::Client` with bounded
//! request and connect timeouts, plus the two tokens the relay needs:
//! the workspace token for `files.info` and the bot token for
//! `chat.postMessage`.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::SlackSettings;
use crate::effects::{SlackEffect, SlackInterpreter, SlackResponse};
use crate::types::{FileId, FileRecord, OutboundMessage};

use super::error::SlackApiError;
use super::response::{CHAT_POST_MESSAGE, FILES_INFO, parse_file_info, parse_post_message};

/// Upper bound on connection establishment, within the overall timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest non-2xx body fragment kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 200;

/// Slack `parse` mode that links channel names and usernames.
const PARSE_FULL: &str = "full";

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    username: &'a str,
    as_user: bool,
    parse: &'static str,
}

/// A Slack Web API client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    workspace_token: String,
    bot_token: String,
    display_name: String,
}

impl SlackClient {
    /// Creates a client from the configured settings.
    pub fn new(settings: &SlackSettings) -> Result<Self, SlackApiError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(settings.timeout))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SlackApiError::from_reqwest("client", e))?;

        Ok(Self {
            http,
            api_base: settings.api_base.clone(),
            workspace_token: settings.workspace_token.clone(),
            bot_token: settings.bot_token.clone(),
            display_name: settings.display_name.clone(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Calls `files.info` with the workspace token.
    pub async fn fetch_file(&self, file: &FileId) -> Result<FileRecord, SlackApiError> {
        debug!(file_id = %file, "Fetching file info");

        let request = self.http.post(self.url(FILES_INFO)).form(&[
            ("file", file.as_str()),
            ("token", self.workspace_token.as_str()),
        ]);

        let body = send(FILES_INFO, request).await?;
        parse_file_info(&body)
    }

    /// Calls `chat.postMessage` with the bot token.
    ///
    /// Returns the timestamp Slack assigned to the message, if reported.
    pub async fn post_message(
        &self,
        message: &OutboundMessage,
    ) -> Result<Option<String>, SlackApiError> {
        debug!(channel = %message.channel, "Posting message");

        let request = self
            .http
            .post(self.url(CHAT_POST_MESSAGE))
            .bearer_auth(&self.bot_token)
            .json(&PostMessageRequest {
                channel: message.channel.as_str(),
                text: &message.text,
                username: &self.display_name,
                as_user: true,
                parse: PARSE_FULL,
            });

        let body = send(CHAT_POST_MESSAGE, request).await?;
        parse_post_message(&body)
    }
}

/// Sends a request and returns the body of a 2xx response.
async fn send(
    method: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Vec<u8>, SlackApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| SlackApiError::from_reqwest(method, e))?;

    let status = response.status();

    let body = response
        .bytes()
        .await
        .map_err(|e| SlackApiError::from_reqwest(method, e))?;

    if !status.is_success() {
        let snippet: String = String::from_utf8_lossy(&body)
            .chars()
            .take(MAX_ERROR_BODY_LEN)
            .collect();
        let message = if snippet.is_empty() {
            status.canonical_reason().unwrap_or("unexpected status").to_string()
        } else {
            snippet
        };
        return Err(SlackApiError::status(method, status.as_u16(), message));
    }

    Ok(body.to_vec())
}

impl SlackInterpreter for SlackClient {
    type Error = SlackApiError;

    async fn interpret(&self, effect: SlackEffect) -> Result<SlackResponse, Self::Error> {
        match effect {
            SlackEffect::FetchFile { file } => self.fetch_file(&file).await.map(SlackResponse::File),
            SlackEffect::PostMessage { channel, text } => {
                let ts = self.post_message(&OutboundMessage { channel, text }).await?;
                Ok(SlackResponse::Posted { ts })
            }
        }
    }
}

impl fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackClient")
            .field("api_base", &self.api_base)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::SlackErrorKind;
    use crate::types::ChannelId;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn settings(api_base: String, timeout: Duration) -> SlackSettings {
        SlackSettings {
            api_base,
            workspace_token: "xoxp-workspace".to_string(),
            bot_token: "xoxb-bot".to_string(),
            target_channel: ChannelId::from("C0001"),
            display_name: "bhattu".to_string(),
            timeout,
        }
    }

    /// Serves `router` on an ephemeral port and returns its API base URL.
    async fn spawn_fake_slack(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn file_id(s: &str) -> FileId {
        FileId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn fetch_file_posts_form_with_workspace_token() {
        let seen: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/files.info",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder.lock().unwrap().push(form);
                    Json(json!({
                        "ok": true,
                        "file": { "subject": "Invoice", "plain_text": "Pay $10" }
                    }))
                }
            }),
        );
        let base = spawn_fake_slack(router).await;
        let client = SlackClient::new(&settings(base, Duration::from_secs(5))).unwrap();

        let record = client.fetch_file(&file_id("F0ABCD123")).await.unwrap();

        assert_eq!(record.subject, "Invoice");
        assert_eq!(record.content, "Pay $10");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("file").map(String::as_str), Some("F0ABCD123"));
        assert_eq!(
            seen[0].get("token").map(String::as_str),
            Some("xoxp-workspace")
        );
    }

    #[tokio::test]
    async fn post_message_sends_bearer_token_and_parameters() {
        let seen: Arc<Mutex<Vec<(Option<String>, Value)>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/api/chat.postMessage",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, body));
                    Json(json!({ "ok": true, "channel": "C0001", "ts": "1700000000.000100" }))
                }
            }),
        );
        let base = spawn_fake_slack(router).await;
        let client = SlackClient::new(&settings(base, Duration::from_secs(5))).unwrap();

        let ts = client
            .post_message(&OutboundMessage {
                channel: ChannelId::from("C0001"),
                text: "hello".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(ts.as_deref(), Some("1700000000.000100"));
        let seen = seen.lock().unwrap();
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer xoxb-bot"));
        assert_eq!(
            body,
            &json!({
                "channel": "C0001",
                "text": "hello",
                "username": "bhattu",
                "as_user": true,
                "parse": "full"
            })
        );
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let router = Router::new().route(
            "/api/files.info",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "ratelimited") }),
        );
        let base = spawn_fake_slack(router).await;
        let client = SlackClient::new(&settings(base, Duration::from_secs(5))).unwrap();

        let err = client.fetch_file(&file_id("F1")).await.unwrap_err();

        assert_eq!(err.kind, SlackErrorKind::Status);
        assert_eq!(err.status_code, Some(429));
        assert_eq!(err.message, "ratelimited");
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let router = Router::new().route("/api/files.info", post(|| async { "not json" }));
        let base = spawn_fake_slack(router).await;
        let client = SlackClient::new(&settings(base, Duration::from_secs(5))).unwrap();

        let err = client.fetch_file(&file_id("F1")).await.unwrap_err();

        assert_eq!(err.kind, SlackErrorKind::Parse);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let router = Router::new().route(
            "/api/files.info",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "ok": true }))
            }),
        );
        let base = spawn_fake_slack(router).await;
        let client = SlackClient::new(&settings(base, Duration::from_millis(200))).unwrap();

        let err = client.fetch_file(&file_id("F1")).await.unwrap_err();

        assert_eq!(err.kind, SlackErrorKind::Timeout);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = SlackClient::new(&settings(
            format!("http://{addr}/api"),
            Duration::from_secs(5),
        ))
        .unwrap();

        let err = client.fetch_file(&file_id("F1")).await.unwrap_err();

        assert_eq!(err.kind, SlackErrorKind::Transport);
        assert!(!err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn interpret_dispatches_effects() {
        let router = Router::new()
            .route(
                "/api/files.info",
                post(|| async { Json(json!({ "ok": true, "file": { "plain_text": "x" } })) }),
            )
            .route(
                "/api/chat.postMessage",
                post(|| async { Json(json!({ "ok": true })) }),
            );
        let base = spawn_fake_slack(router).await;
        let client = SlackClient::new(&settings(base, Duration::from_secs(5))).unwrap();

        let fetched = client
            .interpret(SlackEffect::FetchFile {
                file: file_id("F1"),
            })
            .await
            .unwrap();
        assert!(matches!(fetched, SlackResponse::File(record) if record.content == "x"));

        let posted = client
            .interpret(SlackEffect::PostMessage {
                channel: ChannelId::from("C1"),
                text: "t".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(posted, SlackResponse::Posted { ts: None });
    }

    #[test]
    fn debug_output_hides_tokens() {
        let client = SlackClient::new(&settings(
            "http://localhost".to_string(),
            Duration::from_secs(1),
        ))
        .unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("xoxp-workspace"));
        assert!(!rendered.contains("xoxb-bot"));
    }
}
