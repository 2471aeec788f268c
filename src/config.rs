//! Process configuration.
//!
//! All secrets and identifiers come from the environment and are loaded once
//! at startup into a [`Config`], which is then shared read-only by the
//! validator, the Slack client and the publisher.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::ChannelId;

/// Default directory for delivery markers.
pub const DEFAULT_MARKER_DIR: &str = "markers";

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Default display name used when posting.
pub const DEFAULT_DISPLAY_NAME: &str = "bhattu";

/// Default timeout for each outbound Slack call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("${0} must be set")]
    Missing(&'static str),

    /// A variable holds a value that cannot be parsed.
    #[error("invalid value for ${name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// The shared secrets an inbound event must carry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub payload_token: String,
    pub team_id: String,
    pub app_id: String,
    /// The bot's DM channel that uploads arrive in.
    pub expected_channel: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("payload_token", &"<redacted>")
            .field("team_id", &self.team_id)
            .field("app_id", &self.app_id)
            .field("expected_channel", &self.expected_channel)
            .finish()
    }
}

/// Settings for outbound Slack Web API calls.
#[derive(Clone)]
pub struct SlackSettings {
    pub api_base: String,
    /// Token used for `files.info`.
    pub workspace_token: String,
    /// Token used for `chat.postMessage`.
    pub bot_token: String,
    pub target_channel: ChannelId,
    pub display_name: String,
    pub timeout: Duration,
}

impl fmt::Debug for SlackSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackSettings")
            .field("api_base", &self.api_base)
            .field("workspace_token", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .field("target_channel", &self.target_channel)
            .field("display_name", &self.display_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete process configuration.
#[derive(Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub slack: SlackSettings,
    /// Secret for `X-Slack-Signature` verification. When `None`, request
    /// signatures are not checked.
    pub signing_secret: Option<String>,
    pub marker_dir: PathBuf,
    pub port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("credentials", &self.credentials)
            .field("slack", &self.slack)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("marker_dir", &self.marker_dir)
            .field("port", &self.port)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let credentials = Credentials {
            payload_token: required("SLACK_PAYLOAD_TOKEN")?,
            team_id: required("TEAM_ID")?,
            app_id: required("APP_ID")?,
            expected_channel: required("MY_DM_CHANNEL")?,
        };

        let timeout_secs = match get("SLACK_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SLACK_HTTP_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let slack = SlackSettings {
            api_base: get("SLACK_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            workspace_token: required("SLACK_WORKSPACE_TOKEN_FOR_APP")?,
            bot_token: required("SLACK_BOT_TOKEN")?,
            target_channel: ChannelId::new(required("CHANNEL_ID")?),
            display_name: get("SLACK_DISPLAY_NAME")
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let raw_port = required("PORT")?;
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw_port.clone(),
            })?;

        Ok(Config {
            credentials,
            slack,
            signing_secret: get("SLACK_SIGNING_SECRET"),
            marker_dir: get("MARKER_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MARKER_DIR)),
            port,
        })
    }
}
