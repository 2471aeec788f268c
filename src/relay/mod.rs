//! The relay pipeline: one inbound upload event to at most one channel post.
//!
//! ```text
//! validate -> extract file id -> claim -> files.info -> format
//!          -> chat.postMessage -> mark delivered
//! ```
//!
//! Validation and extraction failures reject the event without touching the
//! marker store. A request that finds the file claimed by another
//! unfinished request fails with [`RelayError::InFlight`] so Slack retries it
//! later. A failed fetch releases the claim so a redelivery can try again.
//! Once the publish call has been attempted the file is marked delivered
//! whatever its result.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::Credentials;
use crate::effects::{SlackEffect, SlackInterpreter, SlackResponse};
use crate::markers::{Claim, MarkerError, MarkerStore};
use crate::slack::SlackApiError;
use crate::types::{ChannelId, FileId, FileRecord, InboundEvent};
use crate::webhooks::{ExtractError, Rejection, check_event, extract_file_id};

pub mod format;

pub use format::{escape_inline, escape_literal, format_message};

/// How a successfully handled event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The file was fetched and published to the target channel.
    Delivered { file: FileId },
    /// The file was already delivered; nothing was sent.
    Duplicate { file: FileId },
}

impl RelayOutcome {
    pub fn file(&self) -> &FileId {
        match self {
            RelayOutcome::Delivered { file } | RelayOutcome::Duplicate { file } => file,
        }
    }
}

/// Errors that abort the pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The event failed a credential or shape check.
    #[error("event rejected: {0}")]
    Rejected(Rejection),

    /// The event text names no file.
    #[error("malformed event: {0}")]
    Malformed(#[from] ExtractError),

    /// Another request holds the claim and may still release it.
    #[error("{file} is being relayed by another request")]
    InFlight { file: FileId },

    /// `files.info` failed.
    #[error("fetching {file} failed: {source}")]
    Fetch {
        file: FileId,
        #[source]
        source: SlackApiError,
    },

    /// `chat.postMessage` failed. The file stays marked delivered.
    #[error("publishing {file} failed: {source}")]
    Publish {
        file: FileId,
        #[source]
        source: SlackApiError,
    },

    /// The interpreter answered an effect with the wrong response kind.
    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),

    /// Marker store I/O failed.
    #[error("marker store error: {0}")]
    Store(#[from] MarkerError),
}

impl From<Rejection> for RelayError {
    fn from(rejection: Rejection) -> Self {
        RelayError::Rejected(rejection)
    }
}

/// Relays upload events from the bot DM to the target channel.
pub struct Relay<I> {
    credentials: Credentials,
    target_channel: ChannelId,
    markers: Arc<dyn MarkerStore>,
    slack: I,
}

impl<I> Relay<I>
where
    I: SlackInterpreter<Error = SlackApiError> + Sync,
{
    pub fn new(
        credentials: Credentials,
        target_channel: ChannelId,
        markers: Arc<dyn MarkerStore>,
        slack: I,
    ) -> Self {
        Relay {
            credentials,
            target_channel,
            markers,
            slack,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn markers(&self) -> &dyn MarkerStore {
        self.markers.as_ref()
    }

    pub fn slack(&self) -> &I {
        &self.slack
    }

    /// Runs one event through the pipeline.
    #[instrument(skip_all, fields(event_id = %event.event_id))]
    pub async fn process_event(&self, event: &InboundEvent) -> Result<RelayOutcome, RelayError> {
        check_event(event, &self.credentials)?;
        let file = extract_file_id(&event.event.text)?;
        debug!(file_id = %file, "Upload event accepted");

        if self.markers.already_delivered(&file)? {
            info!(file_id = %file, "File already delivered, skipping");
            return Ok(RelayOutcome::Duplicate { file });
        }

        match self.markers.claim(&file)? {
            Claim::Acquired => {}
            Claim::Delivered => {
                info!(file_id = %file, "File already delivered, skipping");
                return Ok(RelayOutcome::Duplicate { file });
            }
            Claim::InFlight => {
                info!(file_id = %file, "File claimed by an unfinished request");
                return Err(RelayError::InFlight { file });
            }
        }

        let record = match self.fetch(&file).await {
            Ok(record) => record,
            Err(e) => {
                if let Err(release_err) = self.markers.release(&file) {
                    warn!(file_id = %file, error = %release_err, "Failed to release claim");
                }
                return Err(e);
            }
        };

        let published = self.publish(&file, format_message(&record)).await;
        let marked = self.markers.mark_delivered(&file);

        match (published, marked) {
            (Err(e), marked) => {
                if let Err(mark_err) = marked {
                    warn!(file_id = %file, error = %mark_err, "Failed to mark file delivered");
                }
                Err(e)
            }
            (Ok(()), Err(mark_err)) => Err(mark_err.into()),
            (Ok(()), Ok(())) => {
                info!(file_id = %file, channel = %self.target_channel, "File relayed");
                Ok(RelayOutcome::Delivered { file })
            }
        }
    }

    async fn fetch(&self, file: &FileId) -> Result<FileRecord, RelayError> {
        let effect = SlackEffect::FetchFile { file: file.clone() };
        let method = effect.method();
        match self.slack.interpret(effect).await {
            Ok(SlackResponse::File(record)) => Ok(record),
            Ok(_) => Err(RelayError::UnexpectedResponse(method)),
            Err(source) => Err(RelayError::Fetch {
                file: file.clone(),
                source,
            }),
        }
    }

    async fn publish(&self, file: &FileId, text: String) -> Result<(), RelayError> {
        let effect = SlackEffect::PostMessage {
            channel: self.target_channel.clone(),
            text,
        };
        let method = effect.method();
        match self.slack.interpret(effect).await {
            Ok(SlackResponse::Posted { ts }) => {
                debug!(file_id = %file, ts = ?ts, "Message posted");
                Ok(())
            }
            Ok(_) => Err(RelayError::UnexpectedResponse(method)),
            Err(source) => Err(RelayError::Publish {
                file: file.clone(),
                source,
            }),
        }
    }
}
