//! HTTP server for the DM relay.
//!
//! # Endpoints
//!
//! - `POST /` - Slack Events API deliveries (see [`webhook_handler`])
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use crate::effects::SlackInterpreter;
use crate::relay::Relay;
use crate::slack::{SlackApiError, SlackClient};

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<I = SlackClient> {
    inner: Arc<AppStateInner<I>>,
}

struct AppStateInner<I> {
    relay: Relay<I>,

    /// Slack signing secret. Request signatures are only verified when set.
    signing_secret: Option<Vec<u8>>,
}

impl<I> Clone for AppState<I> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I> AppState<I> {
    pub fn new(relay: Relay<I>, signing_secret: Option<impl Into<Vec<u8>>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                relay,
                signing_secret: signing_secret.map(Into::into),
            }),
        }
    }

    pub fn relay(&self) -> &Relay<I> {
        &self.inner.relay
    }

    pub fn signing_secret(&self) -> Option<&[u8]> {
        self.inner.signing_secret.as_deref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<I>(app_state: AppState<I>) -> axum::Router
where
    I: SlackInterpreter<Error = SlackApiError> + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", post(webhook_handler::<I>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
