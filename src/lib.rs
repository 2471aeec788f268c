//! DM relay - forwards files uploaded to a Slack bot's DM into a fixed channel.
//!
//! This library provides the relay pipeline and the pieces it is built from:
//! webhook parsing and validation, the delivery marker store, the Slack Web
//! API client, and the axum server that ties them together.

pub mod config;
pub mod effects;
pub mod markers;
pub mod relay;
pub mod server;
pub mod slack;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
