//! Core domain types for the relay.

pub mod event;
pub mod ids;

pub use event::{FileRecord, InboundEvent, MessageEvent, OutboundMessage};
pub use ids::{ChannelId, EventId, FileId};
