//! Inbound webhook handling for Slack events.
//!
//! This module provides:
//! - Request signature verification (HMAC-SHA256, `X-Slack-Signature`)
//! - Envelope parsing
//! - Credential validation of `message.im` upload events
//! - File-identifier extraction from the notification text

pub mod extract;
pub mod parser;
pub mod signature;
pub mod validate;

pub use extract::{ExtractError, extract_file_id};
pub use parser::{ParseError, WebhookPayload, parse_webhook};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
pub use validate::{Rejection, UPLOAD_MARKER, check_event, is_authentic};
