//! Delivery markers: the durable at-most-once gate for relayed files.
//!
//! Each [`FileId`] moves through two markers:
//!
//! ```text
//! <file-id>.claim      - claimed (a request is fetching/publishing it)
//! <file-id>.delivered  - published (or the publish call was dispatched)
//! ```
//!
//! # Admission
//!
//! [`MarkerStore::claim`] is the only gate. It is an atomic create-if-absent,
//! so of any number of concurrent deliveries for one file exactly one gets
//! [`Claim::Acquired`]; the rest see [`Claim::InFlight`] or
//! [`Claim::Delivered`] and must not fetch or publish. An in-flight claim may
//! still be released, so only `Delivered` means the file went out.
//!
//! # Failure
//!
//! If the pipeline aborts before publishing, the claim is released so a
//! later redelivery can succeed. Once the publish call has been dispatched
//! the file is marked delivered even if the call failed, since it may have
//! reached Slack. Delivered markers are never removed.

use std::io;

use thiserror::Error;

use crate::types::FileId;

pub mod fs;
pub mod memory;

pub use fs::FsMarkerStore;
pub use memory::MemoryMarkerStore;

/// Errors that can occur during marker operations.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for marker operations.
pub type Result<T> = std::result::Result<T, MarkerError>;

/// Outcome of [`MarkerStore::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// This caller owns the delivery and must fetch and publish.
    Acquired,
    /// Another request holds the claim and has not finished.
    InFlight,
    /// The file was already delivered.
    Delivered,
}

/// A durable keyed set of delivery markers.
///
/// Implementations must be safe to share between concurrent requests.
pub trait MarkerStore: Send + Sync {
    /// Returns `true` if the file's delivered marker exists.
    fn already_delivered(&self, id: &FileId) -> Result<bool>;

    /// Atomically claims the file for delivery.
    fn claim(&self, id: &FileId) -> Result<Claim>;

    /// Records that the publish call for the file was dispatched.
    ///
    /// Idempotent.
    fn mark_delivered(&self, id: &FileId) -> Result<()>;

    /// Drops a claim taken by [`claim`](Self::claim) when the pipeline aborts
    /// before publishing. Has no effect on a delivered file.
    fn release(&self, id: &FileId) -> Result<()>;

    /// Lists files that are claimed but not delivered, in id order.
    ///
    /// At startup these are claims left by a previous run that stopped
    /// mid-pipeline.
    fn interrupted_claims(&self) -> Result<Vec<FileId>>;
}
