//! In-process marker store.
//!
//! Not durable across restarts.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::types::FileId;

use super::{Claim, MarkerStore, Result};

#[derive(Debug, Default)]
struct Markers {
    claimed: BTreeSet<String>,
    delivered: HashSet<String>,
}

/// Marker store backed by a mutex-guarded set.
///
/// Claim check-and-insert happens under one lock, so it is atomic.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    markers: Mutex<Markers>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Markers> {
        // A poisoned lock still holds a consistent set: every mutation is a
        // single insert or remove.
        self.markers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn already_delivered(&self, id: &FileId) -> Result<bool> {
        Ok(self.lock().delivered.contains(id.as_str()))
    }

    fn claim(&self, id: &FileId) -> Result<Claim> {
        let mut markers = self.lock();
        if markers.delivered.contains(id.as_str()) {
            return Ok(Claim::Delivered);
        }
        if markers.claimed.insert(id.as_str().to_string()) {
            Ok(Claim::Acquired)
        } else {
            Ok(Claim::InFlight)
        }
    }

    fn mark_delivered(&self, id: &FileId) -> Result<()> {
        self.lock().delivered.insert(id.as_str().to_string());
        Ok(())
    }

    fn release(&self, id: &FileId) -> Result<()> {
        let mut markers = self.lock();
        if !markers.delivered.contains(id.as_str()) {
            markers.claimed.remove(id.as_str());
        }
        Ok(())
    }

    fn interrupted_claims(&self) -> Result<Vec<FileId>> {
        let markers = self.lock();
        Ok(markers
            .claimed
            .iter()
            .filter(|id| !markers.delivered.contains(id.as_str()))
            .filter_map(|id| FileId::parse(id.as_str()))
            .collect())
    }
}
