//! Filesystem-backed marker store.
//!
//! Markers are empty files in a single directory. Claims are created with
//! `O_CREAT | O_EXCL` semantics (`create_new`), which is the atomic gate.
//! Every create or remove is followed by a directory fsync so the marker
//! survives a power loss.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::FileId;

use super::{Claim, MarkerStore, Result};

const CLAIM_EXT: &str = "claim";
const DELIVERED_EXT: &str = "delivered";

/// Marker store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsMarkerStore {
    dir: PathBuf,
}

impl FsMarkerStore {
    /// Opens (creating if needed) the marker directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FsMarkerStore { dir })
    }

    /// Returns the marker directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to the claim marker for a file.
    pub fn claim_path(&self, id: &FileId) -> PathBuf {
        self.dir.join(format!("{}.{}", id.as_str(), CLAIM_EXT))
    }

    /// Returns the path to the delivered marker for a file.
    pub fn delivered_path(&self, id: &FileId) -> PathBuf {
        self.dir.join(format!("{}.{}", id.as_str(), DELIVERED_EXT))
    }
}

impl MarkerStore for FsMarkerStore {
    fn already_delivered(&self, id: &FileId) -> Result<bool> {
        Ok(self.delivered_path(id).try_exists()?)
    }

    fn claim(&self, id: &FileId) -> Result<Claim> {
        if self.already_delivered(id)? {
            return Ok(Claim::Delivered);
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.claim_path(id))
        {
            Ok(file) => drop(file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                // The holder may have finished since the first check.
                if self.already_delivered(id)? {
                    return Ok(Claim::Delivered);
                }
                debug!(file_id = %id, "Claim already held");
                return Ok(Claim::InFlight);
            }
            Err(e) => return Err(e.into()),
        }

        fsync_dir(&self.dir)?;
        Ok(Claim::Acquired)
    }

    fn mark_delivered(&self, id: &FileId) -> Result<()> {
        let path = self.delivered_path(id);
        if path.try_exists()? {
            return Ok(());
        }

        // Empty file, so a partially created marker is equivalent to a complete one.
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.sync_all()?;
        drop(file);

        fsync_dir(&self.dir)?;
        Ok(())
    }

    fn release(&self, id: &FileId) -> Result<()> {
        if self.already_delivered(id)? {
            return Ok(());
        }

        match fs::remove_file(self.claim_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        fsync_dir(&self.dir)?;
        Ok(())
    }

    fn interrupted_claims(&self) -> Result<Vec<FileId>> {
        let mut interrupted = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();

            if !path.extension().is_some_and(|e| e == CLAIM_EXT) {
                continue;
            }

            let Some(id) = extract_file_id(&path) else {
                continue;
            };

            if !self.already_delivered(&id)? {
                interrupted.push(id);
            }
        }

        interrupted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(interrupted)
    }
}

/// Recovers the file id from a marker path (`<id>.claim`).
fn extract_file_id(path: &Path) -> Option<FileId> {
    let stem = path.file_stem()?.to_str()?;
    FileId::parse(stem)
}

/// Syncs a directory so newly created or removed entries are durable.
fn fsync_dir(dir: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir)?;
    dir.sync_all()
}
