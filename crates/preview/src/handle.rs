//! Transient, revocable payload handles.
//!
//! A handle materializes a record's payload as a file under the registry's
//! private temporary directory so an external viewer can open it by URL.
//! The file is removed when the handle is revoked or dropped; the directory
//! itself goes away with the last registry clone and handle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, warn};
use url::Url;

use cosmos_core::{DocumentRecord, RecordId};

use crate::error::PreviewError;

const VIEWER_FRAGMENT: &str = "toolbar=1";

#[derive(Debug)]
struct RegistryInner {
    root: TempDir,
    next_slot: AtomicU64,
    live: AtomicUsize,
}

/// Issues payload handles. Cheap to clone; clones share one directory.
#[derive(Debug, Clone)]
pub struct HandleRegistry {
    inner: Arc<RegistryInner>,
}

impl HandleRegistry {
    pub fn new() -> Result<Self, PreviewError> {
        let root = tempfile::Builder::new().prefix("cosmos-preview-").tempdir()?;
        debug!(dir = %root.path().display(), "preview registry created");
        Ok(Self {
            inner: Arc::new(RegistryInner {
                root,
                next_slot: AtomicU64::new(0),
                live: AtomicUsize::new(0),
            }),
        })
    }

    pub fn root(&self) -> &Path {
        self.inner.root.path()
    }

    /// Number of handles issued and not yet released.
    pub fn live_handles(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Write the record's payload out and return a handle to it.
    pub fn acquire(&self, record: &DocumentRecord) -> Result<PayloadHandle, PreviewError> {
        let slot = self.inner.next_slot.fetch_add(1, Ordering::SeqCst);
        let slot_dir = self.root().join(slot.to_string());
        std::fs::create_dir(&slot_dir)?;

        let path = slot_dir.join(record.suggested_filename());
        if let Err(e) = std::fs::write(&path, record.payload()) {
            let _ = std::fs::remove_dir_all(&slot_dir);
            return Err(e.into());
        }

        let url = match Url::from_file_path(&path) {
            Ok(url) => url,
            Err(()) => {
                let _ = std::fs::remove_dir_all(&slot_dir);
                return Err(PreviewError::Url(path.display().to_string()));
            }
        };

        let live = self.inner.live.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(id = %record.id(), slot, live, "payload handle acquired");

        Ok(PayloadHandle {
            record_id: record.id(),
            slot_dir,
            path,
            url,
            registry: Arc::clone(&self.inner),
            released: false,
        })
    }
}

/// A live payload file. Released exactly once, by [`revoke`](Self::revoke)
/// or on drop.
#[derive(Debug)]
pub struct PayloadHandle {
    record_id: RecordId,
    slot_dir: PathBuf,
    path: PathBuf,
    url: Url,
    registry: Arc<RegistryInner>,
    released: bool,
}

impl PayloadHandle {
    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URL of the materialized payload.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// URL for an embedded viewer, with its toolbar enabled.
    pub fn viewer_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(Some(VIEWER_FRAGMENT));
        url.into()
    }

    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = std::fs::remove_dir_all(&self.slot_dir) {
            warn!(path = %self.slot_dir.display(), error = %e, "failed to remove payload file");
        }
        let live = self.registry.live.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(id = %self.record_id, live, "payload handle released");
    }
}

impl Drop for PayloadHandle {
    fn drop(&mut self) {
        self.release();
    }
}
