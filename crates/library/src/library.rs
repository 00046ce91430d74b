//! The library controller: a single state struct mutated only through named
//! transitions.
//!
//! Store calls are awaited before the in-memory working set changes, so a
//! failed write never shows up on screen and a failed delete never hides a
//! record that is still on disk. Store failures become [`Notice`]s; nothing
//! here returns an error to the host.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use cosmos_core::{Color, DocumentRecord, RecordId};
use cosmos_layout::LayoutModel;
use cosmos_storage::RecordStore;

use crate::capability::{Confirm, DirectoryAccess, DirectoryAccessError};
use crate::ingest::{FailedFile, IncomingFile, IngestReport};
use crate::notice::{Notice, StorageAction};

/// Question asked before a record is deleted.
pub const DELETE_PROMPT: &str = "Are you sure you want to remove this book from your cosmos?";

const DIRECTORY_CAPABILITY: &str = "directory access";

/// Everything the UI renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    pub documents: Vec<DocumentRecord>,
    pub selected_id: Option<RecordId>,
    pub is_drag_active: bool,
    pub is_ingesting: bool,
    pub show_onboarding: bool,
}

/// One row of the library sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryEntry {
    pub id: RecordId,
    pub name: String,
    pub color: Color,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined the confirmation.
    Declined,
    /// The id is not in the working set; nothing was done.
    NotFound,
    /// The store refused; the working set is unchanged.
    Failed,
}

pub struct Library<S, R: Rng = StdRng> {
    store: S,
    layout: LayoutModel<R>,
    state: LibraryState,
    notices: Vec<Notice>,
}

impl<S: RecordStore, R: Rng> Library<S, R> {
    /// Load every stored record and decide whether to show onboarding.
    ///
    /// A failed load starts an empty library with a notice instead of failing.
    pub async fn startup(store: S, layout: LayoutModel<R>) -> Self {
        let mut notices = Vec::new();
        let documents = match store.get_all().await {
            Ok(documents) => {
                info!(count = documents.len(), "library loaded");
                documents
            }
            Err(e) => {
                error!(error = %e, "failed to load library");
                notices.push(Notice::StorageFailure {
                    action: StorageAction::Load,
                    subject: "library".to_string(),
                    message: e.to_string(),
                });
                Vec::new()
            }
        };

        let state = LibraryState {
            show_onboarding: documents.is_empty(),
            documents,
            ..LibraryState::default()
        };

        Self {
            store,
            layout,
            state,
            notices,
        }
    }

    pub fn state(&self) -> &LibraryState {
        &self.state
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.state.documents
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Transitions ─────────────────────────────────────────────

    pub fn drag_enter(&mut self) {
        self.state.is_drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.state.is_drag_active = false;
    }

    /// Ingest a dropped or selected batch, one file at a time.
    ///
    /// Non-PDF files are skipped silently. A store failure drops only that
    /// file; the rest of the batch continues.
    pub async fn drop_files(&mut self, files: Vec<IncomingFile>) -> IngestReport {
        self.state.is_drag_active = false;
        let mut report = IngestReport::default();
        if files.is_empty() {
            return report;
        }

        self.state.is_ingesting = true;
        info!(files = files.len(), "ingesting batch");

        for file in files {
            if let Err(e) = file.validate() {
                debug!(reason = %e, "skipping file");
                report.skipped.push(file.name);
                continue;
            }

            let placement = self.layout.assign(self.state.documents.len());
            let record = file.into_record(placement);

            match self.store.put(&record).await {
                Ok(()) => {
                    info!(id = %record.id(), name = %record.name(), "document added");
                    report.accepted.push(record.id());
                    self.state.documents.push(record);
                }
                Err(e) => {
                    error!(name = %record.name(), error = %e, "failed to save document");
                    self.notices.push(Notice::StorageFailure {
                        action: StorageAction::Save,
                        subject: record.name().to_string(),
                        message: e.to_string(),
                    });
                    report.failed.push(FailedFile {
                        name: record.name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.state.is_ingesting = false;
        self.state.show_onboarding = false;
        info!(
            accepted = report.accepted.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }

    /// Select an id. It does not have to exist; an unknown id shows nothing.
    pub fn select(&mut self, id: RecordId) {
        self.state.selected_id = Some(id);
    }

    pub fn close_preview(&mut self) {
        self.state.selected_id = None;
    }

    /// Delete after confirmation. The store is updated first; the working set
    /// only changes once the store call succeeds.
    pub async fn delete(&mut self, id: RecordId, confirm: &dyn Confirm) -> DeleteOutcome {
        if !self.contains(id) {
            debug!(id = %id, "delete of unknown id ignored");
            return DeleteOutcome::NotFound;
        }

        if !confirm.confirm(DELETE_PROMPT) {
            debug!(id = %id, "delete declined");
            return DeleteOutcome::Declined;
        }

        if let Err(e) = self.store.delete(id).await {
            error!(id = %id, error = %e, "failed to delete document");
            self.notices.push(Notice::StorageFailure {
                action: StorageAction::Delete,
                subject: id.to_string(),
                message: e.to_string(),
            });
            return DeleteOutcome::Failed;
        }

        self.state.documents.retain(|d| d.id() != id);
        if self.state.selected_id == Some(id) {
            self.state.selected_id = None;
        }
        info!(id = %id, remaining = self.state.documents.len(), "document deleted");
        DeleteOutcome::Deleted
    }

    /// Ask the optional directory capability for access. Never fails; the
    /// result is reported as a notice (also returned).
    pub fn request_directory_access(&mut self, access: Option<&dyn DirectoryAccess>) -> Notice {
        let notice = match access.map(|a| a.request()) {
            Some(Ok(grant)) => {
                info!(directory = %grant.name, "directory access granted");
                Notice::DirectoryConnected { name: grant.name }
            }
            None | Some(Err(DirectoryAccessError::Unsupported)) => {
                warn!("directory access unsupported");
                Notice::CapabilityUnsupported {
                    capability: DIRECTORY_CAPABILITY.to_string(),
                }
            }
            Some(Err(DirectoryAccessError::Denied(reason))) => {
                warn!(reason = %reason, "directory access denied");
                Notice::DirectoryDenied { reason }
            }
        };
        self.notices.push(notice.clone());
        notice
    }

    // ── Read models ─────────────────────────────────────────────

    pub fn contains(&self, id: RecordId) -> bool {
        self.state.documents.iter().any(|d| d.id() == id)
    }

    pub fn get(&self, id: RecordId) -> Option<&DocumentRecord> {
        self.state.documents.iter().find(|d| d.id() == id)
    }

    /// The record behind the current selection, if it is in the working set.
    pub fn selected_document(&self) -> Option<&DocumentRecord> {
        self.state.selected_id.and_then(|id| self.get(id))
    }

    pub fn onboarding_visible(&self) -> bool {
        self.state.show_onboarding && self.state.documents.is_empty()
    }

    pub fn library_entries(&self) -> Vec<LibraryEntry> {
        self.state
            .documents
            .iter()
            .map(|d| LibraryEntry {
                id: d.id(),
                name: d.name().to_string(),
                color: d.color().clone(),
                selected: self.state.selected_id == Some(d.id()),
            })
            .collect()
    }

    pub fn status_line(&self) -> String {
        format!("{} OBJECTS LOADED | SYSTEM READY", self.state.documents.len())
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
