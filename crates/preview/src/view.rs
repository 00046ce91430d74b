use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use cosmos_core::{Color, DocumentRecord, RecordId};

use crate::error::PreviewError;
use crate::handle::{HandleRegistry, PayloadHandle};

/// Something that can display a document given its URL.
pub trait ExternalViewer {
    fn open(&self, url: &str) -> Result<(), PreviewError>;
}

/// Header strip of the detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewHeader {
    pub name: String,
    pub color: Color,
    pub size_label: String,
}

struct Open {
    record: DocumentRecord,
    handle: PayloadHandle,
}

/// Detail view for the selected record. Holds at most one payload handle,
/// released when the view closes, switches record, or is dropped.
pub struct PreviewView {
    registry: HandleRegistry,
    open: Option<Open>,
}

impl PreviewView {
    /// An empty view; nothing is shown until [`show`](Self::show).
    pub fn new(registry: &HandleRegistry) -> Self {
        Self {
            registry: registry.clone(),
            open: None,
        }
    }

    pub fn open(registry: &HandleRegistry, record: &DocumentRecord) -> Result<Self, PreviewError> {
        let mut view = Self::new(registry);
        view.show(record)?;
        Ok(view)
    }

    /// Show `record`. Showing the record already on screen keeps its handle.
    pub fn show(&mut self, record: &DocumentRecord) -> Result<(), PreviewError> {
        if self.record_id() == Some(record.id()) {
            return Ok(());
        }
        // Release the old handle before acquiring the next one.
        self.close();
        let handle = self.registry.acquire(record)?;
        debug!(id = %record.id(), "preview opened");
        self.open = Some(Open {
            record: record.clone(),
            handle,
        });
        Ok(())
    }

    /// Follow the selection: show the selected record, or close when the
    /// selection is empty or refers to a record that no longer exists.
    pub fn sync(&mut self, selected: Option<&DocumentRecord>) -> Result<(), PreviewError> {
        match selected {
            Some(record) => self.show(record),
            None => {
                self.close();
                Ok(())
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(open) = self.open.take() {
            debug!(id = %open.record.id(), "preview closed");
            open.handle.revoke();
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn record(&self) -> Option<&DocumentRecord> {
        self.open.as_ref().map(|o| &o.record)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record().map(DocumentRecord::id)
    }

    pub fn handle(&self) -> Option<&PayloadHandle> {
        self.open.as_ref().map(|o| &o.handle)
    }

    pub fn header(&self) -> Option<PreviewHeader> {
        self.record().map(|r| PreviewHeader {
            name: r.name().to_string(),
            color: r.color().clone(),
            size_label: r.size_label(),
        })
    }

    /// Save a copy of the payload into `dest_dir` under the record's name.
    /// Existing files are never overwritten; a ` (n)` suffix is added instead.
    pub fn download(&self, dest_dir: &Path) -> Result<PathBuf, PreviewError> {
        let record = self.record().ok_or(PreviewError::NothingOpen)?;
        let filename = record.suggested_filename();
        let (stem, ext) = split_name(&filename);

        for n in 0u32.. {
            let candidate = if n == 0 {
                dest_dir.join(&filename)
            } else {
                dest_dir.join(format!("{stem} ({n}){ext}"))
            };
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut file) => {
                    write_or_discard(&candidate, move || {
                        file.write_all(record.payload())?;
                        file.sync_all()
                    })?;
                    info!(id = %record.id(), path = %candidate.display(), "document saved");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(PreviewError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "no free file name",
        )))
    }

    pub fn open_externally(&self, viewer: &dyn ExternalViewer) -> Result<(), PreviewError> {
        let handle = self.handle().ok_or(PreviewError::NothingOpen)?;
        info!(id = %handle.record_id(), "opening in external viewer");
        viewer.open(handle.url())
    }

    /// The id to pass to `Library::delete`; the view does not delete.
    pub fn delete_request(&self) -> Option<RecordId> {
        self.record_id()
    }
}

/// Run `write` against the freshly created `path`; a failed write leaves no
/// partial file behind.
fn write_or_discard(
    path: &Path,
    write: impl FnOnce() -> std::io::Result<()>,
) -> Result<(), PreviewError> {
    write().map_err(|e| {
        if let Err(cleanup) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial download");
        }
        PreviewError::from(e)
    })
}

/// `report.pdf` -> (`report`, `.pdf`); names without an extension keep it empty.
fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use bytes::Bytes;
    use cosmos_core::Placement;

    fn record(name: &str, body: &'static [u8]) -> DocumentRecord {
        DocumentRecord::new(
            name,
            body.len() as u64,
            0,
            Bytes::from_static(body),
            Placement {
                position: [0.0; 3],
                orientation: [0.0; 3],
                color: Color::parse("#f1c40f").unwrap(),
            },
        )
    }

    #[derive(Default)]
    struct RecordingViewer {
        opened: RefCell<Vec<String>>,
    }

    impl ExternalViewer for RecordingViewer {
        fn open(&self, url: &str) -> Result<(), PreviewError> {
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn header_shows_name_color_and_size() {
        let registry = HandleRegistry::new().unwrap();
        let view = PreviewView::open(&registry, &record("thesis.pdf", b"%PDF")).unwrap();
        let header = view.header().unwrap();
        assert_eq!(header.name, "thesis.pdf");
        assert_eq!(header.color.as_str(), "#f1c40f");
        assert_eq!(header.size_label, "0.00 MB");
    }

    #[test]
    fn one_handle_per_view_across_switches() {
        let registry = HandleRegistry::new().unwrap();
        let a = record("a.pdf", b"%PDF-a");
        let b = record("b.pdf", b"%PDF-b");

        let mut view = PreviewView::open(&registry, &a).unwrap();
        let first_path = view.handle().unwrap().path().to_path_buf();
        view.show(&a).unwrap();
        assert_eq!(view.handle().unwrap().path(), first_path);

        view.show(&b).unwrap();
        assert_eq!(registry.live_handles(), 1);
        assert!(!first_path.exists());
        assert_eq!(view.record_id(), Some(b.id()));

        view.close();
        assert_eq!(registry.live_handles(), 0);
        assert!(view.header().is_none());
    }

    #[test]
    fn dropping_the_view_releases() {
        let registry = HandleRegistry::new().unwrap();
        {
            let _view = PreviewView::open(&registry, &record("a.pdf", b"%PDF")).unwrap();
            assert_eq!(registry.live_handles(), 1);
        }
        assert_eq!(registry.live_handles(), 0);
    }

    #[test]
    fn sync_follows_selection() {
        let registry = HandleRegistry::new().unwrap();
        let a = record("a.pdf", b"%PDF");
        let mut view = PreviewView::new(&registry);
        view.sync(Some(&a)).unwrap();
        assert_eq!(view.delete_request(), Some(a.id()));
        view.sync(None).unwrap();
        assert!(!view.is_open());
        assert_eq!(view.delete_request(), None);
    }

    #[test]
    fn download_never_clobbers() {
        let registry = HandleRegistry::new().unwrap();
        let dest = tempfile::TempDir::new().unwrap();
        std::fs::write(dest.path().join("report.pdf"), b"mine").unwrap();

        let view = PreviewView::open(&registry, &record("report.pdf", b"%PDF-new")).unwrap();
        let first = view.download(dest.path()).unwrap();
        let second = view.download(dest.path()).unwrap();

        assert_eq!(first, dest.path().join("report (1).pdf"));
        assert_eq!(second, dest.path().join("report (2).pdf"));
        assert_eq!(std::fs::read(dest.path().join("report.pdf")).unwrap(), b"mine");
        assert_eq!(std::fs::read(&first).unwrap(), b"%PDF-new");
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let dest = tempfile::TempDir::new().unwrap();
        let path = dest.path().join("half.pdf");
        std::fs::write(&path, b"%PD").unwrap();

        let result = write_or_discard(&path, || {
            Err(std::io::Error::new(ErrorKind::WriteZero, "disk full"))
        });
        assert!(matches!(result, Err(PreviewError::Io(_))));
        assert!(!path.exists());

        let kept = dest.path().join("whole.pdf");
        std::fs::write(&kept, b"%PDF").unwrap();
        write_or_discard(&kept, || Ok(())).unwrap();
        assert!(kept.exists());
    }

    #[test]
    fn download_strips_directories_from_name() {
        let registry = HandleRegistry::new().unwrap();
        let dest = tempfile::TempDir::new().unwrap();
        let view = PreviewView::open(&registry, &record("../../etc/evil.pdf", b"%PDF")).unwrap();
        assert_eq!(view.download(dest.path()).unwrap(), dest.path().join("evil.pdf"));
    }

    #[test]
    fn closed_view_cannot_download_or_open() {
        let registry = HandleRegistry::new().unwrap();
        let view = PreviewView::new(&registry);
        let dest = tempfile::TempDir::new().unwrap();
        assert!(matches!(view.download(dest.path()), Err(PreviewError::NothingOpen)));
        assert!(matches!(
            view.open_externally(&RecordingViewer::default()),
            Err(PreviewError::NothingOpen)
        ));
    }

    #[test]
    fn external_viewer_receives_handle_url() {
        let registry = HandleRegistry::new().unwrap();
        let view = PreviewView::open(&registry, &record("a.pdf", b"%PDF")).unwrap();
        let viewer = RecordingViewer::default();
        view.open_externally(&viewer).unwrap();
        assert_eq!(viewer.opened.borrow().as_slice(), [view.handle().unwrap().url()]);
    }

    #[test]
    fn split_keeps_extension() {
        assert_eq!(split_name("a.b.pdf"), ("a.b", ".pdf"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".hidden"), (".hidden", ""));
    }
}
