use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use cosmos_core::{DocumentRecord, Placement, RecordId, PDF_MIME_TYPE};

/// A dropped or selected file, before it becomes a record.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Epoch milliseconds.
    pub last_modified: i64,
    pub payload: Bytes,
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{name}: unsupported type '{mime_type}', only application/pdf is accepted")]
    UnsupportedType { name: String, mime_type: String },
}

impl IncomingFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        last_modified: i64,
        payload: impl Into<Bytes>,
    ) -> Self {
        let payload = payload.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: payload.len() as u64,
            last_modified,
            payload,
        }
    }

    /// Read a file from disk. The MIME type is inferred from the extension
    /// first; files that are not PDFs are described from metadata alone and
    /// their contents are never read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let mime_type = mime_type_for(path);
        let metadata = tokio::fs::metadata(path).await?;
        let last_modified = metadata
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
            .unwrap_or_else(|_| Utc::now().timestamp_millis());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if mime_type != PDF_MIME_TYPE {
            return Ok(Self {
                name,
                mime_type: mime_type.to_string(),
                size_bytes: metadata.len(),
                last_modified,
                payload: Bytes::new(),
            });
        }

        let payload = tokio::fs::read(path).await?;
        Ok(Self::new(name, mime_type, last_modified, payload))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mime_type == PDF_MIME_TYPE {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedType {
                name: self.name.clone(),
                mime_type: self.mime_type.clone(),
            })
        }
    }

    pub(crate) fn into_record(self, placement: Placement) -> DocumentRecord {
        DocumentRecord::new(
            self.name,
            self.size_bytes,
            self.last_modified,
            self.payload,
            placement,
        )
    }
}

/// MIME type by extension: `.pdf` (any case) is a PDF, anything else is opaque.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

/// A file whose record could not be saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub name: String,
    pub message: String,
}

/// Outcome of one drop batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub accepted: Vec<RecordId>,
    /// Names of files rejected by the type filter.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn only_pdf_mime_passes() {
        assert!(IncomingFile::new("a.pdf", PDF_MIME_TYPE, 0, &b"%PDF"[..]).validate().is_ok());
        let err = IncomingFile::new("c.txt", "text/plain", 0, &b"hi"[..])
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                name: "c.txt".to_string(),
                mime_type: "text/plain".to_string()
            }
        );
    }

    #[test]
    fn mime_inferred_from_extension() {
        assert_eq!(mime_type_for(Path::new("x/Report.PDF")), PDF_MIME_TYPE);
        assert_eq!(mime_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("README")), "application/octet-stream");
    }

    #[tokio::test]
    async fn from_path_captures_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.7 body").unwrap();

        let file = IncomingFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "paper.pdf");
        assert_eq!(file.mime_type, PDF_MIME_TYPE);
        assert_eq!(file.size_bytes, 13);
        assert_eq!(&file.payload[..], b"%PDF-1.7 body");
        assert!(file.last_modified > 0);
    }

    #[tokio::test]
    async fn non_pdf_contents_are_not_loaded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("disk.iso");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        let file = IncomingFile::from_path(&path).await.unwrap();
        assert_eq!(file.mime_type, "application/octet-stream");
        assert_eq!(file.size_bytes, 4096);
        assert!(file.payload.is_empty());
        assert!(file.validate().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_non_pdf_is_still_described() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("locked.bin");
        std::fs::write(&path, b"secret").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        let file = IncomingFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "locked.bin");
        assert_eq!(file.size_bytes, 6);
        assert!(file.payload.is_empty());
    }
}
