//! File-per-record store on the local filesystem.
//!
//! Each record lives in `records/<id>.rec`: a zstd stream wrapping a
//! MessagePack envelope with the metadata, layout and payload. Writes land in
//! `<id>.rec.tmp` first and are renamed into place after `sync_all`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use cosmos_core::{Color, DocumentRecord, Placement, RecordId, Vec3};

use crate::error::StorageError;
use crate::store::RecordStore;

const FORMAT_VERSION: u8 = 1;
const RECORD_EXT: &str = "rec";
const ZSTD_LEVEL: i32 = 3;

#[derive(Serialize, Deserialize)]
struct RecordEnvelope {
    format_version: u8,
    id: RecordId,
    name: String,
    size_bytes: u64,
    last_modified: i64,
    color: Color,
    position: Vec3,
    orientation: Vec3,
    payload: Bytes,
}

impl RecordEnvelope {
    fn from_record(record: &DocumentRecord) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            id: record.id(),
            name: record.name().to_string(),
            size_bytes: record.size_bytes(),
            last_modified: record.last_modified(),
            color: record.color().clone(),
            position: record.position(),
            orientation: record.orientation(),
            payload: record.payload().clone(),
        }
    }

    fn into_record(self) -> DocumentRecord {
        DocumentRecord::restore(
            self.id,
            self.name,
            self.size_bytes,
            self.last_modified,
            self.payload,
            Placement {
                position: self.position,
                orientation: self.orientation,
                color: self.color,
            },
        )
    }
}

fn encode_record(record: &DocumentRecord) -> Result<Vec<u8>, StorageError> {
    let packed = rmp_serde::to_vec_named(&RecordEnvelope::from_record(record))?;
    let compressed = zstd::encode_all(packed.as_slice(), ZSTD_LEVEL)?;
    Ok(compressed)
}

fn decode_record(path: &Path, data: &[u8]) -> Result<DocumentRecord, StorageError> {
    let packed = zstd::decode_all(data).map_err(|e| StorageError::Corrupt {
        path: path.display().to_string(),
        reason: format!("zstd: {e}"),
    })?;
    let envelope: RecordEnvelope = rmp_serde::from_slice(&packed)?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(StorageError::Corrupt {
            path: path.display().to_string(),
            reason: format!("unsupported format version {}", envelope.format_version),
        });
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem != envelope.id.to_string() {
        return Err(StorageError::Corrupt {
            path: path.display().to_string(),
            reason: format!("file name does not match record id {}", envelope.id),
        });
    }
    Ok(envelope.into_record())
}

/// Record store backed by a directory of `.rec` files.
pub struct LocalRecordStore {
    dir: PathBuf,
}

impl LocalRecordStore {
    /// Open (and create if needed) the store under `data_dir/records`.
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let dir = data_dir.join("records");
        std::fs::create_dir_all(&dir)?;
        info!(path = %dir.display(), "record store initialized");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: RecordId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, RECORD_EXT))
    }

    async fn write_atomically(path: &Path, tmp: &Path, data: &[u8]) -> Result<(), StorageError> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn put(&self, record: &DocumentRecord) -> Result<(), StorageError> {
        let encoded = encode_record(record)?;
        let path = self.record_path(record.id());
        let tmp = path.with_extension(format!("{RECORD_EXT}.tmp"));

        if let Err(e) = Self::write_atomically(&path, &tmp, &encoded).await {
            // Best-effort cleanup; the final file is untouched.
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e);
        }

        debug!(
            id = %record.id(),
            name = %record.name(),
            bytes = encoded.len(),
            "record written"
        );
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<DocumentRecord>, StorageError> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == RECORD_EXT) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let data = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read record");
                    continue;
                }
            };
            match decode_record(&path, &data) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt record");
                }
            }
        }
        Ok(records)
    }

    async fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => {
                debug!(id = %id, "record removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
