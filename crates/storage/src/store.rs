use std::sync::Arc;

use async_trait::async_trait;
use cosmos_core::{DocumentRecord, RecordId};

use crate::error::StorageError;

/// Durable key-value persistence for document records, keyed by id.
///
/// Every operation resolves to success or a typed failure. Callers that keep
/// an in-memory mirror must only update it after the store call succeeds.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Write a record (metadata and payload). Overwrites an existing entry
    /// with the same id.
    async fn put(&self, record: &DocumentRecord) -> Result<(), StorageError>;

    /// Every readable record, in no particular order. Entries that cannot be
    /// decoded are skipped rather than failing the whole read.
    async fn get_all(&self) -> Result<Vec<DocumentRecord>, StorageError>;

    /// Remove a record. Removing an absent id is not an error.
    async fn delete(&self, id: RecordId) -> Result<(), StorageError>;
}

/// Blanket implementation so `Arc<dyn RecordStore>` can be used directly.
#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn put(&self, record: &DocumentRecord) -> Result<(), StorageError> {
        (**self).put(record).await
    }

    async fn get_all(&self) -> Result<Vec<DocumentRecord>, StorageError> {
        (**self).get_all().await
    }

    async fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        (**self).delete(id).await
    }
}
