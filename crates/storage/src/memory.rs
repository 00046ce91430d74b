use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cosmos_core::{DocumentRecord, RecordId};

use crate::error::StorageError;
use crate::store::RecordStore;

/// Process-lifetime store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<RecordId, DocumentRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &DocumentRecord) -> Result<(), StorageError> {
        let mut map = self.records.write().await;
        map.insert(record.id(), record.clone());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<DocumentRecord>, StorageError> {
        let map = self.records.read().await;
        let mut records: Vec<DocumentRecord> = map.values().cloned().collect();
        records.sort_by_key(|r| r.id());
        Ok(records)
    }

    async fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        let mut map = self.records.write().await;
        map.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use cosmos_core::{Color, Placement};

    fn make_record(name: &str) -> DocumentRecord {
        DocumentRecord::new(
            name,
            4,
            0,
            Bytes::from_static(b"%PDF"),
            Placement {
                position: [0.0, 0.0, 0.0],
                orientation: [0.0, 0.0, 0.0],
                color: Color::white(),
            },
        )
    }

    #[tokio::test]
    async fn crud_cycle() {
        let store = MemoryRecordStore::new();
        assert!(store.is_empty().await);

        let a = make_record("a.pdf");
        let b = make_record("b.pdf");
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();
        assert_eq!(store.len().await, 2);

        store.delete(a.id()).await.unwrap();
        store.delete(a.id()).await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), vec![b]);
    }
}
