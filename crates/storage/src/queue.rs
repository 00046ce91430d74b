//! Single ordered command queue in front of a record store.
//!
//! The inner store is owned by one background task that executes commands
//! strictly one after another, so writes from overlapping ingestion batches
//! never interleave inside the store and a `get_all` observes every command
//! queued before it.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use cosmos_core::{DocumentRecord, RecordId};

use crate::error::StorageError;
use crate::store::RecordStore;

const QUEUE_DEPTH: usize = 64;

enum StoreCommand {
    Put {
        record: DocumentRecord,
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
    GetAll {
        reply: oneshot::Sender<Result<Vec<DocumentRecord>, StorageError>>,
    },
    Delete {
        id: RecordId,
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
}

/// A [`RecordStore`] that serializes every operation through one worker.
///
/// Must be created inside a tokio runtime. Dropping the handle closes the
/// queue and lets the worker finish the commands already accepted.
pub struct SerializedStore {
    tx: mpsc::Sender<StoreCommand>,
    _worker: tokio::task::JoinHandle<()>,
}

impl SerializedStore {
    pub fn spawn<S: RecordStore + 'static>(inner: S) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = tokio::spawn(Self::run(inner, rx));
        Self {
            tx,
            _worker: worker,
        }
    }

    async fn run<S: RecordStore>(inner: S, mut rx: mpsc::Receiver<StoreCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                StoreCommand::Put { record, reply } => {
                    let result = inner.put(&record).await;
                    reply.send(result).ok();
                }
                StoreCommand::GetAll { reply } => {
                    let result = inner.get_all().await;
                    reply.send(result).ok();
                }
                StoreCommand::Delete { id, reply } => {
                    let result = inner.delete(id).await;
                    reply.send(result).ok();
                }
            }
        }
        debug!("store queue drained");
    }

    async fn submit<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StorageError>>) -> StoreCommand,
    ) -> Result<T, StorageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| StorageError::QueueClosed)?;
        rx.await.map_err(|_| StorageError::QueueClosed)?
    }
}

#[async_trait]
impl RecordStore for SerializedStore {
    async fn put(&self, record: &DocumentRecord) -> Result<(), StorageError> {
        let record = record.clone();
        self.submit(|reply| StoreCommand::Put { record, reply }).await
    }

    async fn get_all(&self) -> Result<Vec<DocumentRecord>, StorageError> {
        self.submit(|reply| StoreCommand::GetAll { reply }).await
    }

    async fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        self.submit(|reply| StoreCommand::Delete { id, reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use cosmos_core::{Color, Placement};

    use crate::memory::MemoryRecordStore;

    /// Wraps a store and records the peak number of concurrent operations.
    struct OverlapProbe {
        inner: MemoryRecordStore,
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RecordStore for OverlapProbe {
        async fn put(&self, record: &DocumentRecord) -> Result<(), StorageError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            let result = self.inner.put(record).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn get_all(&self) -> Result<Vec<DocumentRecord>, StorageError> {
            self.inner.get_all().await
        }

        async fn delete(&self, id: RecordId) -> Result<(), StorageError> {
            self.inner.delete(id).await
        }
    }

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
    async fn overlapping_batches_never_overlap_in_the_store() {
        let peak = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(SerializedStore::spawn(OverlapProbe {
            inner: MemoryRecordStore::new(),
            in_flight: AtomicUsize::new(0),
            peak: Arc::clone(&peak),
        }));

        let batch = |prefix: &'static str, store: Arc<SerializedStore>| async move {
            for i in 0..5 {
                store.put(&make_record(&format!("{prefix}-{i}.pdf"))).await.unwrap();
            }
        };
        tokio::join!(batch("a", Arc::clone(&store)), batch("b", Arc::clone(&store)));

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_all().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn delete_after_put_is_applied_in_order() {
        let store = SerializedStore::spawn(MemoryRecordStore::new());
        let record = make_record("a.pdf");
        store.put(&record).await.unwrap();
        store.delete(record.id()).await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
