pub mod error;
pub mod local;
pub mod memory;
pub mod queue;
pub mod store;

use serde::{Deserialize, Serialize};
use tracing::info;

use cosmos_core::config::{StorageBackendKind, StorageConfig};

pub use error::StorageError;
pub use local::LocalRecordStore;
pub use memory::MemoryRecordStore;
pub use queue::SerializedStore;
pub use store::RecordStore;

/// Overall statistics for a record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub record_count: usize,
    /// Sum of payload sizes in bytes.
    pub payload_bytes: u64,
}

/// Open the configured backend behind a serialized command queue.
///
/// Must be called from inside a tokio runtime.
pub fn open_store(config: &StorageConfig) -> Result<SerializedStore, StorageError> {
    let store = match config.backend {
        StorageBackendKind::Local => {
            SerializedStore::spawn(LocalRecordStore::open(&config.data_dir)?)
        }
        StorageBackendKind::Memory => {
            info!("record store: in-memory, nothing will be persisted");
            SerializedStore::spawn(MemoryRecordStore::new())
        }
    };
    Ok(store)
}

/// Count records and payload bytes.
pub async fn stats(store: &dyn RecordStore) -> Result<StoreStats, StorageError> {
    let records = store.get_all().await?;
    Ok(StoreStats {
        record_count: records.len(),
        payload_bytes: records.iter().map(|r| r.payload().len() as u64).sum(),
    })
}
