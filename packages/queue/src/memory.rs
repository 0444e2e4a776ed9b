//! In-process queue backend.

use std::collections::VecDeque;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{QueueBackend, QueueError, decode_entry};

/// Queue held in process memory, with the same FIFO and destructive-read
/// semantics as the Redis backend. Entries are stored serialized so that
/// payload decoding behaves the same way.
#[derive(Default)]
pub struct InMemoryQueue {
    entries: Mutex<VecDeque<String>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-serialized entry, bypassing JSON encoding.
    pub async fn push_raw(&self, raw: impl Into<String>) {
        self.entries.lock().await.push_back(raw.into());
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl QueueBackend for InMemoryQueue {
    async fn enqueue<T>(&self, payload: &T) -> Result<(), QueueError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = serde_json::to_string(payload)?;
        self.entries.lock().await.push_back(raw);
        Ok(())
    }

    async fn dequeue_batch(&self, max_items: usize) -> Result<Vec<serde_json::Value>, QueueError> {
        let mut entries = self.entries.lock().await;
        let take = max_items.min(entries.len());
        Ok(entries
            .drain(..take)
            .filter_map(|raw| decode_entry(&raw))
            .collect())
    }

    async fn size(&self) -> Result<u64, QueueError> {
        Ok(self.entries.lock().await.len() as u64)
    }
}
