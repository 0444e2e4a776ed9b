//! FIFO job queue used to hand enrollments to the background worker.
//!
//! Backends:
//! - Redis list in production (`LPUSH` on enqueue, `RPOP` on dequeue)
//! - In-memory deque for tests and local runs
//!
//! Reads are destructive: once `dequeue_batch` returns an item it is gone
//! from the queue, whatever happens to it afterwards.

mod config;
mod memory;
mod redis_queue;

use std::future::Future;

use serde::Serialize;

pub use config::{QueueBackendConfig, QueueConfig};
pub use memory::InMemoryQueue;
pub use redis_queue::RedisQueue;

/// Default Redis endpoint.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Default name of the Redis list holding enrollment jobs.
pub const DEFAULT_QUEUE_KEY: &str = "enrollment_queue";

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("invalid queue config: {0}")]
    InvalidConfig(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("timed out connecting to {url} after {timeout_ms}ms")]
    ConnectTimeout { url: String, timeout_ms: u64 },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A FIFO queue of JSON payloads.
///
/// `enqueue` appends to the tail, `dequeue_batch` removes from the head, so
/// items come back oldest first. There is no acknowledgement: a popped item
/// is never redelivered.
pub trait QueueBackend: Send + Sync + 'static {
    /// Serialize `payload` and append it to the tail of the queue.
    fn enqueue<T>(&self, payload: &T) -> impl Future<Output = Result<(), QueueError>> + Send
    where
        T: Serialize + Sync + ?Sized;

    /// Remove and return up to `max_items` payloads from the head of the queue.
    ///
    /// Returns an empty vector when nothing is queued.
    fn dequeue_batch(
        &self,
        max_items: usize,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, QueueError>> + Send;

    /// Establish the broker connection now instead of on first use.
    fn connect(&self) -> impl Future<Output = Result<(), QueueError>> + Send {
        async { Ok(()) }
    }

    /// Number of queued items. Observability only.
    fn size(&self) -> impl Future<Output = Result<u64, QueueError>> + Send;

    /// Release any broker connection held by the backend.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Redis,
    Memory,
}

impl QueueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueKind::Redis => "redis",
            QueueKind::Memory => "memory",
        }
    }
}

/// Queue backend selected at runtime from [`QueueConfig`].
pub enum QueueClient {
    Redis(RedisQueue),
    Memory(InMemoryQueue),
}

impl QueueClient {
    /// Build the configured backend. Redis connects lazily; call
    /// [`QueueBackend::connect`] to fail fast at startup.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        match config.backend {
            QueueBackendConfig::Redis {
                url,
                connect_timeout,
            } => Ok(QueueClient::Redis(
                RedisQueue::new(&url, config.key)?.with_connect_timeout(connect_timeout),
            )),
            QueueBackendConfig::Memory => Ok(QueueClient::Memory(InMemoryQueue::new())),
        }
    }

    pub fn from_env() -> Result<Self, QueueError> {
        Self::new(QueueConfig::from_env()?)
    }

    pub fn kind(&self) -> QueueKind {
        match self {
            QueueClient::Redis(_) => QueueKind::Redis,
            QueueClient::Memory(_) => QueueKind::Memory,
        }
    }
}

impl QueueBackend for QueueClient {
    async fn enqueue<T>(&self, payload: &T) -> Result<(), QueueError>
    where
        T: Serialize + Sync + ?Sized,
    {
        match self {
            QueueClient::Redis(queue) => queue.enqueue(payload).await,
            QueueClient::Memory(queue) => queue.enqueue(payload).await,
        }
    }

    async fn dequeue_batch(&self, max_items: usize) -> Result<Vec<serde_json::Value>, QueueError> {
        match self {
            QueueClient::Redis(queue) => queue.dequeue_batch(max_items).await,
            QueueClient::Memory(queue) => queue.dequeue_batch(max_items).await,
        }
    }

    async fn connect(&self) -> Result<(), QueueError> {
        match self {
            QueueClient::Redis(queue) => queue.connect().await,
            QueueClient::Memory(queue) => queue.connect().await,
        }
    }

    async fn size(&self) -> Result<u64, QueueError> {
        match self {
            QueueClient::Redis(queue) => queue.size().await,
            QueueClient::Memory(queue) => queue.size().await,
        }
    }

    async fn close(&self) {
        match self {
            QueueClient::Redis(queue) => queue.close().await,
            QueueClient::Memory(queue) => queue.close().await,
        }
    }
}

/// Parse a raw queue entry, dropping entries that are not JSON.
fn decode_entry(raw: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed queue entry");
            None
        }
    }
}
