//! Redis list backend.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{QueueBackend, QueueError, decode_entry};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Queue backed by a Redis list.
///
/// The client owns a single connection handle, created on first use (or by
/// [`QueueBackend::connect`]) and reused across calls. If the handle has been
/// released it is re-established on demand. Retrying failed commands is
/// left to the caller.
pub struct RedisQueue {
    client: redis::Client,
    url: String,
    key: String,
    connect_timeout: Duration,
    conn: Mutex<Option<ConnectionManager>>,
}

impl RedisQueue {
    pub fn new(url: &str, key: impl Into<String>) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            url: url.to_string(),
            key: key.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            conn: Mutex::new(None),
        })
    }

    /// Bound the time spent establishing the connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    async fn connection(&self) -> Result<ConnectionManager, QueueError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        tracing::info!(key = %self.key, "Connecting to Redis queue");
        let conn = tokio::time::timeout(
            self.connect_timeout,
            ConnectionManager::new(self.client.clone()),
        )
        .await
        .map_err(|_| QueueError::ConnectTimeout {
            url: self.url.clone(),
            timeout_ms: self.connect_timeout.as_millis() as u64,
        })??;

        *guard = Some(conn.clone());
        Ok(conn)
    }
}

impl QueueBackend for RedisQueue {
    async fn connect(&self) -> Result<(), QueueError> {
        self.connection().await.map(|_| ())
    }

    async fn enqueue<T>(&self, payload: &T) -> Result<(), QueueError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = serde_json::to_string(payload)?;
        let mut conn = self.connection().await?;
        let _: i64 = conn.lpush(&self.key, raw).await?;
        Ok(())
    }

    async fn dequeue_batch(&self, max_items: usize) -> Result<Vec<serde_json::Value>, QueueError> {
        if max_items == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connection().await?;
        let mut items = Vec::with_capacity(max_items.min(64));

        for popped in 0..max_items {
            let entry: Option<String> = match conn.rpop(&self.key, None).await {
                Ok(entry) => entry,
                // Entries already popped are gone from Redis; hand them back
                // instead of losing them with the error.
                Err(e) if popped > 0 => {
                    tracing::warn!(error = %e, popped, "Redis pop failed mid-batch");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let Some(raw) = entry else {
                break;
            };
            if let Some(value) = decode_entry(&raw) {
                items.push(value);
            }
        }

        Ok(items)
    }

    async fn size(&self) -> Result<u64, QueueError> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.llen(&self.key).await?;
        Ok(len)
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            tracing::info!(key = %self.key, "Closed Redis queue connection");
        }
    }
}
