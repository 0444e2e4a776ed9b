//! Queue configuration.

use std::time::Duration;

use crate::{DEFAULT_QUEUE_KEY, DEFAULT_REDIS_URL, QueueError};

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueBackendConfig {
    Redis {
        url: String,
        connect_timeout: Duration,
    },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub backend: QueueBackendConfig,
    /// Name of the queue (the Redis list key).
    pub key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::redis(DEFAULT_REDIS_URL)
    }
}

impl QueueConfig {
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: QueueBackendConfig::Redis {
                url: url.into(),
                connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            },
            key: DEFAULT_QUEUE_KEY.to_string(),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: QueueBackendConfig::Memory,
            key: DEFAULT_QUEUE_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Build a config from environment variables.
    ///
    /// - `QUEUE_BACKEND`: `redis` (default) or `memory`
    /// - `REDIS_URL` (default: `redis://localhost:6379/0`)
    /// - `ENROLLMENT_QUEUE_KEY` (default: `enrollment_queue`)
    /// - `REDIS_CONNECT_TIMEOUT_MS` (default: 5000)
    pub fn from_env() -> Result<Self, QueueError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QueueError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).and_then(non_empty);

        let key = var("ENROLLMENT_QUEUE_KEY").unwrap_or_else(|| DEFAULT_QUEUE_KEY.to_string());

        let backend = match var("QUEUE_BACKEND").as_deref() {
            None | Some("redis") => {
                let url = var("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
                let timeout_ms = match var("REDIS_CONNECT_TIMEOUT_MS") {
                    Some(raw) => match raw.parse::<u64>() {
                        Ok(ms) if ms > 0 => ms,
                        _ => {
                            return Err(QueueError::InvalidConfig(format!(
                                "invalid REDIS_CONNECT_TIMEOUT_MS={raw} (expected positive integer)"
                            )));
                        }
                    },
                    None => DEFAULT_CONNECT_TIMEOUT_MS,
                };
                QueueBackendConfig::Redis {
                    url,
                    connect_timeout: Duration::from_millis(timeout_ms),
                }
            }
            Some("memory") | Some("mem") => QueueBackendConfig::Memory,
            Some(other) => {
                return Err(QueueError::InvalidConfig(format!(
                    "unsupported QUEUE_BACKEND={other} (expected redis|memory)"
                )));
            }
        };

        Ok(Self { backend, key })
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
