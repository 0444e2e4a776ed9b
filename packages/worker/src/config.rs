//! Process configuration gathered from the environment.

use actors::{ConfigError, WorkerSettings};
use db::DbConfig;
use queue::{QueueConfig, QueueError};

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Worker(#[from] ConfigError),
}

/// Everything the worker process needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub db: DbConfig,
    pub worker: WorkerSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            queue: QueueConfig::from_lookup(&lookup)?,
            db: DbConfig::from_lookup(&lookup),
            worker: WorkerSettings::from_lookup(&lookup)?,
        })
    }
}
