//! Worker tuning knobs.

use std::time::Duration;

/// Default number of jobs pulled per iteration.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default wait after an empty poll.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_secs(2);

/// Default wait after a failed iteration.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidCount { var: &'static str, value: String },

    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
}

/// Polling parameters for the enrollment worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Upper bound on jobs dequeued per iteration.
    pub batch_size: usize,
    /// Wait between empty polls. Shutdown interrupts it.
    pub idle_backoff: Duration,
    /// Wait after an iteration fails before polling again.
    pub error_backoff: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

impl WorkerSettings {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    pub fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }

    /// Read settings from the environment.
    ///
    /// - `ENROLLMENT_WORKER_BATCH` (default: 20)
    /// - `ENROLLMENT_WORKER_IDLE_BACKOFF` seconds, fractional allowed (default: 2)
    /// - `ENROLLMENT_WORKER_ERROR_BACKOFF` seconds, fractional allowed (default: 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut settings = Self::default();
        if let Some(value) = var("ENROLLMENT_WORKER_BATCH") {
            settings.batch_size = parse_count("ENROLLMENT_WORKER_BATCH", value)?;
        }
        if let Some(value) = var("ENROLLMENT_WORKER_IDLE_BACKOFF") {
            settings.idle_backoff = parse_seconds("ENROLLMENT_WORKER_IDLE_BACKOFF", value)?;
        }
        if let Some(value) = var("ENROLLMENT_WORKER_ERROR_BACKOFF") {
            settings.error_backoff = parse_seconds("ENROLLMENT_WORKER_ERROR_BACKOFF", value)?;
        }
        Ok(settings)
    }
}

fn parse_count(var: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidCount { var, value }),
    }
}

fn parse_seconds(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or(ConfigError::InvalidDuration { var, value })
}
