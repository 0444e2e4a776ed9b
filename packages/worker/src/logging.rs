//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl LogFormat {
    fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        }
    }
}

/// Filter directives: `RUST_LOG`, else `LOG_LEVEL`, else `info`.
fn directives<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["RUST_LOG", "LOG_LEVEL"]
        .into_iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let lookup = |name: &str| std::env::var(name).ok();
    let filter = EnvFilter::try_new(directives(lookup))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    match LogFormat::from_value(lookup("LOG_FORMAT").as_deref()) {
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_timer(tracing_subscriber::fmt::time::SystemTime)
                .with_target(false)
                .try_init();
        }
        LogFormat::Plain => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        }
    }
}
