//! Database connection management.

use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use thiserror::Error;

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Connection endpoint: "mem://" or a remote "ws://host:port"
    pub endpoint: String,
    /// Namespace to use
    pub namespace: String,
    /// Database name to use
    pub database: String,
    /// Optional root credentials for authentication
    pub credentials: Option<(String, String)>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "enrollments".to_string(),
            database: "main".to_string(),
            credentials: None,
        }
    }
}

impl DbConfig {
    /// Create a config for in-memory testing.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set root credentials for authentication.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Build a config from environment variables.
    ///
    /// - `DATABASE_URL` (default: `mem://`)
    /// - `DATABASE_NS` (default: `enrollments`)
    /// - `DATABASE_DB` (default: `main`)
    /// - `DATABASE_USER` / `DATABASE_PASS` (optional, both required to sign in)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(endpoint) = var("DATABASE_URL") {
            config.endpoint = endpoint;
        }
        if let Some(namespace) = var("DATABASE_NS") {
            config.namespace = namespace;
        }
        if let Some(database) = var("DATABASE_DB") {
            config.database = database;
        }
        if let (Some(user), Some(pass)) = (var("DATABASE_USER"), var("DATABASE_PASS")) {
            config = config.with_credentials(user, pass);
        }
        config
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(#[from] surrealdb::Error),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Handle to a connected database.
///
/// Cheap to clone; all clones share the same underlying connection.
#[derive(Clone)]
pub struct Database {
    inner: Surreal<Any>,
}

impl Database {
    /// Connect and select the configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        tracing::info!("Connecting to database: {}", config.endpoint);

        let db = connect(config.endpoint.as_str()).await?;

        // Authenticate if credentials provided
        if let Some((username, password)) = &config.credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(&config.namespace).use_db(&config.database).await?;

        tracing::info!(
            "Connected to database: {}/{}",
            config.namespace,
            config.database
        );

        Ok(Self { inner: db })
    }

    /// The underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.inner
    }

    /// Round-trip a trivial query to check the connection.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.inner.query("RETURN true").await?.check()?;
        Ok(())
    }
}
