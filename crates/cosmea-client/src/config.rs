//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Which [`DocumentStore`](cosmea_store::DocumentStore) backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Embedded SQLite document database.
    Sqlite,
    /// Process-local store; nothing survives a restart.
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Env: `COSMEA_STORE` (`sqlite` | `memory`)
    /// Default: `sqlite`
    pub store: StoreBackend,

    /// Env: `COSMEA_DB_PATH`
    /// Default: `cosmea.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Env: `COSMEA_SESSION_PATH`
    /// Default: `session.json` in the platform config directory.
    pub session_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Sqlite,
            db_path: None,
            session_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("COSMEA_STORE") {
            match StoreBackend::parse(&value) {
                Some(backend) => config.store = backend,
                None => tracing::warn!(value = %value, "Invalid COSMEA_STORE, using default"),
            }
        }

        if let Some(path) = lookup("COSMEA_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("COSMEA_SESSION_PATH").filter(|p| !p.is_empty()) {
            config.session_path = Some(PathBuf::from(path));
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    /// Explicit session path, or the platform default when one exists.
    pub fn resolved_session_path(&self) -> Option<PathBuf> {
        self.session_path.clone().or_else(|| {
            ProjectDirs::from("com", "cosmea", "cosmea")
                .map(|dirs| dirs.config_dir().join("session.json"))
        })
    }
}
