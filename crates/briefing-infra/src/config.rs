//! Storage configuration loaded from environment variables, and the
//! one-shot backend wiring derived from it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use briefing_core::StoreError;
use briefing_core::ports::PostBackend;

use crate::store::LocalFileBackend;

#[cfg(feature = "redis")]
use crate::store::RedisBackend;

/// Which physical backend holds the posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Single-process JSON document on the local filesystem.
    Local,
    /// Remote Redis store with the indexed layout.
    Redis,
}

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix shared by every post key (`<prefix>:sorted`, `<prefix>:data:<id>`, ...)
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "posts".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("POSTS_KEY_PREFIX").unwrap_or_else(|_| "posts".to_string()),
        }
    }
}

/// Deployment-level storage configuration. Read once at process start; the
/// selected backend is never swapped at runtime.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Path of the local posts document (local backend only).
    pub posts_file: PathBuf,
    pub redis: RedisConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            posts_file: PathBuf::from("data/posts.json"),
            redis: RedisConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// `STORAGE_BACKEND=redis` selects the remote store; anything else (or
    /// nothing) selects the local file. `DATA_DIR` relocates the local
    /// document.
    pub fn from_env() -> Self {
        let backend = match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("redis") | Ok("remote") => BackendKind::Redis,
            _ => BackendKind::Local,
        };

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());

        Self {
            backend,
            posts_file: PathBuf::from(data_dir).join("posts.json"),
            redis: RedisConfig::from_env(),
        }
    }
}

/// Build the configured backend. Called once at startup; the result is
/// injected into [`briefing_core::PostStore`].
pub async fn connect_backend(config: &StorageConfig) -> Result<Arc<dyn PostBackend>, StoreError> {
    match config.backend {
        BackendKind::Local => {
            tracing::info!(path = %config.posts_file.display(), "Using local file post store");
            Ok(Arc::new(LocalFileBackend::new(config.posts_file.clone())))
        }
        #[cfg(feature = "redis")]
        BackendKind::Redis => {
            let backend = RedisBackend::connect(config.redis.clone()).await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "redis"))]
        BackendKind::Redis => Err(StoreError::Unavailable(
            "built without redis support".to_string(),
        )),
    }
}
