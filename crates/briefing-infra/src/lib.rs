//! # Briefing Infrastructure
//!
//! Concrete implementations of the storage port defined in `briefing-core`:
//! the record codec, the local file backend, the Redis indexed backend, and
//! the legacy-to-indexed migration tooling.
//!
//! ## Feature Flags
//!
//! - `redis` (default) - Redis indexed backend and migration/rollback

pub mod codec;
pub mod config;
pub mod store;

#[cfg(feature = "redis")]
pub mod migration;

pub use config::{BackendKind, RedisConfig, StorageConfig, connect_backend};
pub use store::LocalFileBackend;

#[cfg(feature = "redis")]
pub use store::RedisBackend;

#[cfg(feature = "redis")]
pub use migration::{
    IndexStatus, MigrationError, MigrationReport, index_status, migrate_to_indexed,
    rollback_to_legacy,
};
