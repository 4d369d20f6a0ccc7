//! Legacy-blob to indexed-layout migration, and its inverse.
//!
//! The legacy representation is one JSON array of full posts under the
//! `posts` key. Forward migration indexes each record independently, sets
//! the global count to the number that succeeded, and renames the legacy
//! document to `posts:backup` so rollback stays possible. Rollback tears
//! down every indexed structure and restores the backup.
//!
//! Re-running a partially applied forward migration is safe: the count is
//! an explicit overwrite and already-indexed records are simply rewritten.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use thiserror::Error;

use briefing_core::StoreError;
use briefing_core::domain::Post;

use crate::codec;
use crate::store::{Keys, RedisBackend, unavailable};

/// Migration failures.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Forward migration found no legacy document (or an empty one). A soft
    /// precondition, not a crash.
    #[error("nothing to migrate")]
    NothingToMigrate,

    /// Rollback found no backup document.
    #[error("no backup available")]
    NoBackup,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-run totals, reported verbatim to the admin caller.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Where the store currently stands between the legacy and indexed
/// layouts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
    pub legacy_present: bool,
    pub backup_present: bool,
    /// Cardinality of the time index.
    pub indexed_posts: u64,
    /// Value of the global count key.
    pub recorded_count: u64,
}

/// Convert the legacy single-blob document into the indexed layout.
pub async fn migrate_to_indexed(store: &RedisBackend) -> Result<MigrationReport, MigrationError> {
    let mut conn = store.conn.clone();
    let keys = store.keys.clone();

    let raw: Option<String> = conn.get(keys.legacy()).await.map_err(unavailable)?;
    let legacy: Vec<Post> = match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StoreError::Serialization(e.to_string()))?,
        None => Vec::new(),
    };
    if legacy.is_empty() {
        return Err(MigrationError::NothingToMigrate);
    }

    tracing::info!(posts = legacy.len(), "starting migration to indexed layout");

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for post in &legacy {
        // Each record migrates independently; one failure does not block
        // the rest.
        match index_post(&mut conn, &keys, post).await {
            Ok(()) => {
                succeeded += 1;
                tracing::info!(id = %post.id, slug = %post.slug, "post indexed");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(id = %post.id, error = %e, "failed to index post");
            }
        }
    }

    // Explicit overwrite, not an increment: a re-run over a partially
    // indexed store must not double-count.
    conn.set::<_, _, ()>(keys.count(), succeeded as u64)
        .await
        .map_err(unavailable)?;

    // Keep the legacy document around for rollback.
    let _: () = conn
        .rename(keys.legacy(), keys.backup())
        .await
        .map_err(unavailable)?;

    tracing::info!(succeeded, failed, "migration finished, legacy document backed up");

    Ok(MigrationReport {
        attempted: legacy.len(),
        succeeded,
        failed,
    })
}

async fn index_post(
    conn: &mut ConnectionManager,
    keys: &Keys,
    post: &Post,
) -> Result<(), StoreError> {
    conn.zadd::<_, _, _, ()>(keys.sorted(), &post.id, post.created_at.timestamp_millis())
        .await
        .map_err(unavailable)?;
    conn.hset_multiple::<_, _, _, ()>(keys.data(&post.id), &codec::to_field_map(post))
        .await
        .map_err(unavailable)?;
    conn.set::<_, _, ()>(keys.slug(&post.slug), &post.id)
        .await
        .map_err(unavailable)?;
    if post.view_count > 0 {
        conn.set::<_, _, ()>(keys.views(&post.id), post.view_count)
            .await
            .map_err(unavailable)?;
    }
    Ok(())
}

/// Tear down the indexed layout and restore the backed-up legacy document.
pub async fn rollback_to_legacy(store: &RedisBackend) -> Result<(), MigrationError> {
    let mut conn = store.conn.clone();
    let keys = store.keys.clone();

    let backup_present: bool = conn.exists(keys.backup()).await.map_err(unavailable)?;
    if !backup_present {
        return Err(MigrationError::NoBackup);
    }

    let ids: Vec<String> = conn
        .zrange(keys.sorted(), 0, -1)
        .await
        .map_err(unavailable)?;

    for id in &ids {
        let slug: Option<String> = conn
            .hget(keys.data(id), codec::FIELD_SLUG)
            .await
            .map_err(unavailable)?;
        conn.del::<_, ()>(keys.data(id)).await.map_err(unavailable)?;
        conn.del::<_, ()>(keys.views(id))
            .await
            .map_err(unavailable)?;
        if let Some(slug) = slug {
            conn.del::<_, ()>(keys.slug(&slug))
                .await
                .map_err(unavailable)?;
        }
    }

    conn.del::<_, ()>(keys.sorted()).await.map_err(unavailable)?;
    conn.del::<_, ()>(keys.count()).await.map_err(unavailable)?;
    let _: () = conn
        .rename(keys.backup(), keys.legacy())
        .await
        .map_err(unavailable)?;

    tracing::info!(removed = ids.len(), "rolled back to legacy layout");
    Ok(())
}

/// Inspect which layout is live, for the operator CLI.
pub async fn index_status(store: &RedisBackend) -> Result<IndexStatus, StoreError> {
    let mut conn = store.conn.clone();
    let keys = store.keys.clone();

    let legacy_present: bool = conn.exists(keys.legacy()).await.map_err(unavailable)?;
    let backup_present: bool = conn.exists(keys.backup()).await.map_err(unavailable)?;
    let indexed_posts: u64 = conn.zcard(keys.sorted()).await.map_err(unavailable)?;
    let recorded_count: u64 = conn
        .get::<_, Option<u64>>(keys.count())
        .await
        .map_err(unavailable)?
        .unwrap_or(0);

    Ok(IndexStatus {
        legacy_present,
        backup_present,
        indexed_posts,
        recorded_count,
    })
}
