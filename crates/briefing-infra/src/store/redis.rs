//! Redis indexed backend.
//!
//! Five coupled structures per key prefix (default `posts`):
//!
//! - `posts:sorted` - ZSET, score = creation time in epoch milliseconds,
//!   member = post id
//! - `posts:data:<id>` - HASH, record field map per [`crate::codec`]
//! - `posts:slug:<slug>` - STRING, post id
//! - `posts:views:<id>` - STRING, view counter
//! - `posts:count` - STRING, global live count
//!
//! Multi-step writes are ordered best-effort sequences, not transactions:
//! the store offers no cross-key atomicity, and a failure mid-sequence can
//! leave the structures inconsistent. Repair is the migration tooling's
//! job, never automatic. The only single-key atomicity relied on is INCR
//! for view counters and the EXISTS-guarded count increment in `create`.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use briefing_core::StoreError;
use briefing_core::domain::Post;
use briefing_core::ports::{PostBackend, PostPage};

use crate::codec;
use crate::config::RedisConfig;

/// Key layout for one post namespace.
#[derive(Debug, Clone)]
pub(crate) struct Keys {
    prefix: String,
}

impl Keys {
    pub(crate) fn new(prefix: String) -> Self {
        Self { prefix }
    }

    pub(crate) fn sorted(&self) -> String {
        format!("{}:sorted", self.prefix)
    }

    pub(crate) fn data(&self, id: &str) -> String {
        format!("{}:data:{}", self.prefix, id)
    }

    pub(crate) fn slug(&self, slug: &str) -> String {
        format!("{}:slug:{}", self.prefix, slug)
    }

    pub(crate) fn views(&self, id: &str) -> String {
        format!("{}:views:{}", self.prefix, id)
    }

    pub(crate) fn count(&self) -> String {
        format!("{}:count", self.prefix)
    }

    /// The pre-migration single-blob document.
    pub(crate) fn legacy(&self) -> String {
        self.prefix.clone()
    }

    pub(crate) fn backup(&self) -> String {
        format!("{}:backup", self.prefix)
    }
}

pub(crate) fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Redis-backed post store.
///
/// Uses a connection manager for automatic reconnection and pooling.
pub struct RedisBackend {
    pub(crate) conn: ConnectionManager,
    pub(crate) keys: Keys,
}

impl RedisBackend {
    pub async fn connect(config: RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url.as_str()).map_err(unavailable)?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| StoreError::Unavailable("connection timed out".to_string()))?
            .map_err(unavailable)?;

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "Connected to Redis post store");

        Ok(Self {
            conn,
            keys: Keys::new(config.key_prefix),
        })
    }

    /// Fetch one record and overlay its view counter. An empty hash is a
    /// miss: the record either never existed or is partial-failure residue.
    async fn fetch_post(
        mut conn: ConnectionManager,
        keys: Keys,
        id: String,
    ) -> Result<Option<Post>, StoreError> {
        let fields: HashMap<String, String> =
            conn.hgetall(keys.data(&id)).await.map_err(unavailable)?;
        if fields.is_empty() {
            return Ok(None);
        }

        let mut post = codec::from_field_map(&fields)?;
        let views: Option<u64> = conn.get(keys.views(&id)).await.map_err(unavailable)?;
        post.view_count = views.unwrap_or(0);
        Ok(Some(post))
    }

    /// Fetch records and view counters for a window of ids in parallel,
    /// skipping ids whose record hash is missing.
    async fn fetch_many(&self, ids: Vec<String>) -> Result<Vec<Post>, StoreError> {
        let fetches = ids
            .iter()
            .map(|id| Self::fetch_post(self.conn.clone(), self.keys.clone(), id.clone()));

        let mut posts = Vec::with_capacity(ids.len());
        for (id, fetched) in ids.iter().zip(join_all(fetches).await) {
            match fetched? {
                Some(post) => posts.push(post),
                None => {
                    tracing::warn!(id = %id, "time index entry has no record, skipping")
                }
            }
        }
        Ok(posts)
    }
}

#[async_trait]
impl PostBackend for RedisBackend {
    async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn
            .zrevrange(self.keys.sorted(), 0, -1)
            .await
            .map_err(unavailable)?;
        self.fetch_many(ids).await
    }

    async fn paginate(&self, page: u32, page_size: u32) -> Result<PostPage, StoreError> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut conn = self.conn.clone();
        let total: u64 = conn
            .get::<_, Option<u64>>(self.keys.count())
            .await
            .map_err(unavailable)?
            .unwrap_or(0);

        let start = (page as isize - 1) * page_size as isize;
        let stop = page as isize * page_size as isize - 1;
        let ids: Vec<String> = conn
            .zrevrange(self.keys.sorted(), start, stop)
            .await
            .map_err(unavailable)?;

        let posts = self.fetch_many(ids).await?;

        Ok(PostPage {
            posts,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size as u64) as u32,
            has_next: (page as u64) * (page_size as u64) < total,
            has_prev: page > 1 && total > 0,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        Self::fetch_post(self.conn.clone(), self.keys.clone(), id.to_string()).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn
            .get(self.keys.slug(slug))
            .await
            .map_err(unavailable)?;

        match id {
            Some(id) => Self::fetch_post(self.conn.clone(), self.keys.clone(), id).await,
            None => Ok(None),
        }
    }

    async fn create(&self, post: &Post) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let data_key = self.keys.data(&post.id);

        // Dedicated existence check before any write: a retried create must
        // not increment the live count a second time.
        let existed: bool = conn.exists(&data_key).await.map_err(unavailable)?;

        conn.zadd::<_, _, _, ()>(
            self.keys.sorted(),
            &post.id,
            post.created_at.timestamp_millis(),
        )
        .await
        .map_err(unavailable)?;
        conn.hset_multiple::<_, _, _, ()>(&data_key, &codec::to_field_map(post))
            .await
            .map_err(unavailable)?;
        conn.set::<_, _, ()>(self.keys.slug(&post.slug), &post.id)
            .await
            .map_err(unavailable)?;

        if !existed {
            conn.incr::<_, _, ()>(self.keys.count(), 1)
                .await
                .map_err(unavailable)?;
        }

        tracing::debug!(id = %post.id, slug = %post.slug, "post created");
        Ok(())
    }

    async fn update(&self, post: &Post) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let data_key = self.keys.data(&post.id);

        let existed: bool = conn.exists(&data_key).await.map_err(unavailable)?;
        if !existed {
            return Err(StoreError::NotFound);
        }

        // Record fields only: the time-index score and the slug mapping
        // never move on update.
        conn.hset_multiple::<_, _, _, ()>(&data_key, &codec::to_field_map(post))
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let data_key = self.keys.data(id);

        let existed: bool = conn.exists(&data_key).await.map_err(unavailable)?;
        if !existed {
            return Err(StoreError::NotFound);
        }

        let slug: Option<String> = conn
            .hget(&data_key, codec::FIELD_SLUG)
            .await
            .map_err(unavailable)?;

        conn.zrem::<_, _, ()>(self.keys.sorted(), id)
            .await
            .map_err(unavailable)?;
        conn.del::<_, ()>(&data_key).await.map_err(unavailable)?;
        if let Some(slug) = slug {
            conn.del::<_, ()>(self.keys.slug(&slug))
                .await
                .map_err(unavailable)?;
        }
        conn.del::<_, ()>(self.keys.views(id))
            .await
            .map_err(unavailable)?;
        conn.decr::<_, _, ()>(self.keys.count(), 1)
            .await
            .map_err(unavailable)?;

        tracing::debug!(id = %id, "post deleted");
        Ok(())
    }

    async fn increment_view(&self, id: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let value: u64 = conn
            .incr(self.keys.views(id), 1)
            .await
            .map_err(unavailable)?;
        Ok(value)
    }
}
