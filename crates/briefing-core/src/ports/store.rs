use async_trait::async_trait;
use serde::Serialize;

use crate::domain::Post;
use crate::error::StoreError;

/// One page of a chronological listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Storage backend trait - abstraction over the physical post representation
/// (local JSON file, Redis indexed layout).
///
/// Backends own ordering: listings come back newest-first by `created_at`.
/// Pinning is a display concern and is applied above this trait.
#[async_trait]
pub trait PostBackend: Send + Sync {
    /// Every live post, newest first.
    async fn list_all(&self) -> Result<Vec<Post>, StoreError>;

    /// One page of the chronological listing. `page` and `page_size` are
    /// 1-based and clamped to a minimum of 1; a page past the end yields an
    /// empty page with `has_next = false`.
    async fn paginate(&self, page: u32, page_size: u32) -> Result<PostPage, StoreError>;

    /// Fetch a post by its opaque ID.
    async fn get_by_id(&self, id: &str) -> Result<Option<Post>, StoreError>;

    /// Resolve a slug and fetch the post it names. A dangling slug mapping
    /// yields `None`, never a partial result.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError>;

    /// Persist a new post. Retried creates with the same ID must not
    /// inflate the live count.
    async fn create(&self, post: &Post) -> Result<(), StoreError>;

    /// Rewrite the stored record of an existing post. Does not move the
    /// post in the chronological order and does not remap its slug.
    async fn update(&self, post: &Post) -> Result<(), StoreError>;

    /// Remove a post from every structure the backend maintains.
    /// Deleting an unknown ID is `Err(StoreError::NotFound)` and leaves the
    /// live count unchanged.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Atomically increment a post's view counter, returning the new value.
    async fn increment_view(&self, id: &str) -> Result<u64, StoreError>;
}
