//! Post store facade - the single writer interface over the configured
//! backend.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Post, PostDraft};
use crate::error::StoreError;
use crate::ports::{PostBackend, PostPage};

/// Neighbors of a post in display order.
#[derive(Debug, Clone, Default)]
pub struct AdjacentPosts {
    /// The older neighbor.
    pub prev: Option<Post>,
    /// The newer neighbor.
    pub next: Option<Post>,
}

/// Backend-selecting post store.
///
/// The backend is chosen once at process start from deployment
/// configuration and injected here; it is never swapped at runtime.
#[derive(Clone)]
pub struct PostStore {
    backend: Arc<dyn PostBackend>,
}

impl PostStore {
    pub fn new(backend: Arc<dyn PostBackend>) -> Self {
        Self { backend }
    }

    /// Every live post: pinned posts first, then newest-first.
    pub async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts = self.backend.list_all().await?;
        promote_pinned(&mut posts);
        Ok(posts)
    }

    /// One page of the listing. Pinned posts surface at the top of the
    /// first page only; backend ordering and later pages are untouched.
    pub async fn list_paginated(&self, page: u32, page_size: u32) -> Result<PostPage, StoreError> {
        let mut page = self.backend.paginate(page, page_size).await?;
        if page.page == 1 {
            promote_pinned(&mut page.posts);
        }
        Ok(page)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        self.backend.get_by_slug(slug).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        self.backend.get_by_id(id).await
    }

    /// Materialize a draft and persist it, returning the stored post.
    pub async fn create(&self, draft: PostDraft) -> Result<Post, StoreError> {
        let post = Post::from_draft(draft);
        self.backend.create(&post).await?;
        Ok(post)
    }

    /// Rewrite an existing post in place. `id`, `slug`, and `created_at`
    /// are immutable; callers pass the post with those fields untouched.
    pub async fn update(&self, post: &Post) -> Result<(), StoreError> {
        self.backend.update(post).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.backend.delete(id).await
    }

    pub async fn increment_view(&self, id: &str) -> Result<u64, StoreError> {
        self.backend.increment_view(id).await
    }

    /// Resolve a slug and bump the view counter of the post behind it.
    pub async fn increment_view_by_slug(&self, slug: &str) -> Result<u64, StoreError> {
        let post = self
            .backend
            .get_by_slug(slug)
            .await?
            .ok_or(StoreError::NotFound)?;
        self.backend.increment_view(&post.id).await
    }

    /// Flip a post's pinned flag, read-then-write. Last writer wins; there
    /// is no concurrent-toggle guarantee.
    pub async fn toggle_pin(&self, id: &str) -> Result<Post, StoreError> {
        let mut post = self
            .backend
            .get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound)?;
        post.pinned = !post.pinned;
        post.updated_at = Utc::now();
        self.backend.update(&post).await?;
        Ok(post)
    }

    /// Most-viewed posts among the ten most recent, up to `limit`.
    pub async fn popular(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
        let posts = self.backend.list_all().await?;
        let mut recent: Vec<Post> = posts
            .into_iter()
            .take(10)
            .filter(|p| p.view_count > 0)
            .collect();
        recent.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        recent.truncate(limit);
        Ok(recent)
    }

    /// The display-order neighbors of the post with the given slug. Both
    /// sides are `None` when the slug is unknown.
    pub async fn adjacent(&self, slug: &str) -> Result<AdjacentPosts, StoreError> {
        let posts = self.list_all().await?;
        let Some(idx) = posts.iter().position(|p| p.slug == slug) else {
            return Ok(AdjacentPosts::default());
        };

        Ok(AdjacentPosts {
            prev: posts.get(idx + 1).cloned(),
            next: if idx > 0 {
                posts.get(idx - 1).cloned()
            } else {
                None
            },
        })
    }
}

/// Stable partition: pinned posts first, chronological order preserved
/// within each group.
fn promote_pinned(posts: &mut [Post]) {
    posts.sort_by_key(|p| !p.pinned);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostDraft;

    fn post(slug: &str, pinned: bool) -> Post {
        let mut p = Post::from_draft(PostDraft {
            title: slug.to_string(),
            content: "c".into(),
            excerpt: "e".into(),
            slug: Some(slug.to_string()),
            ..Default::default()
        });
        p.pinned = pinned;
        p
    }

    #[test]
    fn promote_pinned_is_stable() {
        // newest-first input: [d, c-pinned, b, a-pinned]
        let mut posts = vec![
            post("d", false),
            post("c", true),
            post("b", false),
            post("a", true),
        ];
        promote_pinned(&mut posts);

        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["c", "a", "d", "b"]);
    }

    #[test]
    fn promote_pinned_without_pins_is_identity() {
        let mut posts = vec![post("b", false), post("a", false)];
        promote_pinned(&mut posts);

        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["b", "a"]);
    }
}
