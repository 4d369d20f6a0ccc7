//! Local file backend - a single JSON document for single-process
//! operation.
//!
//! The document is `{ "posts": [ <Post>, ... ] }`; array order is
//! insignificant and listings re-sort by `created_at` on read. Every write
//! is a whole-document overwrite. There is no concurrency control; this
//! backend is single-process only.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use briefing_core::StoreError;
use briefing_core::domain::Post;
use briefing_core::ports::{PostBackend, PostPage};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PostsDocument {
    #[serde(default)]
    posts: Vec<Post>,
}

/// File-backed post store.
pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the whole document. An absent file is an empty store, not an
    /// error - that is the expected first-run state.
    async fn load(&self) -> Result<Vec<Post>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let document: PostsDocument = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut posts = document.posts;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn save(&self, posts: Vec<Post>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let raw = serde_json::to_vec_pretty(&PostsDocument { posts })
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl PostBackend for LocalFileBackend {
    async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        self.load().await
    }

    async fn paginate(&self, page: u32, page_size: u32) -> Result<PostPage, StoreError> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let posts = self.load().await?;
        let total = posts.len() as u64;
        let start = (page as usize - 1) * page_size as usize;

        let window: Vec<Post> = posts
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Ok(PostPage {
            posts: window,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size as u64) as u32,
            has_next: (page as u64) * (page_size as u64) < total,
            has_prev: page > 1 && total > 0,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.load().await?.into_iter().find(|p| p.id == id))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.load().await?.into_iter().find(|p| p.slug == slug))
    }

    async fn create(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.load().await?;
        // A retried create replaces the existing record instead of
        // duplicating it.
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(existing) => *existing = post.clone(),
            None => posts.push(post.clone()),
        }
        self.save(posts).await
    }

    async fn update(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.load().await?;
        let existing = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(StoreError::NotFound)?;
        *existing = post.clone();
        self.save(posts).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut posts = self.load().await?;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(StoreError::NotFound);
        }
        self.save(posts).await
    }

    async fn increment_view(&self, id: &str) -> Result<u64, StoreError> {
        let mut posts = self.load().await?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        post.view_count += 1;
        let value = post.view_count;
        self.save(posts).await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_core::domain::PostDraft;
    use chrono::Duration;

    fn backend(dir: &tempfile::TempDir) -> LocalFileBackend {
        LocalFileBackend::new(dir.path().join("posts.json"))
    }

    /// Two posts with B created after A, stored as [A, B].
    async fn seed_a_then_b(backend: &LocalFileBackend) -> (Post, Post) {
        let a = Post::from_draft(PostDraft {
            title: "A".into(),
            content: "first".into(),
            excerpt: "a".into(),
            slug: Some("post-a".into()),
            ..Default::default()
        });
        let mut b = Post::from_draft(PostDraft {
            title: "B".into(),
            content: "second".into(),
            excerpt: "b".into(),
            slug: Some("post-b".into()),
            ..Default::default()
        });
        b.created_at = a.created_at + Duration::seconds(60);
        b.updated_at = b.created_at;

        backend.create(&a).await.unwrap();
        backend.create(&b).await.unwrap();
        (a, b)
    }

    #[tokio::test]
    async fn absent_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        assert!(backend.list_all().await.unwrap().is_empty());
        assert!(backend.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, b) = seed_a_then_b(&backend).await;

        let posts = backend.list_all().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, b.id);
        assert_eq!(posts[1].id, a.id);
    }

    #[tokio::test]
    async fn created_post_is_fetchable_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, _) = seed_a_then_b(&backend).await;

        let fetched = backend.get_by_slug("post-a").await.unwrap().unwrap();
        assert_eq!(fetched.id, a.id);
        assert_eq!(fetched.slug, a.slug);
        assert_eq!(fetched.content, a.content);
    }

    #[tokio::test]
    async fn pagination_windows_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, b) = seed_a_then_b(&backend).await;

        let first = backend.paginate(1, 1).await.unwrap();
        assert_eq!(first.posts[0].id, b.id);
        assert_eq!(first.total, 2);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let second = backend.paginate(2, 1).await.unwrap();
        assert_eq!(second.posts[0].id, a.id);
        assert!(!second.has_next);
        assert!(second.has_prev);
    }

    #[tokio::test]
    async fn page_beyond_the_last_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        seed_a_then_b(&backend).await;

        let page = backend.paginate(5, 10).await.unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 2);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn delete_removes_the_post_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, _) = seed_a_then_b(&backend).await;

        backend.delete(&a.id).await.unwrap();

        assert_eq!(backend.list_all().await.unwrap().len(), 1);
        assert!(backend.get_by_id(&a.id).await.unwrap().is_none());
        assert!(backend.get_by_slug(&a.slug).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_an_unknown_id_is_not_found_and_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        seed_a_then_b(&backend).await;

        assert!(matches!(
            backend.delete("no-such-id").await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(backend.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_preserves_identity_and_creation_time() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, _) = seed_a_then_b(&backend).await;

        let mut edited = a.clone();
        edited.title = "A, revised".into();
        backend.update(&edited).await.unwrap();

        let fetched = backend.get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "A, revised");
        assert_eq!(fetched.slug, a.slug);
        assert_eq!(fetched.created_at, a.created_at);
    }

    #[tokio::test]
    async fn retried_create_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, _) = seed_a_then_b(&backend).await;

        backend.create(&a).await.unwrap();
        assert_eq!(backend.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn increment_view_returns_the_new_value() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let (a, _) = seed_a_then_b(&backend).await;

        assert_eq!(backend.increment_view(&a.id).await.unwrap(), 1);
        assert_eq!(backend.increment_view(&a.id).await.unwrap(), 2);
        assert_eq!(
            backend.get_by_id(&a.id).await.unwrap().unwrap().view_count,
            2
        );
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let backend = LocalFileBackend::new(path);
        assert!(matches!(
            backend.list_all().await,
            Err(StoreError::Serialization(_))
        ));
    }
}
