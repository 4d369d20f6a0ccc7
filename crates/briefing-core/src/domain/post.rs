use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque snapshot payload captured alongside a post at generation time
/// (market data, earnings tables, and similar).
///
/// Documents written before the structured format existed may carry plain
/// text where JSON was expected; those decode as `Raw` instead of failing
/// the read, and callers must handle the degraded case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    Structured(serde_json::Value),
    Raw(String),
}

/// Post entity - a published article.
///
/// Serialized with camelCase field names; legacy documents use that casing
/// and migration reads them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_data: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub korean_market_data: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings_data: Option<Snapshot>,
}

/// Input produced by the content-generation pipeline or the admin UI.
///
/// The store assigns `id`, `slug` (when absent), and both timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    #[serde(default)]
    pub seo_title: Option<String>,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub market_data: Option<Snapshot>,
    #[serde(default)]
    pub korean_market_data: Option<Snapshot>,
    #[serde(default)]
    pub earnings_data: Option<Snapshot>,
}

impl Post {
    /// Materialize a draft into a full post with generated ID, slug, and
    /// timestamps.
    pub fn from_draft(draft: PostDraft) -> Self {
        let now = Utc::now();
        let slug = draft.slug.unwrap_or_else(|| generate_slug(now));

        Self {
            id: generate_id(),
            slug,
            title: draft.title,
            seo_title: draft.seo_title,
            content: draft.content,
            excerpt: draft.excerpt,
            keywords: draft.keywords,
            created_at: now,
            updated_at: now,
            pinned: false,
            view_count: 0,
            market_data: draft.market_data,
            korean_market_data: draft.korean_market_data,
            earnings_data: draft.earnings_data,
        }
    }
}

/// Generate an opaque, globally unique post ID.
fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generate a date-coded slug for pipeline posts, e.g. `250129-a3f2`.
fn generate_slug(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%y%m%d"), &random[..4])
}
