//! Record codec - converts a [`Post`] to and from the flat string-keyed
//! field map stored per record in the indexed layout.
//!
//! Field names are camelCase, matching the casing of the legacy documents
//! the migration tooling consumes. Absent optionals encode to the empty
//! string and decode back to absent. `keywords` and the snapshot fields
//! embed JSON text; a snapshot that fails to parse decodes as
//! [`Snapshot::Raw`] instead of failing the read. The view counter is not
//! part of the record map - it lives in its own key and the backend overlays
//! it after decoding.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use briefing_core::StoreError;
use briefing_core::domain::{Post, Snapshot};

pub(crate) const FIELD_SLUG: &str = "slug";

/// Encode a post as ordered field pairs, ready for a bulk hash write.
pub fn to_field_map(post: &Post) -> Vec<(&'static str, String)> {
    vec![
        ("id", post.id.clone()),
        (FIELD_SLUG, post.slug.clone()),
        ("title", post.title.clone()),
        ("seoTitle", post.seo_title.clone().unwrap_or_default()),
        ("content", post.content.clone()),
        ("excerpt", post.excerpt.clone()),
        (
            "keywords",
            serde_json::Value::from(post.keywords.clone()).to_string(),
        ),
        ("createdAt", post.created_at.to_rfc3339()),
        ("updatedAt", post.updated_at.to_rfc3339()),
        ("pinned", if post.pinned { "1" } else { "0" }.to_string()),
        ("marketData", encode_snapshot(post.market_data.as_ref())),
        (
            "koreanMarketData",
            encode_snapshot(post.korean_market_data.as_ref()),
        ),
        ("earningsData", encode_snapshot(post.earnings_data.as_ref())),
    ]
}

/// Decode a record field map back into a post.
///
/// The view counter is initialized to zero; the caller overlays the real
/// value from the counter key.
pub fn from_field_map(fields: &HashMap<String, String>) -> Result<Post, StoreError> {
    Ok(Post {
        id: field(fields, "id").to_string(),
        slug: field(fields, FIELD_SLUG).to_string(),
        title: field(fields, "title").to_string(),
        seo_title: optional_field(fields, "seoTitle"),
        content: field(fields, "content").to_string(),
        excerpt: field(fields, "excerpt").to_string(),
        keywords: decode_keywords(field(fields, "keywords")),
        created_at: parse_timestamp(field(fields, "createdAt"))?,
        updated_at: parse_timestamp(field(fields, "updatedAt"))?,
        pinned: field(fields, "pinned") == "1",
        view_count: 0,
        market_data: decode_snapshot(field(fields, "marketData")),
        korean_market_data: decode_snapshot(field(fields, "koreanMarketData")),
        earnings_data: decode_snapshot(field(fields, "earningsData")),
    })
}

fn field<'a>(fields: &'a HashMap<String, String>, key: &str) -> &'a str {
    fields.get(key).map(String::as_str).unwrap_or("")
}

fn optional_field(fields: &HashMap<String, String>, key: &str) -> Option<String> {
    match field(fields, key) {
        "" => None,
        value => Some(value.to_string()),
    }
}

fn encode_snapshot(snapshot: Option<&Snapshot>) -> String {
    match snapshot {
        Some(Snapshot::Structured(value)) => value.to_string(),
        Some(Snapshot::Raw(raw)) => raw.clone(),
        None => String::new(),
    }
}

fn decode_snapshot(raw: &str) -> Option<Snapshot> {
    if raw.is_empty() {
        return None;
    }
    Some(match serde_json::from_str(raw) {
        Ok(value) => Snapshot::Structured(value),
        Err(_) => Snapshot::Raw(raw.to_string()),
    })
}

fn decode_keywords(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    // Malformed keyword lists degrade to a single raw keyword.
    serde_json::from_str(raw).unwrap_or_else(|_| vec![raw.to_string()])
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefing_core::domain::PostDraft;
    use serde_json::json;

    fn sample_post() -> Post {
        let mut post = Post::from_draft(PostDraft {
            title: "US market wrap".into(),
            seo_title: Some("US market wrap - daily briefing".into()),
            content: "The indices closed mixed.".into(),
            excerpt: "Mixed close.".into(),
            keywords: vec!["nasdaq".into(), "sp500".into()],
            slug: Some("250129-a3f2".into()),
            market_data: Some(Snapshot::Structured(json!({"dow": 44500.1}))),
            ..Default::default()
        });
        post.pinned = true;
        post
    }

    #[test]
    fn round_trips_all_declared_fields() {
        let post = sample_post();
        let map: HashMap<String, String> = to_field_map(&post)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let decoded = from_field_map(&map).unwrap();
        assert_eq!(decoded.id, post.id);
        assert_eq!(decoded.slug, post.slug);
        assert_eq!(decoded.title, post.title);
        assert_eq!(decoded.seo_title, post.seo_title);
        assert_eq!(decoded.content, post.content);
        assert_eq!(decoded.excerpt, post.excerpt);
        assert_eq!(decoded.keywords, post.keywords);
        assert_eq!(decoded.created_at, post.created_at);
        assert_eq!(decoded.updated_at, post.updated_at);
        assert!(decoded.pinned);
        assert_eq!(decoded.market_data, post.market_data);
        assert_eq!(decoded.korean_market_data, None);
        assert_eq!(decoded.earnings_data, None);
    }

    #[test]
    fn absent_optionals_encode_to_empty_and_back() {
        let mut post = sample_post();
        post.seo_title = None;
        post.market_data = None;

        let pairs = to_field_map(&post);
        let seo = pairs.iter().find(|(k, _)| *k == "seoTitle").unwrap();
        assert_eq!(seo.1, "");
        let market = pairs.iter().find(|(k, _)| *k == "marketData").unwrap();
        assert_eq!(market.1, "");

        let map: HashMap<String, String> =
            pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        let decoded = from_field_map(&map).unwrap();
        assert_eq!(decoded.seo_title, None);
        assert_eq!(decoded.market_data, None);
    }

    #[test]
    fn malformed_snapshot_degrades_to_raw() {
        let post = sample_post();
        let mut map: HashMap<String, String> = to_field_map(&post)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        map.insert("marketData".into(), "not {valid json".into());

        let decoded = from_field_map(&map).unwrap();
        assert_eq!(
            decoded.market_data,
            Some(Snapshot::Raw("not {valid json".into()))
        );
    }

    #[test]
    fn malformed_keywords_degrade_to_single_raw_keyword() {
        let post = sample_post();
        let mut map: HashMap<String, String> = to_field_map(&post)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        map.insert("keywords".into(), "nasdaq, sp500".into());

        let decoded = from_field_map(&map).unwrap();
        assert_eq!(decoded.keywords, vec!["nasdaq, sp500".to_string()]);
    }

    #[test]
    fn bad_timestamp_is_a_serialization_error() {
        let post = sample_post();
        let mut map: HashMap<String, String> = to_field_map(&post)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        map.insert("createdAt".into(), "yesterday".into());

        assert!(matches!(
            from_field_map(&map),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn view_count_is_not_part_of_the_record_map() {
        let mut post = sample_post();
        post.view_count = 42;

        let pairs = to_field_map(&post);
        assert!(pairs.iter().all(|(k, _)| *k != "viewCount"));

        let map: HashMap<String, String> =
            pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        assert_eq!(from_field_map(&map).unwrap().view_count, 0);
    }
}
