// src/content/types.rs
//! Content data model plus the schema-validating decode step for
//! generator payloads. Field renames keep the wire/storage shapes
//! compatible with the v4 envelope format.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::content::merge::normalize_title;

/// Retrieval-grounding reference attached to generated articles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    pub uri: String,
    pub title: String,
}

/// Short-lived "story" card. Uniqueness key is the normalized title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoryItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category: String,
    pub title: String,
    #[serde(rename = "concept", default)]
    pub short_body: String,
    #[serde(rename = "timestamp", default)]
    pub timestamp_label: String,
    #[serde(rename = "image", default)]
    pub image_url: String,
}

/// Long-form article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "content", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "date", default)]
    pub date_label: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
}

/// Persisted per-stream wrapper. `timestamp` name matches the stored v4 blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCacheEnvelope<T> {
    pub data: Vec<T>,
    #[serde(rename = "timestamp")]
    pub fetched_at_epoch_ms: i64,
}

impl<T> Default for ContentCacheEnvelope<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            fetched_at_epoch_ms: 0,
        }
    }
}

/// Seam shared by both stream item types: normalized-title identity,
/// stable derived ids, optional grounding attachment.
pub trait ContentItem: Clone + Send + Sync {
    fn title(&self) -> &str;
    fn id_mut(&mut self) -> &mut String;
    /// Articles accept grounding references; stories ignore them.
    fn attach_sources(&mut self, _sources: &[SourceRef]) {}
}

impl ContentItem for StoryItem {
    fn title(&self) -> &str {
        &self.title
    }
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
}

impl ContentItem for ArticleItem {
    fn title(&self) -> &str {
        &self.title
    }
    fn id_mut(&mut self) -> &mut String {
        &mut self.id
    }
    fn attach_sources(&mut self, sources: &[SourceRef]) {
        if self.sources.is_none() && !sources.is_empty() {
            self.sources = Some(sources.to_vec());
        }
    }
}

/// Stable item id derived from the normalized title. Generator-supplied
/// ids are untrusted and unstable across calls, so empty ones are
/// replaced with this.
pub fn derived_id(title: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(normalize_title(title).as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Typed decode of a generator JSON array. Items without a usable
/// normalized title are dropped; an unparsable or effectively empty
/// payload is an error the caller treats as a soft fetch failure.
pub fn decode_items<T>(text: &str) -> Result<Vec<T>>
where
    T: ContentItem + DeserializeOwned,
{
    let parsed: Vec<T> = serde_json::from_str(text).context("generator payload is not a JSON array")?;
    let mut items: Vec<T> = parsed
        .into_iter()
        .filter(|it| !normalize_title(it.title()).is_empty())
        .collect();
    for it in &mut items {
        if it.id_mut().trim().is_empty() {
            let id = derived_id(it.title());
            *it.id_mut() = id;
        }
    }
    if items.is_empty() {
        return Err(anyhow!("generator payload contained no usable items"));
    }
    Ok(items)
}
