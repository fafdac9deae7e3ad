// src/content/sync.rs
//! Freshness/caching layer for the two content streams.
//!
//! Cache-first, network-refresh-second. Every failure mode (transport,
//! empty text, malformed JSON, corrupt persisted blob) resolves to the
//! last known good data; nothing here returns an error to the caller.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{AppConfig, StreamConfig};
use crate::content::generator::SharedGenerator;
use crate::content::merge::merge_deduplicated;
use crate::content::types::{decode_items, ArticleItem, ContentCacheEnvelope, ContentItem, StoryItem};
use crate::store::SharedStore;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "content_refresh_attempts_total",
            "Generator refresh attempts per stream."
        );
        describe_counter!(
            "content_cache_hits_total",
            "Calls served from cache by the staleness gate."
        );
        describe_counter!(
            "content_refresh_fallback_total",
            "Refreshes that fell back to cached data."
        );
        describe_counter!(
            "content_items_kept_total",
            "Items present after merge+truncate."
        );
        describe_gauge!(
            "content_last_refresh_ts",
            "Unix ts of the last successful refresh."
        );
    });
}

struct StreamState {
    cfg: StreamConfig,
    /// Guards the refresh section: at most one in-flight generator call
    /// per stream. Waiters re-check the gate after acquiring.
    refresh_gate: Mutex<()>,
}

/// Owns fetching, merging, persisting and staleness-gating of both
/// streams. Construct once at startup and share (`Arc`) with callers.
pub struct ContentSyncCache {
    store: SharedStore,
    generator: SharedGenerator,
    articles: StreamState,
    stories: StreamState,
}

impl ContentSyncCache {
    pub fn new(config: &AppConfig, store: SharedStore, generator: SharedGenerator) -> Self {
        ensure_metrics_described();
        Self {
            store,
            generator,
            articles: StreamState {
                cfg: config.articles.clone(),
                refresh_gate: Mutex::new(()),
            },
            stories: StreamState {
                cfg: config.stories.clone(),
                refresh_gate: Mutex::new(()),
            },
        }
    }

    // ---- raw accessors (instant, no network) ----

    /// Last persisted article envelope, or empty. Used for optimistic
    /// first paint before any network activity.
    pub fn load_articles(&self) -> ContentCacheEnvelope<ArticleItem> {
        self.load_envelope(&self.articles.cfg.key)
    }

    pub fn load_stories(&self) -> ContentCacheEnvelope<StoryItem> {
        self.load_envelope(&self.stories.cfg.key)
    }

    fn load_envelope<T: DeserializeOwned>(&self, key: &str) -> ContentCacheEnvelope<T> {
        let Some(raw) = self.store.get(key) else {
            return ContentCacheEnvelope::default();
        };
        match serde_json::from_str(&raw) {
            Ok(env) => env,
            Err(e) => {
                // Corrupt or pre-migration blob: behave as absent, rebuild on next refresh.
                tracing::warn!(error = %e, key, "unreadable envelope, treating as empty");
                ContentCacheEnvelope::default()
            }
        }
    }

    // ---- freshness-gated accessors ----

    pub async fn fresh_articles(&self, force_refresh: bool) -> Vec<ArticleItem> {
        self.get_fresh(&self.articles, force_refresh).await
    }

    pub async fn fresh_stories(&self, force_refresh: bool) -> Vec<StoryItem> {
        self.get_fresh(&self.stories, force_refresh).await
    }

    /// Refresh both streams concurrently. Failures are absorbed per
    /// stream, so one stream degrading cannot affect the other.
    pub async fn sync_all(&self, force_refresh: bool) -> (Vec<StoryItem>, Vec<ArticleItem>) {
        tokio::join!(
            self.fresh_stories(force_refresh),
            self.fresh_articles(force_refresh)
        )
    }

    async fn get_fresh<T>(&self, state: &StreamState, force_refresh: bool) -> Vec<T>
    where
        T: ContentItem + Serialize + DeserializeOwned,
    {
        let key = state.cfg.key.as_str();

        let envelope = self.load_envelope::<T>(key);
        if !force_refresh && self.gate_holds(&envelope, &state.cfg) {
            counter!("content_cache_hits_total", "stream" => state.cfg.key.clone()).increment(1);
            return envelope.data;
        }

        let _guard = state.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        let envelope = self.load_envelope::<T>(key);
        if !force_refresh && self.gate_holds(&envelope, &state.cfg) {
            counter!("content_cache_hits_total", "stream" => state.cfg.key.clone()).increment(1);
            return envelope.data;
        }

        counter!("content_refresh_attempts_total", "stream" => state.cfg.key.clone()).increment(1);

        let payload = match self.generator.generate(&state.cfg.prompt).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = ?e, stream = key, provider = self.generator.name(), "generator error, serving cached data");
                counter!("content_refresh_fallback_total", "stream" => state.cfg.key.clone())
                    .increment(1);
                return envelope.data;
            }
        };

        let Some(text) = payload.text else {
            tracing::debug!(stream = key, "generator returned no text, serving cached data");
            counter!("content_refresh_fallback_total", "stream" => state.cfg.key.clone())
                .increment(1);
            return envelope.data;
        };

        let mut items = match decode_items::<T>(&text) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = ?e, stream = key, "undecodable payload, serving cached data");
                counter!("content_refresh_fallback_total", "stream" => state.cfg.key.clone())
                    .increment(1);
                return envelope.data;
            }
        };

        for item in &mut items {
            item.attach_sources(&payload.sources);
        }

        let merged = merge_deduplicated(&envelope.data, &items, state.cfg.capacity);
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.persist_envelope(key, &merged, now_ms);

        counter!("content_items_kept_total", "stream" => state.cfg.key.clone())
            .increment(merged.len() as u64);
        gauge!("content_last_refresh_ts").set((now_ms / 1000) as f64);
        tracing::info!(stream = key, fetched = items.len(), kept = merged.len(), "stream refreshed");

        merged
    }

    /// The staleness gate: serve cache when it is young enough and non-empty.
    fn gate_holds<T>(&self, envelope: &ContentCacheEnvelope<T>, cfg: &StreamConfig) -> bool {
        if envelope.data.is_empty() {
            return false;
        }
        let now_ms = chrono::Utc::now().timestamp_millis();
        now_ms.saturating_sub(envelope.fetched_at_epoch_ms) < cfg.refresh_interval_ms
    }

    fn persist_envelope<T: Serialize>(&self, key: &str, data: &[T], fetched_at_epoch_ms: i64) {
        #[derive(Serialize)]
        struct EnvelopeRef<'a, T> {
            data: &'a [T],
            timestamp: i64,
        }
        match serde_json::to_string(&EnvelopeRef {
            data,
            timestamp: fetched_at_epoch_ms,
        }) {
            Ok(json) => self.store.set(key, &json),
            Err(e) => tracing::warn!(error = %e, key, "envelope serialization failed"),
        }
    }
}
