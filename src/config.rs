// src/config.rs
//! Runtime configuration: stream definitions plus the handful of paths
//! and endpoints the core needs. Values come from built-in defaults,
//! optionally overridden by a TOML file ($CDLT_STREAMS_PATH or
//! config/streams.toml) and environment variables. `.env` loading is the
//! binary's job (dotenvy), not this module's.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_STREAMS_PATH: &str = "CDLT_STREAMS_PATH";
const ENV_DATA_DIR: &str = "CDLT_DATA_DIR";
const ENV_FONT_PATH: &str = "CDLT_FONT_PATH";

/// Canonical site link embedded in captions and deep links.
pub const CANONICAL_URL: &str = "https://cdlt-news.vercel.app/";

/// Parameters of one independently cached/refreshed content stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Storage key; doubles as the persisted blob's file stem.
    pub key: String,
    /// Max entries kept after a merge.
    pub capacity: usize,
    /// Cached data younger than this is served without a network call.
    pub refresh_interval_ms: i64,
    /// Prompt sent to the remote generator for this stream.
    pub prompt: String,
}

impl StreamConfig {
    pub fn articles_default() -> Self {
        Self {
            key: "cdlt_news_history_v4".to_string(),
            capacity: 100,
            refresh_interval_ms: 120_000,
            prompt: concat!(
                "REPORTE GLOBAL URGENTE CDLT NEW: Genera 15 noticias reales e ",
                "impactantes del mundo. JSON: [{ \"id\": string, \"title\": string, ",
                "\"summary\": string, \"content\": string, \"imageUrl\": string, ",
                "\"date\": string, \"author\": string, \"category\": string }]"
            )
            .to_string(),
        }
    }

    pub fn stories_default() -> Self {
        Self {
            key: "cdlt_stories_history_v4".to_string(),
            capacity: 40,
            refresh_interval_ms: 120_000,
            prompt: concat!(
                "MOMENTOS CDLT: 12 micro-noticias visuales sobre tendencias. ",
                "JSON: [{id, category, title, concept, timestamp, image}]"
            )
            .to_string(),
        }
    }
}

/// Top-level configuration handed to the demo binary and embedders.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub articles: StreamConfig,
    pub stories: StreamConfig,
    /// Background poll period for the demo timer loop.
    pub poll_period_ms: u64,
    /// Directory for the file-backed envelope store.
    pub data_dir: PathBuf,
    /// TTF used by the card rasterizer; absent font means caption-only shares.
    pub font_path: Option<PathBuf>,
    pub canonical_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            articles: StreamConfig::articles_default(),
            stories: StreamConfig::stories_default(),
            poll_period_ms: 300_000,
            data_dir: PathBuf::from("data"),
            font_path: None,
            canonical_url: CANONICAL_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults + TOML stream overrides + env paths.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        match load_stream_overrides_default() {
            Ok(Some(ov)) => ov.apply(&mut cfg),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = ?e, "stream overrides ignored"),
        }

        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                cfg.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(p) = std::env::var(ENV_FONT_PATH) {
            if !p.trim().is_empty() {
                cfg.font_path = Some(PathBuf::from(p));
            }
        }
        cfg
    }
}

// ------------------------------------------------------------
// TOML overrides
// ------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
pub struct StreamOverride {
    capacity: Option<usize>,
    refresh_interval_ms: Option<i64>,
    prompt: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct StreamOverrides {
    #[serde(default)]
    articles: StreamOverride,
    #[serde(default)]
    stories: StreamOverride,
    poll_period_ms: Option<u64>,
}

impl StreamOverrides {
    fn apply(self, cfg: &mut AppConfig) {
        apply_one(self.articles, &mut cfg.articles);
        apply_one(self.stories, &mut cfg.stories);
        if let Some(p) = self.poll_period_ms {
            cfg.poll_period_ms = p;
        }
    }
}

fn apply_one(ov: StreamOverride, stream: &mut StreamConfig) {
    if let Some(c) = ov.capacity {
        stream.capacity = c.max(1);
    }
    if let Some(ms) = ov.refresh_interval_ms {
        stream.refresh_interval_ms = ms.max(0);
    }
    if let Some(p) = ov.prompt {
        if !p.trim().is_empty() {
            stream.prompt = p;
        }
    }
}

/// Load overrides from an explicit TOML path.
pub fn load_stream_overrides_from(path: &Path) -> Result<StreamOverrides> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading stream overrides from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Resolve overrides using env var + fallback:
/// 1) $CDLT_STREAMS_PATH
/// 2) config/streams.toml
fn load_stream_overrides_default() -> Result<Option<StreamOverrides>> {
    if let Ok(p) = std::env::var(ENV_STREAMS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_stream_overrides_from(&pb).map(Some);
        }
        return Err(anyhow!("CDLT_STREAMS_PATH points to non-existent path"));
    }
    let fallback = PathBuf::from("config/streams.toml");
    if fallback.exists() {
        return load_stream_overrides_from(&fallback).map(Some);
    }
    Ok(None)
}
