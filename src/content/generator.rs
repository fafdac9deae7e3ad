// src/content/generator.rs
//! Remote generator seam + concrete clients.
//!
//! The Gemini client does a *real* remote call. It is separated behind a
//! trait so the sync cache can run against the disabled client (no API
//! key, cache-only mode) or the static client (tests) unchanged.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::content::types::SourceRef;

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Raw generation outcome. `text: None` means the model produced nothing
/// usable; callers treat that as a soft failure, not an error.
#[derive(Debug, Clone, Default)]
pub struct GeneratedPayload {
    pub text: Option<String>,
    pub sources: Vec<SourceRef>,
}

#[async_trait::async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedPayload>;
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type SharedGenerator = Arc<dyn ContentGenerator>;

/// Build a generator from the environment: real client when the API key
/// is present, otherwise the disabled client (cache-only operation).
pub fn generator_from_env() -> SharedGenerator {
    match std::env::var(ENV_API_KEY) {
        Ok(key) if !key.trim().is_empty() => Arc::new(GeminiGenerator::new(key, None)),
        _ => {
            tracing::info!("no GEMINI_API_KEY; content sync runs cache-only");
            Arc::new(DisabledGenerator)
        }
    }
}

// ------------------------------------------------------------
// Gemini HTTP client
// ------------------------------------------------------------

pub struct GeminiGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    /// `model_override`: pass Some("...") to override the default model.
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("cdlt-news/0.1 (+github.com/cdlt-news/cdlt-news)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedPayload> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }
        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }
        #[derive(Serialize)]
        struct Tool {
            #[serde(rename = "googleSearch")]
            google_search: serde_json::Value,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig<'a> {
            response_mime_type: &'a str,
        }
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            contents: Vec<Content<'a>>,
            tools: Vec<Tool>,
            generation_config: GenerationConfig<'a>,
        }

        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Candidate {
            content: Option<CandContent>,
            grounding_metadata: Option<GroundingMetadata>,
        }
        #[derive(Deserialize)]
        struct CandContent {
            #[serde(default)]
            parts: Vec<CandPart>,
        }
        #[derive(Deserialize)]
        struct CandPart {
            text: Option<String>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct GroundingMetadata {
            #[serde(default)]
            grounding_chunks: Vec<GroundingChunk>,
        }
        #[derive(Deserialize)]
        struct GroundingChunk {
            web: Option<WebChunk>,
        }
        #[derive(Deserialize)]
        struct WebChunk {
            uri: Option<String>,
            title: Option<String>,
        }

        let req = Req {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            tools: vec![Tool {
                google_search: serde_json::json!({}),
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("generator HTTP status {}", resp.status()));
        }
        let body: Resp = resp.json().await?;

        let Some(candidate) = body.candidates.into_iter().next() else {
            return Ok(GeneratedPayload::default());
        };

        let text: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|g| {
                g.grounding_chunks
                    .into_iter()
                    .filter_map(|ch| ch.web)
                    .filter_map(|w| {
                        let uri = w.uri?;
                        Some(SourceRef {
                            title: w.title.unwrap_or_else(|| uri.clone()),
                            uri,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(GeneratedPayload {
            text: if text.trim().is_empty() { None } else { Some(text) },
            sources,
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Disabled + static clients
// ------------------------------------------------------------

/// Yields no text, always; used when the API key is absent.
pub struct DisabledGenerator;

#[async_trait::async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedPayload> {
        Ok(GeneratedPayload::default())
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-response client for tests/local runs; counts invocations so
/// tests can assert the staleness gate held.
pub struct StaticGenerator {
    payload: GeneratedPayload,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticGenerator {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            payload: GeneratedPayload {
                text: Some(text.into()),
                sources: Vec::new(),
            },
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            payload: GeneratedPayload::default(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceRef>) -> Self {
        self.payload.sources = sources;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentGenerator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("static generator configured to fail"));
        }
        Ok(self.payload.clone())
    }
    fn name(&self) -> &'static str {
        "static"
    }
}
