// src/share/webhook.rs
//! Webhook messaging sink: JSON text post, or multipart with the PNG
//! attached. Unset webhook URL means the tier is simply unavailable.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::share::dispatch::{ShareSink, SharePayload, SinkOutcome};

const ENV_WEBHOOK_URL: &str = "CDLT_SHARE_WEBHOOK_URL";
const ATTACHMENT_NAME: &str = "CDLT_NEWS_REPORT.png";

#[derive(Clone)]
pub struct WebhookSink {
    webhook: Option<String>,
    client: Client,
    timeout: Duration,
    max_retries: u8,
    /// Rich tier: requires image bytes and attaches them; the text tier
    /// runs with this off.
    attach_image: bool,
}

impl WebhookSink {
    pub fn from_env() -> Self {
        Self::new(std::env::var(ENV_WEBHOOK_URL).ok())
    }

    pub fn new(webhook: Option<String>) -> Self {
        Self {
            webhook: webhook.filter(|u| !u.trim().is_empty()),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            attach_image: false,
        }
    }

    pub fn with_attachment(mut self, attach: bool) -> Self {
        self.attach_image = attach;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    async fn post_once(&self, url: &str, payload: &SharePayload<'_>) -> Result<reqwest::Response> {
        if let (true, Some(png)) = (self.attach_image, payload.image_png) {
            let form = reqwest::multipart::Form::new()
                .text("content", payload.caption_text.to_string())
                .part(
                    "file",
                    reqwest::multipart::Part::bytes(png.to_vec())
                        .file_name(ATTACHMENT_NAME)
                        .mime_str("image/png")?,
                );
            Ok(self
                .client
                .post(url)
                .timeout(self.timeout)
                .multipart(form)
                .send()
                .await?)
        } else {
            #[derive(Serialize)]
            struct TextPayload<'a> {
                content: &'a str,
            }
            Ok(self
                .client
                .post(url)
                .timeout(self.timeout)
                .json(&TextPayload {
                    content: payload.caption_text,
                })
                .send()
                .await?)
        }
    }
}

#[async_trait::async_trait]
impl ShareSink for WebhookSink {
    async fn deliver(&self, payload: &SharePayload<'_>) -> Result<SinkOutcome> {
        let Some(url) = &self.webhook else {
            tracing::debug!("webhook sink disabled (no CDLT_SHARE_WEBHOOK_URL)");
            return Ok(SinkOutcome::Unavailable);
        };
        if self.attach_image && payload.image_png.is_none() {
            // No file to attach; let the text tier take it.
            return Ok(SinkOutcome::Unavailable);
        }

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.post_once(url, payload).await {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("share webhook HTTP error: {e}"));
                    }
                    return Ok(SinkOutcome::Delivered);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("share webhook request failed: {e}"));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        if self.attach_image {
            "webhook-rich"
        } else {
            "webhook-text"
        }
    }
}
