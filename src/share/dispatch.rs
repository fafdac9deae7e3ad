// src/share/dispatch.rs
//! Cascading share dispatch: an ordered list of sinks per target,
//! attempted until one succeeds. Unavailable sinks, user cancellation
//! and transport errors all fall through to the next tier; exhaustion
//! is a report, not an error.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::card::ShareResult;
use crate::config::AppConfig;
use crate::share::email::EmailSink;
use crate::share::link::DeepLinkSink;
use crate::share::webhook::WebhookSink;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("share_dispatch_total", "Dispatch attempts per target.");
        describe_counter!(
            "share_tier_fallthrough_total",
            "Sink tiers skipped or failed during dispatch."
        );
        describe_counter!("share_exhausted_total", "Dispatches with no succeeding tier.");
    });
}

/// Closed set of outbound targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareTarget {
    Messaging,
    SocialNetwork,
    Email,
}

impl ShareTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            ShareTarget::Messaging => "messaging-app",
            ShareTarget::SocialNetwork => "social-network",
            ShareTarget::Email => "email",
        }
    }
}

/// What a sink receives: the caption always, the PNG when composition
/// produced one.
pub struct SharePayload<'a> {
    pub caption_text: &'a str,
    pub image_png: Option<&'a [u8]>,
}

/// Non-error outcomes a sink can report. Transport failures are `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Content handed to the platform.
    Delivered,
    /// Sink produced a URL for the host UI to open.
    Link(String),
    /// Sink is not configured/capable right now.
    Unavailable,
    /// The user backed out; the cascade keeps going.
    Cancelled,
}

#[async_trait::async_trait]
pub trait ShareSink: Send + Sync {
    async fn deliver(&self, payload: &SharePayload<'_>) -> anyhow::Result<SinkOutcome>;
    /// Sink name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type SharedSink = Arc<dyn ShareSink>;

/// Final word on a dispatch. `Exhausted` is the worst case and still Ok.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchReport {
    Delivered { sink: &'static str },
    Link { sink: &'static str, url: String },
    Exhausted,
}

/// Per-target ordered sink lists. Construct once and share.
pub struct ShareDispatch {
    messaging: Vec<SharedSink>,
    social: Vec<SharedSink>,
    email: Vec<SharedSink>,
}

impl ShareDispatch {
    /// Reference wiring: rich transport tier (webhook/SMTP with the PNG
    /// attached), then the same transport text-only, then the deep link
    /// that is always constructible.
    pub fn from_env(config: &AppConfig) -> Self {
        let url = config.canonical_url.clone();
        Self::new(
            vec![
                Arc::new(WebhookSink::from_env().with_attachment(true)),
                Arc::new(WebhookSink::from_env().with_attachment(false)),
                Arc::new(DeepLinkSink::new(ShareTarget::Messaging, url.clone())),
            ],
            vec![Arc::new(DeepLinkSink::new(
                ShareTarget::SocialNetwork,
                url.clone(),
            ))],
            vec![
                Arc::new(EmailSink::from_env().with_attachment(true)),
                Arc::new(EmailSink::from_env().with_attachment(false)),
                Arc::new(DeepLinkSink::new(ShareTarget::Email, url)),
            ],
        )
    }

    pub fn new(
        messaging: Vec<SharedSink>,
        social: Vec<SharedSink>,
        email: Vec<SharedSink>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            messaging,
            social,
            email,
        }
    }

    fn tiers(&self, target: ShareTarget) -> &[SharedSink] {
        match target {
            ShareTarget::Messaging => &self.messaging,
            ShareTarget::SocialNetwork => &self.social,
            ShareTarget::Email => &self.email,
        }
    }

    pub async fn dispatch(&self, target: ShareTarget, result: &ShareResult) -> DispatchReport {
        counter!("share_dispatch_total", "target" => target.as_str()).increment(1);

        let payload = SharePayload {
            caption_text: &result.caption_text,
            image_png: result.image_png.as_deref(),
        };

        for sink in self.tiers(target) {
            match sink.deliver(&payload).await {
                Ok(SinkOutcome::Delivered) => {
                    tracing::info!(target = target.as_str(), sink = sink.name(), "share delivered");
                    return DispatchReport::Delivered { sink: sink.name() };
                }
                Ok(SinkOutcome::Link(url)) => {
                    tracing::info!(target = target.as_str(), sink = sink.name(), "share resolved to link");
                    return DispatchReport::Link {
                        sink: sink.name(),
                        url,
                    };
                }
                Ok(SinkOutcome::Unavailable) => {
                    tracing::debug!(target = target.as_str(), sink = sink.name(), "sink unavailable");
                }
                Ok(SinkOutcome::Cancelled) => {
                    tracing::debug!(target = target.as_str(), sink = sink.name(), "share cancelled, trying next tier");
                }
                Err(e) => {
                    tracing::warn!(error = ?e, target = target.as_str(), sink = sink.name(), "sink error, trying next tier");
                }
            }
            counter!("share_tier_fallthrough_total", "target" => target.as_str()).increment(1);
        }

        counter!("share_exhausted_total", "target" => target.as_str()).increment(1);
        tracing::warn!(target = target.as_str(), "all share tiers exhausted");
        DispatchReport::Exhausted
    }
}
