// src/share/link.rs
//! Deep-link tier: always constructible, so it terminates every cascade.

use crate::share::dispatch::{ShareSink, SharePayload, ShareTarget, SinkOutcome};

/// Percent-encode a URL component. `form_urlencoded` emits `+` for
/// spaces, which mailto/wa.me bodies do not interpret; use `%20`.
fn encode_component(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Platform URL carrying the caption for the host UI to open.
pub fn deep_link(target: ShareTarget, caption: &str, canonical_url: &str) -> String {
    let encoded = encode_component(caption);
    match target {
        ShareTarget::Messaging => format!("https://wa.me/?text={encoded}"),
        ShareTarget::SocialNetwork => format!(
            "https://www.facebook.com/sharer/sharer.php?u={}&quote={}",
            encode_component(canonical_url),
            encoded
        ),
        ShareTarget::Email => format!(
            "mailto:?subject={}&body={}",
            encode_component("REPORTE CDLT NEWS"),
            encoded
        ),
    }
}

pub struct DeepLinkSink {
    target: ShareTarget,
    canonical_url: String,
}

impl DeepLinkSink {
    pub fn new(target: ShareTarget, canonical_url: String) -> Self {
        Self {
            target,
            canonical_url,
        }
    }
}

#[async_trait::async_trait]
impl ShareSink for DeepLinkSink {
    async fn deliver(&self, payload: &SharePayload<'_>) -> anyhow::Result<SinkOutcome> {
        Ok(SinkOutcome::Link(deep_link(
            self.target,
            payload.caption_text,
            &self.canonical_url,
        )))
    }

    fn name(&self) -> &'static str {
        "deep-link"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messaging_link_carries_encoded_caption() {
        let url = deep_link(ShareTarget::Messaging, "hola mundo", "https://cdlt-news.vercel.app/");
        assert_eq!(url, "https://wa.me/?text=hola%20mundo");
    }

    #[test]
    fn social_link_quotes_caption_and_canonical_url() {
        let url = deep_link(ShareTarget::SocialNetwork, "t&x", "https://cdlt-news.vercel.app/");
        assert!(url.starts_with("https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2F"));
        assert!(url.ends_with("&quote=t%26x"));
    }

    #[test]
    fn email_link_uses_fixed_subject() {
        let url = deep_link(ShareTarget::Email, "cuerpo", "https://cdlt-news.vercel.app/");
        assert!(url.starts_with("mailto:?subject=REPORTE%20CDLT%20NEWS&body="));
        assert!(url.ends_with("cuerpo"));
    }
}
