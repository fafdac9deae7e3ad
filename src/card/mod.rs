// src/card/mod.rs
//! Share-card compositor: one `ShareRequest` in, one `ShareResult` out.
//!
//! The caption and reference code are built unconditionally; the PNG is
//! best-effort. Photo fetch, missing font, raster and encode failures
//! all collapse to `image_png: None` — sharing degrades to text, never
//! errors.

pub mod layout;
pub mod metrics;
pub mod photo;
pub mod raster;

use once_cell::sync::OnceCell;
use std::sync::Mutex;

use crate::card::metrics::AdvanceTable;
use crate::card::photo::PhotoFetcher;
use crate::card::raster::{CardError, CardRenderer, CardResult};
use crate::config::AppConfig;
use crate::share::{caption, refcode};

// Fully qualified `::metrics` below: the facade crate shares its name
// with the local text-metrics module.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        ::metrics::describe_counter!("card_compose_total", "Share-card compose calls.");
        ::metrics::describe_counter!(
            "card_degraded_total",
            "Compose calls that fell back to caption-only."
        );
    });
}

/// Normalized projection the UI builds from a story or an article. The
/// compositor never sees the original item shape.
#[derive(Debug, Clone)]
pub struct ShareRequest {
    pub title: String,
    pub category: String,
    pub lead_paragraph: String,
    pub time_label: String,
    pub author: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct ShareResult {
    pub image_png: Option<Vec<u8>>,
    pub caption_text: String,
    /// Cosmetic 8-char uppercase-alphanumeric stamp; regenerated per call.
    pub reference_code: String,
}

pub struct ShareCardCompositor {
    fetcher: PhotoFetcher,
    /// Absent when no usable font was configured; shares are then text-only.
    renderer: Option<Mutex<CardRenderer>>,
    measure: AdvanceTable,
    canonical_url: String,
}

impl ShareCardCompositor {
    pub fn new(config: &AppConfig) -> Self {
        ensure_metrics_described();
        let renderer = match &config.font_path {
            Some(path) => match CardRenderer::from_font_path(path) {
                Ok(r) => Some(Mutex::new(r)),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "card font unavailable, shares will be text-only");
                    None
                }
            },
            None => {
                tracing::info!("no card font configured, shares will be text-only");
                None
            }
        };
        Self {
            fetcher: PhotoFetcher::new(),
            renderer,
            measure: AdvanceTable,
            canonical_url: config.canonical_url.clone(),
        }
    }

    /// Compose a share card. Never fails: the worst case is a result
    /// without image bytes.
    pub async fn compose(&self, request: &ShareRequest) -> ShareResult {
        ::metrics::counter!("card_compose_total").increment(1);

        let reference_code = refcode::generate();
        let caption_text = caption::build(request, &reference_code, &self.canonical_url);

        let image_png = match self.render_card(request, &reference_code).await {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!(error = %e, title = %request.title, "card image degraded to caption-only");
                ::metrics::counter!("card_degraded_total").increment(1);
                None
            }
        };

        ShareResult {
            image_png,
            caption_text,
            reference_code,
        }
    }

    async fn render_card(&self, request: &ShareRequest, reference_code: &str) -> CardResult<Vec<u8>> {
        let Some(renderer) = &self.renderer else {
            return Err(CardError::Font("no card font configured".into()));
        };

        let photo = self.fetcher.fetch(&request.image_url).await?;
        let scene = layout::layout_card(
            request,
            Some((photo.width, photo.height)),
            &self.measure,
            reference_code,
        );

        let mut renderer = renderer
            .lock()
            .map_err(|_| CardError::Surface("renderer mutex poisoned".into()))?;
        renderer.render_png(&scene, Some(&photo))
    }
}
