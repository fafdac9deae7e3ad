//! Tiered dispatch: fall through unavailable/cancelled/erroring sinks,
//! stop at the first success, report exhaustion without erroring.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use cdlt_news::card::ShareResult;
use cdlt_news::share::dispatch::{
    DispatchReport, ShareDispatch, SharePayload, ShareSink, ShareTarget, SinkOutcome,
};
use cdlt_news::share::webhook::WebhookSink;

enum MockBehavior {
    Outcome(SinkOutcome),
    Error,
}

struct MockSink {
    name: &'static str,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockSink {
    fn new(name: &'static str, behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ShareSink for MockSink {
    async fn deliver(&self, _payload: &SharePayload<'_>) -> anyhow::Result<SinkOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Outcome(o) => Ok(o.clone()),
            MockBehavior::Error => Err(anyhow!("transport broke")),
        }
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

fn result() -> ShareResult {
    ShareResult {
        image_png: Some(vec![0x89, 0x50, 0x4e, 0x47]),
        caption_text: "🔴 *NOTICIA: TEST*".into(),
        reference_code: "AB12CD34".into(),
    }
}

fn dispatch_with_messaging(tiers: Vec<Arc<dyn ShareSink>>) -> ShareDispatch {
    ShareDispatch::new(tiers, Vec::new(), Vec::new())
}

#[tokio::test]
async fn first_success_stops_the_cascade() {
    let unavailable = MockSink::new("a", MockBehavior::Outcome(SinkOutcome::Unavailable));
    let delivered = MockSink::new("b", MockBehavior::Outcome(SinkOutcome::Delivered));
    let never = MockSink::new("c", MockBehavior::Outcome(SinkOutcome::Delivered));

    let dispatch = dispatch_with_messaging(vec![
        unavailable.clone(),
        delivered.clone(),
        never.clone(),
    ]);
    let report = dispatch.dispatch(ShareTarget::Messaging, &result()).await;

    assert_eq!(report, DispatchReport::Delivered { sink: "b" });
    assert_eq!(unavailable.calls(), 1);
    assert_eq!(delivered.calls(), 1);
    assert_eq!(never.calls(), 0);
}

#[tokio::test]
async fn cancellation_is_not_a_hard_stop() {
    let cancelled = MockSink::new("native", MockBehavior::Outcome(SinkOutcome::Cancelled));
    let link = MockSink::new(
        "link",
        MockBehavior::Outcome(SinkOutcome::Link("https://wa.me/?text=x".into())),
    );

    let dispatch = dispatch_with_messaging(vec![cancelled.clone(), link]);
    let report = dispatch.dispatch(ShareTarget::Messaging, &result()).await;

    assert_eq!(cancelled.calls(), 1);
    assert_eq!(
        report,
        DispatchReport::Link {
            sink: "link",
            url: "https://wa.me/?text=x".into()
        }
    );
}

#[tokio::test]
async fn sink_errors_fall_through_to_the_next_tier() {
    let broken = MockSink::new("broken", MockBehavior::Error);
    let delivered = MockSink::new("ok", MockBehavior::Outcome(SinkOutcome::Delivered));

    let dispatch = dispatch_with_messaging(vec![broken.clone(), delivered]);
    let report = dispatch.dispatch(ShareTarget::Messaging, &result()).await;
    assert_eq!(report, DispatchReport::Delivered { sink: "ok" });
}

#[tokio::test]
async fn exhaustion_is_a_report_not_an_error() {
    let a = MockSink::new("a", MockBehavior::Outcome(SinkOutcome::Unavailable));
    let b = MockSink::new("b", MockBehavior::Error);

    let dispatch = dispatch_with_messaging(vec![a, b]);
    let report = dispatch.dispatch(ShareTarget::Messaging, &result()).await;
    assert_eq!(report, DispatchReport::Exhausted);
}

#[tokio::test]
async fn empty_tier_list_exhausts_immediately() {
    let dispatch = dispatch_with_messaging(Vec::new());
    let report = dispatch.dispatch(ShareTarget::Messaging, &result()).await;
    assert_eq!(report, DispatchReport::Exhausted);
}

#[tokio::test]
async fn rich_webhook_without_image_or_url_reports_unavailable() {
    let payload_no_image = ShareResult {
        image_png: None,
        ..result()
    };

    // Configured URL but no image: the rich tier bows out without network IO.
    let rich = WebhookSink::new(Some("https://hooks.example/share".into())).with_attachment(true);
    let outcome = rich
        .deliver(&SharePayload {
            caption_text: &payload_no_image.caption_text,
            image_png: payload_no_image.image_png.as_deref(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, SinkOutcome::Unavailable);

    // No URL configured at all.
    let unconfigured = WebhookSink::new(None);
    let outcome = unconfigured
        .deliver(&SharePayload {
            caption_text: "x",
            image_png: None,
        })
        .await
        .unwrap();
    assert_eq!(outcome, SinkOutcome::Unavailable);
}
