//! Demo loop: sync both streams, compose and dispatch one share card,
//! then run a couple of background poll ticks.

use std::sync::Arc;

use cdlt_news::content::generator::generator_from_env;
use cdlt_news::{
    AppConfig, ContentSyncCache, FileStore, ShareCardCompositor, ShareRequest, ShareTarget,
};
use cdlt_news::share::dispatch::ShareDispatch;

#[tokio::main]
async fn main() {
    // .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cdlt_news=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::from_env();
    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let cache = ContentSyncCache::new(&config, store, generator_from_env());

    let (stories, articles) = cache.sync_all(false).await;
    println!("synced: {} stories, {} articles", stories.len(), articles.len());

    if let Some(article) = articles.first() {
        let compositor = ShareCardCompositor::new(&config);
        let dispatch = ShareDispatch::from_env(&config);

        let request = ShareRequest {
            title: article.title.clone(),
            category: article
                .category
                .clone()
                .unwrap_or_else(|| "GLOBAL".to_string()),
            lead_paragraph: article.summary.clone(),
            time_label: article.date_label.clone(),
            author: article.author.clone(),
            image_url: article.image_url.clone(),
        };
        let result = compositor.compose(&request).await;
        println!(
            "composed card {} ({} bytes of PNG)",
            result.reference_code,
            result.image_png.as_ref().map_or(0, |b| b.len())
        );
        let report = dispatch.dispatch(ShareTarget::Messaging, &result).await;
        println!("dispatch report: {report:?}");
    }

    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(config.poll_period_ms));
    ticker.tick().await; // first tick fires immediately
    for _ in 0..2 {
        ticker.tick().await;
        let (stories, articles) = cache.sync_all(false).await;
        println!("poll tick: {} stories, {} articles", stories.len(), articles.len());
    }

    println!("sync-demo done");
}
