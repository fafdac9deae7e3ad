// src/lib.rs
// Public library surface for the CDLT NEWS core: content sync/cache,
// share-card composition, and the share dispatch cascade.

pub mod card;
pub mod config;
pub mod content;
pub mod share;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::card::{ShareCardCompositor, ShareRequest, ShareResult};
pub use crate::config::{AppConfig, StreamConfig};
pub use crate::content::sync::ContentSyncCache;
pub use crate::content::types::{ArticleItem, ContentCacheEnvelope, SourceRef, StoryItem};
pub use crate::share::dispatch::{DispatchReport, ShareDispatch, ShareTarget};
pub use crate::store::{FileStore, KvStore, MemoryStore, SharedStore};
