//! Short-lived cache for fully rendered pages.
//!
//! Entries are never invalidated by writes. A cached page is served until
//! its TTL runs out or the cache is cleared, so readers may see stale
//! content for up to one TTL after a change.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::{sync::RwLock, time::Instant};

use crate::paginator::PageRequest;

pub const INDEX_KEY_PREFIX: &str = "index_page";

/// Key under which a given page of the global feed is stored.
pub fn index_key(page: PageRequest) -> String {
    format!("{INDEX_KEY_PREFIX}:{page}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub content_type: String,
    pub body: String,
}

#[async_trait]
pub trait PageCache: Send + Sync {
    /// Stored page, unless it has expired.
    async fn get(&self, key: &str) -> Option<CachedPage>;

    async fn set(&self, key: &str, page: CachedPage, ttl: Duration);

    async fn clear(&self);
}

/// Process-local [`PageCache`]. Expiry follows the tokio clock, so a paused
/// runtime makes it fully deterministic.
#[derive(Default)]
pub struct MemoryPageCache {
    entries: RwLock<HashMap<String, (CachedPage, Instant)>>,
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> Option<CachedPage> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((page, expires_at)) if Instant::now() < *expires_at => {
                    tracing::debug!(key, "page cache hit");
                    return Some(page.clone());
                }
                Some(_) => {}
                None => {
                    tracing::debug!(key, "page cache miss");
                    return None;
                }
            }
        }

        // Expired: drop it so the next writer starts clean
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|(_, expires_at)| Instant::now() >= *expires_at)
        {
            entries.remove(key);
        }
        tracing::debug!(key, "page cache entry expired");
        None
    }

    /// Also sweeps every expired entry, so keys that are never read again
    /// do not pile up.
    async fn set(&self, key: &str, page: CachedPage, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, (_, expires_at)| now < *expires_at);
        if entries.len() < before {
            tracing::debug!(swept = before - entries.len(), "dropped expired pages");
        }

        entries.insert(key.to_string(), (page, now + ttl));
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
        tracing::debug!("page cache cleared");
    }
}
