use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{KnowledgeStore, MemoryError, Snippet};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Memoizes [`KnowledgeStore::retrieve`] results for a fixed time.
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<(String, usize), (Instant, Vec<Snippet>)>>,
}

impl<S: KnowledgeStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn cached(&self, key: &(String, usize)) -> Option<Vec<Snippet>> {
        let entries = self.entries.lock().ok()?;
        let (at, hits) = entries.get(key)?;
        (at.elapsed() < self.ttl).then(|| hits.clone())
    }
}

#[async_trait]
impl<S: KnowledgeStore> KnowledgeStore for CachedStore<S> {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Snippet>, MemoryError> {
        let key = (query.to_string(), k);
        if let Some(hits) = self.cached(&key) {
            return Ok(hits);
        }
        let hits = self.inner.retrieve(query, k).await?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, (at, _)| at.elapsed() < self.ttl);
            entries.insert(key, (Instant::now(), hits.clone()));
        }
        Ok(hits)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.inner.lookup(key)
    }
}
