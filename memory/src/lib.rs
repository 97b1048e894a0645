//! Game knowledge the agent can consult while deciding.
//!
//! A [`KnowledgeStore`] answers two kinds of question: a ranked search over
//! free text, and an instant lookup keyed by a pre-classified situation.
//! [`KeywordStore`] is a small in-process store built from text files;
//! [`CachedStore`] puts a TTL cache in front of any store.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod cache;
pub mod keyword;

pub use cache::CachedStore;
pub use keyword::KeywordStore;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed entries file: {0}")]
    Entries(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snippet {
    pub source: String,
    pub text: String,
    pub score: f32,
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Up to `k` snippets relevant to `query`, best first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Snippet>, MemoryError>;

    /// Canned guidance registered under `key`.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Store that knows nothing. Used when no knowledge directory is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeStore for NoKnowledge {
    async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Snippet>, MemoryError> {
        Ok(Vec::new())
    }

    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}
