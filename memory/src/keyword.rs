use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{KnowledgeStore, MemoryError, Snippet};

pub const CHUNK_SIZE: usize = 500;
pub const CHUNK_OVERLAP: usize = 50;

/// File holding instant entries, a JSON object of key to text.
pub const ENTRIES_FILE: &str = "instant.json";

struct Chunk {
    source: String,
    text: String,
    terms: HashSet<String>,
}

/// Term-overlap search over chunked text documents.
#[derive(Default)]
pub struct KeywordStore {
    chunks: Vec<Chunk>,
    entries: HashMap<String, String>,
}

impl KeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.txt` file in `dir`, plus [`ENTRIES_FILE`] if present.
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let dir = dir.as_ref();
        let mut store = Self::new();
        let mut files = Vec::new();
        let mut listing = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = listing.next_entry().await? {
            files.push(entry.path());
        }
        files.sort();

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if name == ENTRIES_FILE {
                let raw = tokio::fs::read_to_string(&path).await?;
                let entries: HashMap<String, String> = serde_json::from_str(&raw)?;
                store.entries.extend(entries);
            } else if path.extension().is_some_and(|ext| ext == "txt") {
                let text = tokio::fs::read_to_string(&path).await?;
                store.add_document(name, &text);
            }
        }
        info!(
            dir = %dir.display(),
            chunks = store.chunks.len(),
            entries = store.entries.len(),
            "knowledge loaded"
        );
        Ok(store)
    }

    pub fn add_document(&mut self, source: impl Into<String>, text: &str) {
        let source = source.into();
        for piece in chunk(text, CHUNK_SIZE, CHUNK_OVERLAP) {
            self.chunks.push(Chunk {
                source: source.clone(),
                terms: terms(&piece),
                text: piece,
            });
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(key.into(), text.into());
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn search(&self, query: &str, k: usize) -> Vec<Snippet> {
        let wanted = terms(query);
        if wanted.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (i, wanted.intersection(&c.terms).count()))
            .filter(|(_, hits)| *hits > 0)
            .collect();
        // stable: equal scores keep document order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
            .into_iter()
            .take(k)
            .map(|(i, hits)| Snippet {
                source: self.chunks[i].source.clone(),
                text: self.chunks[i].text.clone(),
                score: hits as f32 / wanted.len() as f32,
            })
            .collect()
    }
}

#[async_trait]
impl KnowledgeStore for KeywordStore {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Snippet>, MemoryError> {
        let hits = self.search(query, k);
        debug!(query, hits = hits.len(), "keyword retrieve");
        Ok(hits)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Split `text` into windows of `size` chars sharing `overlap` chars.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        if !piece.trim().is_empty() {
            out.push(piece.trim().to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}
