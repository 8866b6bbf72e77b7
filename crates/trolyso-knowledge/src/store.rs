//! In-memory knowledge base over one reference document.
//!
//! The chunk list is published as an immutable `Arc<Vec<Chunk>>` snapshot.
//! Reloads build a complete new list first and swap the pointer, so readers
//! always see either the old or the new document in full.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use trolyso_core::error::{Result, TroLySoError};

use crate::chunker::{Chunk, ChunkKind, chunk_document};
use crate::search::{ScoredChunk, search};

/// Indexing statistics for diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub chunk_count: usize,
    pub chapter_count: usize,
    pub min_chars: usize,
    pub max_chars: usize,
    pub avg_chars: f64,
    pub chapter_intros: usize,
    pub section_headers: usize,
    pub contents: usize,
    pub source: Option<String>,
    pub loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

struct Snapshot {
    chunks: Arc<Vec<Chunk>>,
    loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Shared, reloadable chunk index.
pub struct KnowledgeBase {
    source: Option<PathBuf>,
    current: RwLock<Arc<Snapshot>>,
}

impl KnowledgeBase {
    /// An empty knowledge base with no document source.
    pub fn empty() -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(Snapshot {
                chunks: Arc::new(Vec::new()),
                loaded_at: None,
            })),
        }
    }

    /// An empty knowledge base that loads from `path` on [`reload`](Self::reload).
    pub fn with_source(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            ..Self::empty()
        }
    }

    /// Index raw text directly (CLI and tests).
    pub fn from_text(text: &str) -> Self {
        let kb = Self::empty();
        kb.publish(chunk_document(text));
        kb
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current chunk list. Cheap: clones a pointer.
    pub fn chunks(&self) -> Arc<Vec<Chunk>> {
        self.snapshot().chunks.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole chunk list atomically.
    pub fn publish(&self, chunks: Vec<Chunk>) {
        let next = Arc::new(Snapshot {
            chunks: Arc::new(chunks),
            loaded_at: Some(chrono::Utc::now()),
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Re-read and re-index the source document.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<usize> {
        let path = self
            .source
            .as_ref()
            .ok_or_else(|| TroLySoError::Knowledge("no document source configured".into()))?;

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            TroLySoError::Knowledge(format!("cannot read {}: {e}", path.display()))
        })?;

        let chunks = chunk_document(&text);
        let count = chunks.len();
        self.publish(chunks);
        tracing::info!(
            "📚 Indexed {} ({} chars) into {} chunks",
            path.display(),
            text.chars().count(),
            count
        );
        Ok(count)
    }

    /// Rank the current snapshot against `query`.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredChunk> {
        search(&self.chunks(), query, top_k)
    }

    /// Distinct chapter labels in document order.
    pub fn chapters(&self) -> Vec<String> {
        let chunks = self.chunks();
        let mut seen = HashSet::new();
        let mut chapters = Vec::new();
        for chunk in chunks.iter() {
            let label = chunk.chapter_label.as_str();
            if !label.is_empty() && seen.insert(label) {
                chapters.push(label.to_string());
            }
        }
        chapters
    }

    /// Chunks whose chapter label contains `needle` (case-insensitive).
    pub fn chunks_in_chapter(&self, needle: &str) -> Vec<Chunk> {
        let needle = needle.to_lowercase();
        self.chunks()
            .iter()
            .filter(|c| c.chapter_label.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot();
        let chunks = &snapshot.chunks;
        let mut stats = IndexStats {
            chunk_count: chunks.len(),
            chapter_count: self.chapters().len(),
            source: self.source.as_ref().map(|p| p.display().to_string()),
            loaded_at: snapshot.loaded_at,
            ..IndexStats::default()
        };
        if chunks.is_empty() {
            return stats;
        }

        let mut total = 0usize;
        stats.min_chars = usize::MAX;
        for chunk in chunks.iter() {
            let len = chunk.char_len();
            total += len;
            stats.min_chars = stats.min_chars.min(len);
            stats.max_chars = stats.max_chars.max(len);
            match chunk.kind {
                ChunkKind::ChapterIntro => stats.chapter_intros += 1,
                ChunkKind::SectionHeader => stats.section_headers += 1,
                ChunkKind::Content => stats.contents += 1,
            }
        }
        stats.avg_chars = total as f64 / chunks.len() as f64;
        stats
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::empty()
    }
}
