//! # TroLySo Knowledge Base
//!
//! Keyword retrieval over a single long-form reference document.
//! No vector DB, no embeddings: the document is cut into chunks that remember
//! the chapter and section they came from, and queries are scored by which
//! structural field their keywords hit.
//!
//! ## How it works
//! ```text
//! User: "Cách tích hợp giấy phép lái xe vào VNeID?"
//!   ↓
//! extract_keywords → {"cách", "tích", "hợp", "giấy", "phép", "lái", "vneid"}
//!   ↓ chapter +3 / section +2 / content +1, app-name +5, short ×0.5
//! Top 3 chunks
//!   ↓
//! Prepended to the user's message as reference material
//! ```

pub mod chunker;
pub mod keywords;
pub mod search;
pub mod store;

pub use chunker::{Chunk, ChunkKind, chunk_document};
pub use keywords::extract_keywords;
pub use search::{ScoredChunk, search};
pub use store::{IndexStats, KnowledgeBase};
