//! Structural document chunker.
//!
//! A single forward pass over the non-blank lines of an extracted document.
//! Chapter and section headings become their own chunks and label every
//! chunk that follows them; ordinary lines are buffered into content chunks
//! of bounded size.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Content buffers longer than this (in characters) are flushed early.
pub const MAX_CONTENT_CHARS: usize = 1500;

/// A chapter heading: the chapter marker followed by a colon on the same line.
static CHAPTER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Chương|CHƯƠNG)[^:]*:").expect("valid chapter regex"));

/// A numbered section heading such as `1.1 Tổng quan` or `2.3. Đăng nhập`.
static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.?\s").expect("valid section regex"));

/// How a chunk was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    ChapterIntro,
    SectionHeader,
    Content,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::ChapterIntro => "chapter_intro",
            ChunkKind::SectionHeader => "section_header",
            ChunkKind::Content => "content",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled unit of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Most recent chapter heading, empty before the first one.
    pub chapter_label: String,
    /// Most recent section heading within the current chapter.
    pub section_label: String,
    /// Literal text; for header chunks the heading line itself.
    pub content: String,
    pub kind: ChunkKind,
}

impl Chunk {
    /// Length of `content` in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

pub fn is_chapter_header(line: &str) -> bool {
    CHAPTER_HEADER.is_match(line)
}

pub fn is_section_header(line: &str) -> bool {
    SECTION_HEADER.is_match(line)
}

/// Running state of the forward pass.
#[derive(Default)]
struct Scanner {
    chunks: Vec<Chunk>,
    chapter: String,
    section: String,
    buffer: String,
    buffer_chars: usize,
}

impl Scanner {
    fn flush(&mut self) {
        let content = self.buffer.trim();
        if !content.is_empty() {
            self.chunks.push(Chunk {
                chapter_label: self.chapter.clone(),
                section_label: self.section.clone(),
                content: content.to_string(),
                kind: ChunkKind::Content,
            });
        }
        self.buffer.clear();
        self.buffer_chars = 0;
    }

    fn emit_header(&mut self, line: &str, kind: ChunkKind) {
        self.chunks.push(Chunk {
            chapter_label: self.chapter.clone(),
            section_label: self.section.clone(),
            content: line.to_string(),
            kind,
        });
    }

    fn feed(&mut self, line: &str) {
        if is_chapter_header(line) {
            self.flush();
            self.chapter = line.to_string();
            self.section.clear();
            self.emit_header(line, ChunkKind::ChapterIntro);
        } else if is_section_header(line) {
            self.flush();
            self.section = line.to_string();
            self.emit_header(line, ChunkKind::SectionHeader);
        } else {
            self.buffer.push_str(line);
            self.buffer.push('\n');
            self.buffer_chars += line.chars().count() + 1;
            if self.buffer_chars > MAX_CONTENT_CHARS {
                self.flush();
            }
        }
    }
}

/// Split raw document text into ordered, labeled chunks.
pub fn chunk_document(text: &str) -> Vec<Chunk> {
    let mut scanner = Scanner::default();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        scanner.feed(line);
    }
    scanner.flush();
    scanner.chunks
}
