//! Keyword-weighted relevance ranking.
//!
//! Every query keyword is matched as a substring against three fields of a
//! chunk, weighted by how structural the field is:
//!
//! | Field | Bonus |
//! |---|---|
//! | chapter label | +3 |
//! | section label | +2 |
//! | content | +1 |
//!
//! Queries that name a known application get an extra +5 on chunks whose
//! chapter is about that application. Fragment-sized chunks are halved.

use serde::Serialize;
use std::collections::HashSet;

use crate::chunker::Chunk;
use crate::keywords::extract_keywords;

pub const CHAPTER_WEIGHT: f64 = 3.0;
pub const SECTION_WEIGHT: f64 = 2.0;
pub const CONTENT_WEIGHT: f64 = 1.0;

/// Chunks with fewer content characters than this are penalized.
pub const SHORT_CONTENT_CHARS: usize = 50;
pub const SHORT_CONTENT_FACTOR: f64 = 0.5;

/// Application names (lower-case) and the bonus they earn when both the query
/// and the chunk's chapter mention them.
pub const APP_BOOSTS: &[(&str, f64)] = &[
    ("vneid", 5.0),
    ("vssid", 5.0),
    ("etax", 5.0),
    ("dịch vụ công", 5.0),
    ("sổ tay đảng viên", 5.0),
];

/// A chunk with its relevance to one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f64,
}

/// Score a single chunk. `query_lower` must already be lower-cased and
/// `keywords` extracted from it.
pub fn score_chunk(chunk: &Chunk, query_lower: &str, keywords: &HashSet<String>) -> f64 {
    let chapter = chunk.chapter_label.to_lowercase();
    let section = chunk.section_label.to_lowercase();
    let content = chunk.content.to_lowercase();

    let mut score = 0.0;
    for keyword in keywords {
        if chapter.contains(keyword.as_str()) {
            score += CHAPTER_WEIGHT;
        }
        if section.contains(keyword.as_str()) {
            score += SECTION_WEIGHT;
        }
        if content.contains(keyword.as_str()) {
            score += CONTENT_WEIGHT;
        }
    }

    for (app, bonus) in APP_BOOSTS {
        if query_lower.contains(app) && chapter.contains(app) {
            score += bonus;
        }
    }

    if chunk.char_len() < SHORT_CONTENT_CHARS {
        score *= SHORT_CONTENT_FACTOR;
    }
    score
}

/// Rank `chunks` against `query` and keep the best `top_k`.
///
/// Chunks without any overlap are dropped. Equal scores keep document order.
pub fn search(chunks: &[Chunk], query: &str, top_k: usize) -> Vec<ScoredChunk> {
    if chunks.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let query_lower = query.to_lowercase();
    let keywords = extract_keywords(&query_lower);

    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .filter_map(|chunk| {
            let score = score_chunk(chunk, &query_lower, &keywords);
            (score > 0.0).then(|| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
        })
        .collect();

    // sort_by is stable: ties stay in document order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{ChunkKind, chunk_document};

    const FILLER: &str = "Thông tin bổ sung dành cho người dùng, không liên quan tới truy vấn.";

    fn chunk(chapter: &str, section: &str, content: &str) -> Chunk {
        Chunk {
            chapter_label: chapter.into(),
            section_label: section.into(),
            content: content.into(),
            kind: ChunkKind::Content,
        }
    }

    fn sample_document() -> Vec<Chunk> {
        chunk_document(
            "\
Chương 1: Ứng dụng VNeID
1.1 Tích hợp giấy tờ
Để tích hợp giấy phép lái xe, mở ví giấy tờ và chọn tích hợp thông tin.
1.2 Khai báo tạm trú
Chọn thủ tục hành chính, sau đó chọn khai báo tạm trú và điền thông tin.
Chương 2: Ứng dụng VssID
2.1 Tra cứu quá trình tham gia bảo hiểm
Đăng nhập VssID, chọn quản lý cá nhân để xem quá trình tham gia bảo hiểm xã hội.
Chương 3: Cổng Dịch vụ công quốc gia
3.1 Nộp hồ sơ trực tuyến
Tìm thủ tục cần thực hiện, điền tờ khai và đính kèm giấy tờ theo hướng dẫn.",
        )
    }

    #[test]
    fn test_empty_chunks_returns_empty() {
        assert!(search(&[], "vneid", 3).is_empty());
        assert!(search(&[], "", 0).is_empty());
    }

    #[test]
    fn test_zero_top_k_returns_empty() {
        assert!(search(&sample_document(), "vneid", 0).is_empty());
    }

    #[test]
    fn test_results_bounded_sorted_and_positive() {
        let chunks = sample_document();
        for query in ["tích hợp giấy phép lái xe vneid", "bảo hiểm xã hội", "thủ tục", "nộp hồ sơ"] {
            for top_k in [1, 2, 3, 10] {
                let results = search(&chunks, query, top_k);
                assert!(results.len() <= top_k);
                assert!(results.iter().all(|r| r.score > 0.0));
                assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }

    #[test]
    fn test_search_is_idempotent() {
        let chunks = sample_document();
        let first = search(&chunks, "khai báo tạm trú trên vneid", 3);
        let second = search(&chunks, "khai báo tạm trú trên vneid", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_overlap_returns_empty() {
        let chunks = sample_document();
        assert!(search(&chunks, "zzzz qqqq", 3).is_empty());
        assert!(search(&chunks, "", 3).is_empty());
    }

    #[test]
    fn test_vneid_scenario_scores_chapter_and_app_bonus() {
        let target = chunk("Chương 2: Ứng dụng VNeID", "", FILLER);
        let results = search(&[target], "vneid tích hợp giấy phép lái xe", 3);
        assert_eq!(results.len(), 1);
        // +3 chapter match on "vneid", +5 app-name bonus; filler adds nothing.
        assert!(results[0].score >= 8.0);
        assert_eq!(results[0].score, 8.0);
    }

    #[test]
    fn test_short_content_is_halved() {
        let content = "Xem hướng dẫn ở trang kế tiếp.";
        assert_eq!(content.chars().count(), 30);
        let target = chunk("Chương 4: Hướng dẫn chung", "", content);
        // chapter +3, content +1 = 4, halved for being under 50 characters.
        let results = search(&[target], "hướng", 1);
        assert_eq!(results[0].score, 2.0);
    }

    #[test]
    fn test_field_weights_accumulate() {
        let target = chunk("Chương 5: Thuế điện tử", "5.1 Quyết toán thuế", FILLER);
        let query = "thuế";
        let keywords = extract_keywords(query);
        // chapter +3, section +2, content has no "thuế".
        assert_eq!(score_chunk(&target, query, &keywords), 5.0);
    }

    #[test]
    fn test_app_bonus_requires_chapter_match() {
        let in_chapter = chunk("Chương 6: ETAX", "", FILLER);
        let in_content = chunk("Chương 7: Khác", "", &format!("{FILLER} etax"));
        let query = "etax";
        let keywords = extract_keywords(query);
        assert_eq!(score_chunk(&in_chapter, query, &keywords), 8.0);
        assert_eq!(score_chunk(&in_content, query, &keywords), 1.0);
    }

    #[test]
    fn test_multiple_app_names_are_cumulative() {
        let target = chunk("Chương 8: Liên thông VNeID và VssID", "", FILLER);
        let query = "vneid vssid";
        let keywords = extract_keywords(query);
        // two chapter hits (+6) and two app bonuses (+10)
        assert_eq!(score_chunk(&target, query, &keywords), 16.0);
    }

    #[test]
    fn test_multiword_app_name_boost() {
        let target = chunk("Chương 3: Cổng Dịch vụ công quốc gia", "", FILLER);
        let query = "nộp trên dịch vụ công";
        let keywords = extract_keywords(query);
        // "nộp" and "trên" miss; "dịch" and "công" hit the chapter (+6); app bonus +5.
        assert_eq!(score_chunk(&target, query, &keywords), 11.0);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let chunks = vec![
            chunk("", "", &format!("{FILLER} alpha một")),
            chunk("", "", &format!("{FILLER} alpha hai")),
            chunk("", "", &format!("{FILLER} alpha ba")),
        ];
        let results = search(&chunks, "alpha", 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.content.ends_with("một"));
        assert!(results[1].chunk.content.ends_with("hai"));
    }

    #[test]
    fn test_best_chunk_wins_for_realistic_query() {
        let chunks = sample_document();
        let results = search(&chunks, "tích hợp giấy phép lái xe vào vneid", 3);
        let best = &results[0];
        assert_eq!(best.chunk.kind, ChunkKind::Content);
        assert_eq!(best.chunk.section_label, "1.1 Tích hợp giấy tờ");
    }
}
