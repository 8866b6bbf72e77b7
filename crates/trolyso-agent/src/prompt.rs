//! Prompt composition and the fixed replies sent to users.

use trolyso_knowledge::ScoredChunk;

/// Sent when an inbound message carries no usable text.
pub const TEXT_ONLY_REPLY: &str = "Xin lỗi, tôi chỉ có thể xử lý tin nhắn văn bản. Bạn có thể gửi câu hỏi bằng chữ để tôi hỗ trợ bạn nhé! 😊";

/// Sent once when a reply could not be produced.
pub const APOLOGY_REPLY: &str = "Xin lỗi, hiện tại tôi đang gặp sự cố kỹ thuật. Bạn vui lòng thử lại sau ít phút nhé! 🙏";

/// Render retrieved chunks as a numbered reference block.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    let mut out = String::from("THÔNG TIN THAM KHẢO TỪ TÀI LIỆU HƯỚNG DẪN:\n");
    for (i, scored) in chunks.iter().enumerate() {
        let chunk = &scored.chunk;
        out.push_str(&format!("\n[Tài liệu tham khảo {}]\n", i + 1));
        if !chunk.chapter_label.is_empty() {
            out.push_str(&format!("Chương: {}\n", chunk.chapter_label));
        }
        if !chunk.section_label.is_empty() {
            out.push_str(&format!("Mục: {}\n", chunk.section_label));
        }
        out.push_str(&format!("Nội dung: {}\n", chunk.content));
        out.push_str(&format!("Độ liên quan: {:.1}\n", scored.score));
    }
    out
}

/// The message actually sent to the backend: reference block first when
/// anything relevant was found, the user's words otherwise.
pub fn compose_message(chunks: &[ScoredChunk], user_message: &str) -> String {
    if chunks.is_empty() {
        return user_message.to_string();
    }
    format!(
        "{}\nCÂU HỎI CỦA NGƯỜI DÙNG: {user_message}",
        format_context(chunks)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use trolyso_knowledge::{Chunk, ChunkKind};

    fn scored(chapter: &str, section: &str, content: &str, score: f64) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                chapter_label: chapter.into(),
                section_label: section.into(),
                content: content.into(),
                kind: ChunkKind::Content,
            },
            score,
        }
    }

    #[test]
    fn test_no_chunks_passes_message_through() {
        assert_eq!(compose_message(&[], "Cách đăng ký VNeID?"), "Cách đăng ký VNeID?");
    }

    #[test]
    fn test_context_lists_every_chunk_in_rank_order() {
        let chunks = vec![
            scored("Chương 1: VNeID", "1.1 Đăng ký", "Tải ứng dụng VNeID.", 8.0),
            scored("Chương 2: VssID", "", "Đăng nhập VssID.", 2.5),
        ];
        let msg = compose_message(&chunks, "đăng ký thế nào?");

        let first = msg.find("[Tài liệu tham khảo 1]").unwrap();
        let second = msg.find("[Tài liệu tham khảo 2]").unwrap();
        assert!(first < second);
        assert!(msg.contains("Chương: Chương 1: VNeID"));
        assert!(msg.contains("Mục: 1.1 Đăng ký"));
        assert!(msg.contains("Nội dung: Tải ứng dụng VNeID."));
        assert!(msg.contains("Độ liên quan: 8.0"));
        assert!(msg.contains("Độ liên quan: 2.5"));
        assert!(msg.ends_with("CÂU HỎI CỦA NGƯỜI DÙNG: đăng ký thế nào?"));
    }

    #[test]
    fn test_empty_labels_are_omitted() {
        let block = format_context(&[scored("", "", "Lời nói đầu.", 1.0)]);
        assert!(!block.contains("Chương:"));
        assert!(!block.contains("Mục:"));
        assert!(block.contains("Nội dung: Lời nói đầu."));
    }
}
