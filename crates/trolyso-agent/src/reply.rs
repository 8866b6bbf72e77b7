//! Reply splitting for channels with a per-message size cap.
//!
//! Lines are packed greedily into parts. A line that cannot fit in a part of
//! its own is broken at spaces, and a single word longer than the cap is cut
//! at character boundaries. Lengths are counted in characters.

/// Text accumulated for one outgoing part, with its length in characters.
#[derive(Default)]
struct Part {
    text: String,
    chars: usize,
}

impl Part {
    fn fits(&self, extra: usize, max: usize) -> bool {
        self.chars + extra < max
    }

    fn push(&mut self, piece: &str, separator: char) {
        self.text.push_str(piece);
        self.text.push(separator);
        self.chars += piece.chars().count() + 1;
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Move the trimmed text into `parts` and start over.
    fn flush_into(&mut self, parts: &mut Vec<String>) {
        if !self.is_blank() {
            parts.push(self.text.trim().to_string());
        }
        *self = Part::default();
    }
}

/// Cut `word` into pieces of at most `max` characters.
fn hard_wrap(word: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in word.char_indices() {
        if count == max {
            pieces.push(&word[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&word[start..]);
    pieces
}

/// Split `text` into parts of at most `max_chars` characters each.
///
/// Blank parts are never produced. Text that already fits comes back as a
/// single trimmed part.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max = max_chars.max(1);
    let mut parts = Vec::new();
    let mut current = Part::default();

    for line in text.split('\n') {
        let line_chars = line.chars().count();
        if current.fits(line_chars, max) {
            current.push(line, '\n');
            continue;
        }

        current.flush_into(&mut parts);
        if line_chars <= max {
            current.push(line, '\n');
            continue;
        }

        // The line alone is too long: pack it word by word.
        let mut words = Part::default();
        for word in line.split(' ') {
            for piece in hard_wrap(word, max) {
                let piece_chars = piece.chars().count();
                if !words.fits(piece_chars, max) {
                    words.flush_into(&mut parts);
                }
                words.push(piece, ' ');
            }
        }
        // Leftover words open the next part so following lines can join them.
        current = Part::default();
        let tail = words.text.trim_end();
        if !tail.is_empty() {
            current.push(tail, '\n');
        }
    }

    current.flush_into(&mut parts);
    parts
}

/// Truncate to at most `max_chars` characters, for log previews.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_within(parts: &[String], max: usize) {
        for part in parts {
            assert!(
                part.chars().count() <= max,
                "part of {} chars exceeds {max}: {part:?}",
                part.chars().count()
            );
            assert!(!part.trim().is_empty());
        }
    }

    fn words_of(parts: &[String]) -> Vec<String> {
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_short_text_is_single_part() {
        let parts = split_message("Xin chào! Tôi có thể giúp gì cho bạn?\n", 2000);
        assert_eq!(parts, vec!["Xin chào! Tôi có thể giúp gì cho bạn?"]);
    }

    #[test]
    fn test_lines_are_packed_greedily() {
        let text = "dòng một\ndòng hai\ndòng ba\ndòng bốn";
        let parts = split_message(text, 18);
        assert_eq!(parts, vec!["dòng một\ndòng hai", "dòng ba\ndòng bốn"]);
    }

    #[test]
    fn test_long_reply_respects_limit_and_keeps_order() {
        let line = "Bước tiếp theo: mở ứng dụng VNeID, chọn mục ví giấy tờ và làm theo hướng dẫn.";
        let text = (1..=80)
            .map(|i| format!("{i}. {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.chars().count() > 2000);

        let parts = split_message(&text, 2000);
        assert!(parts.len() >= 3);
        assert_within(&parts, 2000);
        assert_eq!(words_of(&parts), words_of(&[text]));
        assert!(parts[0].starts_with("1. "));
        assert!(parts.last().unwrap().ends_with("làm theo hướng dẫn."));
    }

    #[test]
    fn test_overlong_line_breaks_at_spaces() {
        let line = "giấy tờ ".repeat(30);
        let parts = split_message(line.trim_end(), 40);
        assert!(parts.len() > 1);
        assert_within(&parts, 40);
        for part in &parts {
            assert!(part.split(' ').all(|w| w == "giấy" || w == "tờ"));
        }
    }

    #[test]
    fn test_overlong_word_is_hard_cut() {
        let url = format!("https://dichvucong.gov.vn/{}", "a".repeat(120));
        let parts = split_message(&url, 50);
        assert_within(&parts, 50);
        assert_eq!(parts.concat(), url);
    }

    #[test]
    fn test_leftover_words_join_next_line() {
        let text = format!("{}\nhết", "ab ".repeat(5).trim_end());
        let parts = split_message(&text, 8);
        assert_within(&parts, 8);
        assert_eq!(parts, vec!["ab ab", "ab ab", "ab\nhết"]);
    }

    #[test]
    fn test_blank_lines_never_become_parts() {
        let text = format!("{}\n\n\n\n{}", "x".repeat(10), "y".repeat(10));
        let parts = split_message(&text, 10);
        assert_eq!(parts, vec!["x".repeat(10), "y".repeat(10)]);
        assert!(split_message("\n\n  \n", 10).is_empty());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 9 characters, 13 bytes.
        let text = "đăng nhập";
        assert_eq!(split_message(text, 9), vec!["đăng nhập"]);
        assert_eq!(hard_wrap("ứng", 1), vec!["ứ", "n", "g"]);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("Xin chào", 3), "Xin");
        assert_eq!(preview("đ", 3), "đ");
        assert_eq!(preview("ứng dụng", 2), "ứn");
    }
}
