//! Keyword extraction for mixed Vietnamese / English queries.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Tokens of this many characters or fewer carry no signal.
const MIN_TOKEN_CHARS: usize = 3;

/// Function words ignored during scoring. Only words longer than
/// `MIN_TOKEN_CHARS - 1` need listing; shorter ones are dropped anyway.
static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Vietnamese
        "của", "các", "những", "được", "cho", "với", "này", "khi", "thì", "một",
        "không", "trong", "như", "tôi", "bạn", "mình", "chúng", "vậy", "thế",
        "nào", "đâu", "rồi", "nhé", "nhỉ", "giúp", "xin", "chào", "cảm", "muốn",
        "cần", "phải", "hãy", "vào", "đến", "hay", "hoặc", "nếu", "thể", "đang",
        "cũng", "nhưng", "còn", "lại", "rất", "nên", "theo", "việc", "người",
        "sau", "trước", "làm", "sao",
        // English
        "the", "and", "for", "with", "this", "that", "what", "how", "are", "was",
        "were", "can", "you", "your", "from", "have", "has", "not", "but", "about",
        "please", "into", "there", "which", "when", "where", "why", "who", "does",
        "did", "will", "would", "should", "could", "them", "they", "their", "our",
        "its", "then", "than", "also", "any", "all", "help", "want", "need",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Lower-cased, whitespace-split terms worth matching on.
pub fn extract_keywords(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .filter(|token| !is_stopword(token))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_vietnamese_query() {
        let kw = extract_keywords("vneid tích hợp giấy phép lái xe");
        assert_eq!(kw, set(&["vneid", "tích", "hợp", "giấy", "phép", "lái"]));
    }

    #[test]
    fn test_lowercases_and_dedups() {
        let kw = extract_keywords("VNeID vneid VNEID");
        assert_eq!(kw, set(&["vneid"]));
    }

    #[test]
    fn test_drops_short_numeric_and_stopwords() {
        let kw = extract_keywords("How do I pay 2024 tax on the ETAX portal của tôi");
        assert_eq!(kw, set(&["pay", "tax", "etax", "portal"]));
    }

    #[test]
    fn test_mixed_alphanumeric_token_is_kept() {
        let kw = extract_keywords("mức 2 level2 123");
        assert_eq!(kw, set(&["mức", "level2"]));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   \n\t ").is_empty());
    }
}
