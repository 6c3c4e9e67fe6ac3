//! Evidence span extraction.

/// At most `window` whitespace-separated words of `doc_text`, starting
/// `window / 2` words before the first query word that occurs in the
/// document (case-insensitive, whole words). Falls back to the start of the
/// document when no query word occurs.
pub fn extract_span(doc_text: &str, query: &str, window: usize) -> String {
    let words: Vec<&str> = doc_text.split_whitespace().collect();
    let lower_words: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let query = query.to_lowercase();

    let anchor = query
        .split_whitespace()
        .find_map(|q| lower_words.iter().position(|w| w == q))
        .unwrap_or(0);

    let start = anchor.saturating_sub(window / 2);
    let end = words.len().min(start + window);
    if start >= end {
        return String::new();
    }
    words[start..end].join(" ")
}
