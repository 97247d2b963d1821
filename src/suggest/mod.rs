use crate::models::chat::SuggestionSet;

/// Marker phrases separating the follow-up sections of a model response.
/// Matched case-insensitively; the last occurrence of each wins, so a later
/// section overrides an earlier incidental mention of the phrase.
pub const SPECIFIC_MARKER: &str = "useful things you can ask next:";
pub const GENERAL_MARKER: &str = "more growth questions:";

const MAX_PER_LIST: usize = 3;
const MIN_QUESTION_LEN: usize = 5;

pub fn default_suggestions() -> SuggestionSet {
    SuggestionSet {
        specific: vec![
            "🚀 How do I increase my revenue?".to_string(),
            "Analyze Social traffic breakdown".to_string(),
            "Fix LCP speed score".to_string()
        ],
        general: vec![
            "What is my next growth action?".to_string(),
            "Do I need a developer?".to_string()
        ],
    }
}

/// Last case-insensitive occurrence of an ASCII needle. Byte indexes from
/// the match are valid char boundaries in the original text because the
/// needle itself is pure ASCII.
fn rfind_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len()).rev().find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

fn strip_wrapping_quotes(line: &str) -> &str {
    let quotes = ['"', '\'', '“', '”'];
    let mut out = line;
    while let Some(rest) = quotes.iter().find_map(|q| out.strip_prefix(*q)) {
        out = rest;
    }
    while let Some(rest) = quotes.iter().find_map(|q| out.strip_suffix(*q)) {
        out = rest;
    }
    out
}

fn clean_line(line: &str) -> String {
    let stripped = line
        .trim()
        .trim_start_matches(|c: char| {
            matches!(c, '-' | '*' | '•' | '.' | '#') || c.is_ascii_digit() || c.is_whitespace()
        });
    strip_wrapping_quotes(stripped).trim().to_string()
}

/// Keeps the first three question-shaped lines of a slice, in order.
fn extract_questions(section: &str) -> Vec<String> {
    section
        .lines()
        .map(clean_line)
        .filter(|line| line.ends_with('?') && line.len() > MIN_QUESTION_LEN)
        .take(MAX_PER_LIST)
        .collect()
}

/// Derives the two capped follow-up lists from free-text model output.
/// Never fails: when neither marker yields a qualifying line, the fixed
/// default set is substituted. Marker order is untrusted; when the general
/// marker precedes the specific one, the specific slice runs to end-of-text.
pub fn extract_suggestions(text: &str) -> SuggestionSet {
    let specific_idx = rfind_ignore_case(text, SPECIFIC_MARKER);
    let general_idx = rfind_ignore_case(text, GENERAL_MARKER);

    let mut specific = Vec::new();
    let mut general = Vec::new();

    if let Some(s_idx) = specific_idx {
        let start = s_idx + SPECIFIC_MARKER.len();
        let end = match general_idx {
            Some(g_idx) if g_idx >= start => g_idx,
            _ => text.len(),
        };
        specific = extract_questions(&text[start..end]);
    }

    if let Some(g_idx) = general_idx {
        general = extract_questions(&text[g_idx + GENERAL_MARKER.len()..]);
    }

    if specific.is_empty() && general.is_empty() {
        return default_suggestions();
    }

    SuggestionSet { specific, general }
}
