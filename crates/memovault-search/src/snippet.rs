//! Bounded content excerpts around the best keyword match.
//!
//! The extractor anchors on the first adjacent keyword pair when the query
//! has several tokens, falling back to the first occurrence of the first
//! keyword. From the anchor it walks out to the enclosing paragraph (text
//! between blank-line or bullet boundaries) and the enclosing sentence, and
//! clips the window to [`SNIPPET_LIMIT`] characters. A trailing `...` marks a
//! truncated window; a window that reaches its text's end is left unmarked.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Character budget for one snippet.
pub const SNIPPET_LIMIT: usize = 100;

/// Anchors this close to the paragraph start just show the paragraph head.
const PARAGRAPH_HEAD_WINDOW: usize = 50;

/// Assumed match width when anchoring on an adjacent keyword pair.
const ADJACENT_MATCH_SPAN: usize = 40;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n|\n\s*\*").expect("valid paragraph-break regex"));

/// A run of text up to and including one sentence terminator, ASCII or
/// full-width. The tail of a paragraph without a terminator also matches.
static SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?。！？]+[.!?。！？]?").expect("valid sentence regex"));

/// Case-configurable matcher for one literal keyword.
pub(crate) fn literal_matcher(text: &str, case_sensitive: bool) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(text))
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

/// Matcher for two keywords adjacent in order, separated by optional
/// whitespace. Whitespace inside the keywords themselves is ignored, so the
/// phrase token `"hello world"` still pairs up against `helloworld`.
pub(crate) fn adjacent_pair_matcher(
    prev: &str,
    next: &str,
    case_sensitive: bool,
) -> Option<Regex> {
    let prev: String = prev.split_whitespace().collect();
    let next: String = next.split_whitespace().collect();
    if prev.is_empty() || next.is_empty() {
        return None;
    }
    let pattern = format!(r"{}\s*{}", regex::escape(&prev), regex::escape(&next));
    RegexBuilder::new(&pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

/// Window of `text` from byte offset `start`, clipped to `budget` characters,
/// with `...` appended only when text remains beyond the window.
fn clipped(text: &str, start: usize, budget: usize) -> String {
    let rest = &text[start..];
    match rest.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}...", &rest[..cut]),
        None => rest.to_string(),
    }
}

/// The trimmed paragraph containing byte offset `anchor`, with its start
/// offset in `content`. `None` when the anchor falls inside a paragraph
/// boundary or a whitespace-only segment.
fn paragraph_at(content: &str, anchor: usize) -> Option<(usize, &str)> {
    let mut prev_end = 0;
    for sep in PARAGRAPH_BREAK.find_iter(content) {
        if anchor < sep.start() {
            return trimmed_span(content, prev_end, sep.start());
        }
        if anchor < sep.end() {
            return None;
        }
        prev_end = sep.end();
    }
    trimmed_span(content, prev_end, content.len())
}

fn trimmed_span(content: &str, start: usize, end: usize) -> Option<(usize, &str)> {
    let seg = &content[start..end];
    let trimmed = seg.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = seg.len() - seg.trim_start().len();
    Some((start + lead, trimmed))
}

/// Build the snippet for a match of `match_len` characters starting at byte
/// offset `anchor`.
///
/// An anchor within the first [`PARAGRAPH_HEAD_WINDOW`] characters of its
/// paragraph yields the paragraph head; deeper anchors yield the window
/// starting at the enclosing sentence. Anchors outside any paragraph fall
/// back to the head of the whole content.
fn create_snippet(content: &str, anchor: usize, match_len: usize) -> String {
    let (para_start, para) = match paragraph_at(content, anchor) {
        Some(found) => found,
        None => return clipped(content, 0, SNIPPET_LIMIT),
    };

    let pos = anchor.saturating_sub(para_start).min(para.len());
    let chars_before = para[..pos].chars().count();
    if chars_before + match_len <= PARAGRAPH_HEAD_WINDOW {
        return clipped(para, 0, SNIPPET_LIMIT);
    }

    for sentence in SENTENCE.find_iter(para) {
        if sentence.start() <= pos && pos < sentence.end() {
            return clipped(para, sentence.start(), SNIPPET_LIMIT);
        }
    }
    clipped(para, pos, SNIPPET_LIMIT)
}

/// Extract a bounded excerpt of `content` around the best keyword match.
///
/// Anchor priority:
/// 1. the first adjacent keyword pair (order-preserving, optional or no
///    separator) when the query has two or more tokens,
/// 2. the first occurrence of the first keyword,
/// 3. no anchor: empty string (an empty keyword list instead yields the
///    leading slice of the content).
pub fn extract_snippet(content: &str, keywords: &[String], case_sensitive: bool) -> String {
    if keywords.is_empty() {
        return clipped(content, 0, SNIPPET_LIMIT);
    }
    if content.is_empty() {
        return String::new();
    }

    if keywords.len() > 1 {
        for pair in keywords.windows(2) {
            let matcher = match adjacent_pair_matcher(&pair[0], &pair[1], case_sensitive) {
                Some(matcher) => matcher,
                None => continue,
            };
            if let Some(m) = matcher.find(content) {
                let joined = keywords.join(" ").chars().count();
                return create_snippet(content, m.start(), joined.min(ADJACENT_MATCH_SPAN));
            }
        }
    }

    let matcher = match literal_matcher(&keywords[0], case_sensitive) {
        Some(matcher) => matcher,
        None => return String::new(),
    };
    match matcher.find(content) {
        Some(m) => create_snippet(content, m.start(), keywords[0].chars().count()),
        None => String::new(),
    }
}
