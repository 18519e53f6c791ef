//! Tag extraction from note content.
//!
//! Tags come from two places:
//! 1. YAML front-matter `tags:` entries, in either the inline-array form
//!    (`tags: [a, b]`) or the dash-list form (`tags:` followed by `- a` lines)
//! 2. Inline `#tag` markers anywhere in the body
//!
//! Every returned tag carries a leading `#`, quotes are stripped, and
//! duplicates are removed preserving first-seen order (front-matter tags
//! before inline ones).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static FRONTMATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^---\s*\n(.*?)\n\s*---").expect("valid frontmatter regex"));

static TAGS_INLINE_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"tags\s*:\s*\[(.*?)\]").expect("valid inline-array regex"));

static TAGS_DASH_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"tags\s*:\s*\n((?:[ \t]*-.*\n?)+)").expect("valid dash-list regex"));

static DASH_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*-[ \t]*([^\n]+)").expect("valid dash-item regex"));

static INLINE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[^\s#]+").expect("valid inline-tag regex"));

fn normalize(raw: &str) -> Option<String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '\'' && *c != '"').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.starts_with('#') {
        Some(cleaned.to_string())
    } else {
        Some(format!("#{cleaned}"))
    }
}

/// Extract all tags from a document's raw content.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    let mut push = |tag: String| {
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    };

    if let Some(fm) = FRONTMATTER.captures(content).and_then(|c| c.get(1)) {
        let frontmatter = fm.as_str();
        if let Some(array) = TAGS_INLINE_ARRAY.captures(frontmatter).and_then(|c| c.get(1)) {
            for raw in array.as_str().split(',') {
                if let Some(tag) = normalize(raw) {
                    push(tag);
                }
            }
        } else if let Some(list) = TAGS_DASH_LIST.captures(frontmatter).and_then(|c| c.get(1)) {
            for item in DASH_ITEM.captures_iter(list.as_str()) {
                if let Some(tag) = item.get(1).and_then(|m| normalize(m.as_str())) {
                    push(tag);
                }
            }
        }
    }

    for m in INLINE_TAG.find_iter(content) {
        push(m.as_str().to_string());
    }

    tags
}
