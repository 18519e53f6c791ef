//! Search input parsing.
//!
//! A raw query string carries its mode in a reserved prefix: `tag:` searches
//! document tags, `file:` searches titles, anything else is a keyword search.
//! Keyword queries tokenize on whitespace with quoted-phrase support, so
//! `"hello world" foo` yields two tokens, not three. Parsing never fails;
//! empty or unrecognizable input just produces an empty token list.

use once_cell::sync::Lazy;
use regex::Regex;

/// Mutually exclusive search modes, selected by the query prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    Tag,
    File,
    #[default]
    Keyword,
}

/// A raw query string broken into mode, stripped value, and tokens.
///
/// Tokens are always trimmed and non-empty. In tag mode every token carries a
/// leading `#`; in file mode the whole remainder is one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub mode: QueryMode,
    /// The raw search value with any mode prefix stripped.
    pub value: String,
    pub tokens: Vec<String>,
}

impl ParsedQuery {
    /// Whether there is anything to match against.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"|(\S+)"#).expect("valid token regex"));

/// Tokenize a keyword search value: quoted phrases become single tokens,
/// everything else splits on runs of whitespace.
pub fn parse_keywords(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for cap in TOKEN.captures_iter(value) {
        let term = cap.get(1).or_else(|| cap.get(2)).map(|m| m.as_str().trim());
        if let Some(term) = term {
            if !term.is_empty() {
                tokens.push(term.to_string());
            }
        }
    }
    tokens
}

/// Parse a raw search string into a typed query.
///
/// Prefix detection is case-sensitive: `tag:` and `file:` select their modes,
/// anything else is a keyword search. Any input, including the empty string,
/// parses successfully.
pub fn parse(raw: &str) -> ParsedQuery {
    let (mode, value, tokens) = if let Some(rest) = raw.strip_prefix("tag:") {
        let value = rest.trim().to_string();
        let tokens = value
            .split_whitespace()
            .map(|term| {
                if term.starts_with('#') {
                    term.to_string()
                } else {
                    format!("#{term}")
                }
            })
            .collect();
        (QueryMode::Tag, value, tokens)
    } else if let Some(rest) = raw.strip_prefix("file:") {
        let value = rest.trim().to_string();
        (QueryMode::File, value.clone(), vec![value])
    } else {
        (QueryMode::Keyword, raw.to_string(), parse_keywords(raw))
    };

    let tokens = tokens
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    ParsedQuery {
        mode,
        value,
        tokens,
    }
}
