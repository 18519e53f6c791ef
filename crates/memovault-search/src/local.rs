//! Local full-text search over the host document store.
//!
//! One pass enumerates the store, applies the exclude rules and the query's
//! folder/date gates, evaluates each surviving document in the parsed query's
//! mode, then ranks every match before the result list is cut down to the
//! configured maximum. An in-flight flag coalesces rapid repeated queries
//! (debounced keystroke search): a call that arrives while another is running
//! fails fast with [`Error::SearchInProgress`] instead of piling up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use memovault_core::{
    extract_tags, DocumentHandle, DocumentStore, Error, PathRules, Result, SearchResult, Settings,
};

use crate::fuzzy::{fuzzy_match, EXACT_SCORE, FUZZY_SCORE_FLOOR};
use crate::query::{parse, QueryMode};
use crate::snippet::{adjacent_pair_matcher, extract_snippet, literal_matcher};

/// One local search request.
#[derive(Debug, Clone, Default)]
pub struct LocalQuery {
    /// Raw query text, including any `tag:`/`file:` mode prefix.
    pub raw: String,
    /// Restrict matches to this folder and its subtree; empty means no
    /// restriction.
    pub folder: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Fall back to approximate subsequence matching in keyword mode.
    pub fuzzy: bool,
}

impl LocalQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }
}

/// A matched document plus the signals the ranking pass sorts on.
struct RankedHit {
    /// Average fuzzy score across all query tokens; zero in exact mode.
    fuzzy_avg: f32,
    /// Whether the title alone satisfies the whole query.
    title_match: bool,
    /// Occurrences of adjacent token pairs in the content.
    adjacency: usize,
    /// Total literal token occurrences in the content.
    occurrences: usize,
    result: SearchResult,
}

/// Pre-built literal matchers for the query tokens and their adjacent pairs.
/// Tokens that fail to compile into a matcher simply stop counting.
struct TokenMatchers {
    tokens: Vec<Option<Regex>>,
    pairs: Vec<Option<Regex>>,
}

impl TokenMatchers {
    fn build(tokens: &[String], case_sensitive: bool) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|t| literal_matcher(t, case_sensitive))
                .collect(),
            pairs: tokens
                .windows(2)
                .map(|p| adjacent_pair_matcher(&p[0], &p[1], case_sensitive))
                .collect(),
        }
    }
}

/// Search engine over the injected [`DocumentStore`].
pub struct LocalSearchEngine {
    store: Arc<dyn DocumentStore>,
    settings: Arc<RwLock<Settings>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl LocalSearchEngine {
    pub fn new(store: Arc<dyn DocumentStore>, settings: Arc<RwLock<Settings>>) -> Self {
        Self {
            store,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one search over the store.
    ///
    /// Empty queries yield an empty result list. Documents that fail to read
    /// are skipped individually; enumeration failures abort the search.
    #[instrument(skip(self, query), fields(subsystem = "search", component = "local", op = "search", keyword = %query.raw, fuzzy = query.fuzzy))]
    pub async fn search(&self, query: &LocalQuery) -> Result<Vec<SearchResult>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SearchInProgress);
        }
        let _guard = InFlight(&self.in_flight);
        let start = Instant::now();

        let parsed = parse(&query.raw);
        if parsed.is_empty() {
            debug!("Empty query, nothing to search");
            return Ok(Vec::new());
        }

        let (case_sensitive, max_results, rules) = {
            let settings = self.settings.read().await;
            (
                settings.search.case_sensitive,
                settings.search.max_results,
                PathRules::from_exclude(&settings.search.exclude),
            )
        };
        let matchers = TokenMatchers::build(&parsed.tokens, case_sensitive);

        let mut hits: Vec<RankedHit> = Vec::new();
        for handle in self.store.enumerate().await? {
            if rules.is_excluded(&handle.path) {
                continue;
            }
            if !within_folder(&handle.path, &query.folder) {
                continue;
            }
            if !within_dates(handle.created_ms, query.start_date, query.end_date) {
                continue;
            }

            let hit = match parsed.mode {
                QueryMode::File => match_file(&handle, &parsed.value, case_sensitive),
                QueryMode::Tag => {
                    let content = match self.read_text(&handle.path).await {
                        Some(content) => content,
                        None => continue,
                    };
                    match_tags(&handle, &content, &parsed.tokens, case_sensitive)
                }
                QueryMode::Keyword => {
                    let content = match self.read_text(&handle.path).await {
                        Some(content) => content,
                        None => continue,
                    };
                    match_keywords(
                        &handle,
                        &content,
                        &parsed.tokens,
                        &matchers,
                        query.fuzzy,
                        case_sensitive,
                    )
                }
            };
            if let Some(hit) = hit {
                hits.push(hit);
            }
        }

        rank(&mut hits);
        hits.truncate(max_results);
        let results: Vec<SearchResult> = hits.into_iter().map(|hit| hit.result).collect();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            result_count = results.len(),
            duration_ms = elapsed,
            "Local search complete"
        );
        if elapsed > 5000 {
            warn!(duration_ms = elapsed, slow = true, "Slow local search");
        }
        Ok(results)
    }

    /// Read a document as text, skipping it with a trace on failure.
    async fn read_text(&self, path: &str) -> Option<String> {
        match self.store.read(path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(error) => {
                debug!(path, error = %error, "Skipping unreadable document");
                None
            }
        }
    }
}

/// Sort matches best-first: fuzzy confidence, then title match, then adjacent
/// pair count, then total occurrences, then creation time (newest first).
fn rank(hits: &mut [RankedHit]) {
    hits.sort_by(|a, b| {
        b.fuzzy_avg
            .partial_cmp(&a.fuzzy_avg)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.title_match.cmp(&a.title_match))
            .then_with(|| b.adjacency.cmp(&a.adjacency))
            .then_with(|| b.occurrences.cmp(&a.occurrences))
            .then_with(|| b.result.created_ms.cmp(&a.result.created_ms))
    });
}

fn within_folder(path: &str, folder: &str) -> bool {
    if folder.is_empty() {
        return true;
    }
    path == folder || path.starts_with(&format!("{folder}/"))
}

fn within_dates(created_ms: i64, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let date = match chrono::DateTime::from_timestamp_millis(created_ms) {
        Some(dt) => dt.date_naive(),
        None => return false,
    };
    if let Some(start) = start {
        if date < start {
            return false;
        }
    }
    if let Some(end) = end {
        if date > end {
            return false;
        }
    }
    true
}

fn contains_with_case(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// File mode matches on the title alone; content is never read.
fn match_file(handle: &DocumentHandle, needle: &str, case_sensitive: bool) -> Option<RankedHit> {
    if !contains_with_case(&handle.title, needle, case_sensitive) {
        return None;
    }
    Some(RankedHit {
        fuzzy_avg: 0.0,
        title_match: true,
        adjacency: 0,
        occurrences: 0,
        result: SearchResult::local(&handle.title, &handle.path, handle.created_ms),
    })
}

/// Tag mode: every query token must be contained in some tag of the document.
fn match_tags(
    handle: &DocumentHandle,
    content: &str,
    tokens: &[String],
    case_sensitive: bool,
) -> Option<RankedHit> {
    let tags = extract_tags(content);
    let all = tokens
        .iter()
        .all(|token| tags.iter().any(|tag| contains_with_case(tag, token, case_sensitive)));
    if !all {
        return None;
    }
    Some(RankedHit {
        fuzzy_avg: 0.0,
        title_match: false,
        adjacency: 0,
        occurrences: 0,
        result: SearchResult::local(&handle.title, &handle.path, handle.created_ms),
    })
}

/// Keyword mode; exact matching requires every token in the content or
/// title, fuzzy matching requires at least one token above the score floor.
fn match_keywords(
    handle: &DocumentHandle,
    content: &str,
    tokens: &[String],
    matchers: &TokenMatchers,
    fuzzy: bool,
    case_sensitive: bool,
) -> Option<RankedHit> {
    let fuzzy_avg = if fuzzy {
        let mut total = 0.0f32;
        let mut contributing = 0usize;
        for token in tokens {
            if contains_with_case(content, token, case_sensitive)
                || contains_with_case(&handle.title, token, case_sensitive)
            {
                total += EXACT_SCORE;
                contributing += 1;
                continue;
            }
            let best = fuzzy_match(content, token)
                .score
                .max(fuzzy_match(&handle.title, token).score);
            if best > FUZZY_SCORE_FLOOR {
                total += best;
                contributing += 1;
            }
        }
        if contributing == 0 {
            return None;
        }
        total / tokens.len() as f32
    } else {
        let all = tokens.iter().all(|token| {
            contains_with_case(content, token, case_sensitive)
                || contains_with_case(&handle.title, token, case_sensitive)
        });
        if !all {
            return None;
        }
        0.0
    };

    let occurrences: usize = matchers
        .tokens
        .iter()
        .flatten()
        .map(|m| m.find_iter(content).count())
        .sum();
    let adjacency: usize = matchers
        .pairs
        .iter()
        .flatten()
        .map(|m| m.find_iter(content).count())
        .sum();
    let title_match = tokens
        .iter()
        .all(|token| contains_with_case(&handle.title, token, case_sensitive));
    let snippet = extract_snippet(content, tokens, case_sensitive);

    Some(RankedHit {
        fuzzy_avg,
        title_match,
        adjacency,
        occurrences,
        result: SearchResult::local(&handle.title, &handle.path, handle.created_ms)
            .with_snippet(snippet),
    })
}
