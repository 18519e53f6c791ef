//! Remote search against the note service.
//!
//! The server does the matching; this module builds the entry query from the
//! configured search filters, then maps rows into [`SearchResult`]s with a
//! locally extracted snippet over whichever body text the server returned.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use memovault_client::{ApiClient, EntryQuery};
use memovault_core::{Result, SearchOrigin, SearchResult, Settings};

use crate::query::parse_keywords;
use crate::snippet::extract_snippet;

/// Search frontend over the remote entry endpoint.
pub struct RemoteSearch {
    api: Arc<ApiClient>,
    settings: Arc<RwLock<Settings>>,
}

impl RemoteSearch {
    pub fn new(api: Arc<ApiClient>, settings: Arc<RwLock<Settings>>) -> Self {
        Self { api, settings }
    }

    /// Run one remote search.
    ///
    /// The configured method, type, and exclude filters ride along on every
    /// request; a server without embedding support answers an
    /// embedding-backed method with [`Error::UnsupportedMethod`], which
    /// propagates so callers can retry with keyword search.
    ///
    /// [`Error::UnsupportedMethod`]: memovault_core::Error::UnsupportedMethod
    #[instrument(skip(self), fields(subsystem = "search", component = "remote", op = "search", keyword = %keyword))]
    pub async fn search(
        &self,
        keyword: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();

        let (query, case_sensitive) = {
            let settings = self.settings.read().await;
            let search = &settings.search;
            let query = EntryQuery::new(keyword)
                .with_etype(search.etype.to_string())
                .with_ctype(search.ctype.clone())
                .with_status(search.status.clone())
                .with_dates(format_date(start_date), format_date(end_date))
                .with_method(search.method)
                .with_exclude(search.exclude.clone())
                .with_max_count(search.max_results);
            (query, search.case_sensitive)
        };
        let keywords = parse_keywords(keyword);

        let entries = self.api.search_entries(&query).await?;
        let results: Vec<SearchResult> = entries
            .into_iter()
            .map(|entry| {
                let snippet = extract_snippet(entry.body(), &keywords, case_sensitive);
                SearchResult {
                    title: entry.title,
                    created_ms: parse_created_ms(&entry.created_time),
                    addr: entry.addr,
                    snippet,
                    etype: entry.etype.parse().unwrap_or_default(),
                    origin: SearchOrigin::Remote,
                    remote_id: entry.idx,
                }
            })
            .collect();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            result_count = results.len(),
            duration_ms = elapsed,
            "Remote results mapped"
        );
        Ok(results)
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Server creation timestamps arrive in a few shapes depending on the entry
/// source; anything unparseable maps to zero.
fn parse_created_ms(created_time: &str) -> i64 {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(created_time) {
        return dt.timestamp_millis();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(created_time, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().timestamp_millis();
    }
    if let Ok(date) = NaiveDate::parse_from_str(created_time, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt.and_utc().timestamp_millis();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_created_ms_rfc3339() {
        assert_eq!(parse_created_ms("2023-06-15T12:00:00Z"), 1_686_830_400_000);
        assert_eq!(
            parse_created_ms("2023-06-15T12:00:00+02:00"),
            1_686_823_200_000
        );
    }

    #[test]
    fn test_parse_created_ms_space_separated() {
        assert_eq!(parse_created_ms("2023-06-15 12:00:00"), 1_686_830_400_000);
    }

    #[test]
    fn test_parse_created_ms_date_only() {
        assert_eq!(parse_created_ms("2023-06-15"), 1_686_787_200_000);
    }

    #[test]
    fn test_parse_created_ms_garbage_is_zero() {
        assert_eq!(parse_created_ms(""), 0);
        assert_eq!(parse_created_ms("yesterday"), 0);
        assert_eq!(parse_created_ms("15/06/2023"), 0);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(None), "");
        let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        assert_eq!(format_date(Some(date)), "2023-06-15");
    }
}
