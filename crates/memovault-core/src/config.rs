//! Configuration surface consumed by the engines.
//!
//! The host owns where these values come from (its own settings UI, disk
//! format, etc.); the engines only ever see this struct, read it through a
//! shared handle, and write back through the [`crate::SettingsStore`]
//! capability when a token or watermark changes.

use crate::models::EntryType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default remote service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8005";

/// Default account name used before the host configures credentials.
pub const DEFAULT_USERNAME: &str = "guest";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default result window for searches.
pub const DEFAULT_MAX_RESULTS: usize = 30;

// =============================================================================
// SEARCH METHOD
// =============================================================================

/// Server-side search method selector.
///
/// Serialized with the remote contract's camelCase values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SearchMethod {
    #[default]
    #[serde(rename = "keywordOnly")]
    KeywordOnly,
    #[serde(rename = "embeddingOnly")]
    EmbeddingOnly,
    #[serde(rename = "both")]
    Both,
}

impl SearchMethod {
    /// Embedding-backed methods are optional server capabilities; a 422 under
    /// them means "this server build cannot do that", not a caller bug.
    pub fn requires_embedding(&self) -> bool {
        matches!(self, SearchMethod::EmbeddingOnly | SearchMethod::Both)
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchMethod::KeywordOnly => "keywordOnly",
            SearchMethod::EmbeddingOnly => "embeddingOnly",
            SearchMethod::Both => "both",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SearchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keywordOnly" => Ok(SearchMethod::KeywordOnly),
            "embeddingOnly" => Ok(SearchMethod::EmbeddingOnly),
            "both" => Ok(SearchMethod::Both),
            _ => Err(format!("Unknown search method: {s}")),
        }
    }
}

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// Remote service endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Cached auth token; empty means "must log in before the next call".
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Whether a login attempt is even possible.
    pub fn has_credentials(&self) -> bool {
        !self.base_url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Sync scope, schedule, and watermark state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Vault name reported to the server (namespaces the remote inventory).
    pub vault: String,
    /// Comma-separated path prefixes to include. Empty means everything.
    #[serde(default)]
    pub include: String,
    /// Comma-separated `*`-wildcard rules to exclude from sync.
    #[serde(default)]
    pub exclude: String,
    /// Periodic sync interval in minutes. 0 disables the timer.
    #[serde(default)]
    pub interval_mins: u64,
    /// Last moment local and remote were fully reconciled, ms since epoch.
    #[serde(default)]
    pub last_sync_time: i64,
    /// Last moment the local inventory was refreshed, ms since epoch.
    #[serde(default)]
    pub last_index_time: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            vault: String::new(),
            include: String::new(),
            exclude: String::new(),
            interval_mins: 0,
            last_sync_time: 0,
            last_index_time: 0,
        }
    }
}

impl SyncSettings {
    pub fn with_vault(mut self, vault: impl Into<String>) -> Self {
        self.vault = vault.into();
        self
    }

    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = include.into();
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = exclude.into();
        self
    }

    pub fn with_interval_mins(mut self, mins: u64) -> Self {
        self.interval_mins = mins;
        self
    }
}

/// Search defaults and remote filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub method: SearchMethod,
    /// Entry-type filter sent to the remote service.
    #[serde(default)]
    pub etype: EntryType,
    /// Content-type filter, omitted from requests when empty.
    #[serde(default)]
    pub ctype: String,
    /// Status filter, omitted from requests when empty.
    #[serde(default)]
    pub status: String,
    /// Comma-separated `*`-wildcard rules excluded from search scopes.
    #[serde(default)]
    pub exclude: String,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_results: DEFAULT_MAX_RESULTS,
            method: SearchMethod::KeywordOnly,
            etype: EntryType::Note,
            ctype: String::new(),
            status: String::new(),
            exclude: String::new(),
        }
    }
}

impl SearchSettings {
    pub fn with_case_sensitive(mut self, on: bool) -> Self {
        self.case_sensitive = on;
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    pub fn with_method(mut self, method: SearchMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = exclude.into();
        self
    }
}

/// Full configuration handed to the engines by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub search: SearchSettings,
}
