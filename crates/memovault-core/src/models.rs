//! Shared data model for memovault: inventory records, search results, and
//! sync plan shapes exchanged between the engines and the remote service.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// =============================================================================
// ENTRY TYPES
// =============================================================================

/// Kind of entry a search result points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Note,
    Web,
    Record,
    File,
    Chat,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryType::Note => "note",
            EntryType::Web => "web",
            EntryType::Record => "record",
            EntryType::File => "file",
            EntryType::Chat => "chat",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(EntryType::Note),
            "web" => Ok(EntryType::Web),
            "record" => Ok(EntryType::Record),
            "file" => Ok(EntryType::File),
            "chat" => Ok(EntryType::Chat),
            _ => Err(format!("Unknown entry type: {s}")),
        }
    }
}

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOrigin {
    Local,
    Remote,
}

// =============================================================================
// INVENTORY RECORD
// =============================================================================

/// One local inventory entry: document identity plus the change-detection
/// attributes the sync engine compares against the remote side.
///
/// Field names follow the persisted JSON side-store and the compare wire
/// format, which both use `lastSyncTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Relative path, unique key within the vault.
    pub path: String,
    /// Hex-encoded md5 digest of the document content.
    pub md5: String,
    /// Modification timestamp, ms since epoch. Updated together with `md5`.
    pub mtime: i64,
    /// Last moment this path was confirmed synced, ms since epoch.
    #[serde(rename = "lastSyncTime")]
    pub last_sync_time: i64,
}

impl DocumentRecord {
    pub fn new(path: impl Into<String>, md5: impl Into<String>, mtime: i64) -> Self {
        Self {
            path: path.into(),
            md5: md5.into(),
            mtime,
            last_sync_time: 0,
        }
    }

    pub fn with_last_sync_time(mut self, ts: i64) -> Self {
        self.last_sync_time = ts;
        self
    }
}

// =============================================================================
// SEARCH RESULT
// =============================================================================

/// Unified search result shape across local and remote origins.
///
/// Ranking signals (title match, occurrence counts, fuzzy scores) are engine
/// internals and deliberately not part of this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// Creation time, ms since epoch. 0 when the origin did not supply one.
    pub created_ms: i64,
    /// Address: relative path for local results, server address for remote.
    pub addr: String,
    /// Bounded content excerpt around the best match.
    pub snippet: String,
    pub etype: EntryType,
    pub origin: SearchOrigin,
    /// Numeric id assigned by the remote service, absent for local results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<i64>,
}

impl SearchResult {
    pub fn local(title: impl Into<String>, addr: impl Into<String>, created_ms: i64) -> Self {
        Self {
            title: title.into(),
            created_ms,
            addr: addr.into(),
            snippet: String::new(),
            etype: EntryType::Note,
            origin: SearchOrigin::Local,
            remote_id: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_etype(mut self, etype: EntryType) -> Self {
        self.etype = etype;
        self
    }
}

// =============================================================================
// SYNC PLAN
// =============================================================================

/// One entry in a compare partition: an address plus, when the server knows
/// the entry, its numeric id (needed for downloads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    pub addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<i64>,
}

impl SyncItem {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            idx: None,
        }
    }

    pub fn with_idx(mut self, idx: i64) -> Self {
        self.idx = Some(idx);
        self
    }
}

/// Partitioned outcome of a remote compare call.
///
/// `remove_local` are documents the server says should disappear locally;
/// `remove_remote` are server-side-only removals, reported but never acted on
/// by the engine. Conflicts are documents diverged on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    #[serde(default)]
    pub upload: Vec<SyncItem>,
    #[serde(default)]
    pub download: Vec<SyncItem>,
    #[serde(default)]
    pub remove_local: Vec<SyncItem>,
    #[serde(default)]
    pub remove_remote: Vec<SyncItem>,
    #[serde(default)]
    pub conflicts: Vec<SyncItem>,
}

impl SyncPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every partition is empty and there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.upload.is_empty()
            && self.download.is_empty()
            && self.remove_local.is_empty()
            && self.remove_remote.is_empty()
            && self.conflicts.is_empty()
    }

    /// Total number of planned actions, remote-only removals included.
    pub fn total(&self) -> usize {
        self.upload.len()
            + self.download.len()
            + self.remove_local.len()
            + self.remove_remote.len()
            + self.conflicts.len()
    }

    /// Enforce partition disjointness: any address in the conflict set is
    /// stripped from upload and download so it is executed exactly once, as
    /// the user's resolved action.
    pub fn normalized(mut self) -> Self {
        if self.conflicts.is_empty() {
            return self;
        }
        let conflicted: HashSet<&str> = self.conflicts.iter().map(|c| c.addr.as_str()).collect();
        self.upload.retain(|i| !conflicted.contains(i.addr.as_str()));
        self.download
            .retain(|i| !conflicted.contains(i.addr.as_str()));
        self
    }
}

/// User decision for a single conflicted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    /// Local wins: push the local copy.
    Upload,
    /// Remote wins: fetch the server copy.
    Download,
    /// Defer: leave both sides untouched and exclude the path from
    /// watermark stamping.
    Skip,
}

impl fmt::Display for ConflictChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictChoice::Upload => "upload",
            ConflictChoice::Download => "download",
            ConflictChoice::Skip => "skip",
        };
        write!(f, "{s}")
    }
}
