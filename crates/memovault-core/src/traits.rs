//! Capability traits for memovault abstractions.
//!
//! The host application owns document storage, user-facing prompts, and
//! settings persistence. The engines only ever touch those through these
//! seams, which keeps them runnable against the in-memory doubles in
//! [`crate::harness`].

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ConflictChoice;
use crate::Settings;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// One enumerable document, with the stat attributes engines care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// Relative path, unique within the vault.
    pub path: String,
    /// Display title (basename without extension).
    pub title: String,
    /// Creation time, ms since epoch.
    pub created_ms: i64,
    /// Modification time, ms since epoch.
    pub mtime_ms: i64,
    /// Content size in bytes.
    pub size: u64,
}

impl DocumentHandle {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let title = title_from_path(&path);
        Self {
            path,
            title,
            created_ms: 0,
            mtime_ms: 0,
            size: 0,
        }
    }
}

/// Derive a display title from a relative path: final segment, extension
/// stripped.
pub fn title_from_path(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}

/// Host-owned document storage.
///
/// `write` must create missing parent directories; `trash` moves the
/// document out of the collection (recoverable delete where the host
/// supports it).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document in the collection.
    async fn enumerate(&self) -> Result<Vec<DocumentHandle>>;

    /// Read full document content.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write full document content, creating parents as needed.
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Stat a single path. `None` when the document does not exist.
    async fn stat(&self, path: &str) -> Result<Option<DocumentHandle>>;

    /// Move a document to trash.
    async fn trash(&self, path: &str) -> Result<()>;
}

// =============================================================================
// USER INTERACTION
// =============================================================================

/// Host-owned prompts and progress reporting.
///
/// Prompts suspend the calling engine until answered. A dismissed prompt
/// resolves to the safe default: `confirm` returns `false`,
/// `resolve_conflict` returns [`ConflictChoice::Skip`]. Implementations must
/// never treat dismissal as approval.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Yes/no confirmation.
    async fn confirm(&self, prompt: &str) -> bool;

    /// Three-way decision for one conflicted document.
    async fn resolve_conflict(&self, path: &str) -> ConflictChoice;

    /// Transient advisory message.
    async fn notify(&self, message: &str);

    /// Batch progress update.
    async fn progress(&self, done: usize, total: usize);
}

/// Interaction that answers every prompt with the safe default and drops
/// notifications.
pub struct NullInteraction;

#[async_trait]
impl Interaction for NullInteraction {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }

    async fn resolve_conflict(&self, _path: &str) -> ConflictChoice {
        ConflictChoice::Skip
    }

    async fn notify(&self, _message: &str) {}

    async fn progress(&self, _done: usize, _total: usize) {}
}

// =============================================================================
// SETTINGS PERSISTENCE
// =============================================================================

/// Host-owned settings persistence. Engines call this after mutating the
/// shared [`Settings`] (token refresh, watermark advance) so the host can
/// write its own settings file.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn persist(&self, settings: &Settings) -> Result<()>;
}
