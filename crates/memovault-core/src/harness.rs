//! In-memory capability implementations for tests and standalone harnesses.
//!
//! These doubles let the sync and search engines run without a host
//! application: documents live in a map, prompts follow a script, and
//! persisted settings are captured for assertions.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::ConflictChoice;
use crate::traits::{title_from_path, DocumentHandle, DocumentStore, Interaction, SettingsStore};
use crate::Settings;

// =============================================================================
// MEMORY DOCUMENT STORE
// =============================================================================

#[derive(Debug, Clone)]
struct MemoryDoc {
    content: Vec<u8>,
    created_ms: i64,
    mtime_ms: i64,
}

/// Map-backed [`DocumentStore`].
///
/// Writes bump mtime to the supplied clock value; `trash` records the path so
/// tests can assert what was removed.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<BTreeMap<String, MemoryDoc>>,
    trashed: Mutex<Vec<String>>,
    /// Mtime stamped on the next `write` call.
    write_clock_ms: Mutex<i64>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document with explicit timestamps.
    pub fn insert(&self, path: &str, content: &[u8], created_ms: i64, mtime_ms: i64) {
        self.docs.lock().expect("store lock").insert(
            path.to_string(),
            MemoryDoc {
                content: content.to_vec(),
                created_ms,
                mtime_ms,
            },
        );
    }

    /// Replace content and bump mtime, simulating a local edit.
    pub fn touch(&self, path: &str, content: &[u8], mtime_ms: i64) {
        let mut docs = self.docs.lock().expect("store lock");
        match docs.get_mut(path) {
            Some(doc) => {
                doc.content = content.to_vec();
                doc.mtime_ms = mtime_ms;
            }
            None => {
                docs.insert(
                    path.to_string(),
                    MemoryDoc {
                        content: content.to_vec(),
                        created_ms: mtime_ms,
                        mtime_ms,
                    },
                );
            }
        }
    }

    /// Delete without trashing, simulating an external removal.
    pub fn remove(&self, path: &str) {
        self.docs.lock().expect("store lock").remove(path);
    }

    /// Mtime that the next `write` through the trait will stamp.
    pub fn set_write_clock(&self, mtime_ms: i64) {
        *self.write_clock_ms.lock().expect("clock lock") = mtime_ms;
    }

    /// Paths moved to trash, in order.
    pub fn trashed(&self) -> Vec<String> {
        self.trashed.lock().expect("trash lock").clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.docs.lock().expect("store lock").contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.docs
            .lock()
            .expect("store lock")
            .get(path)
            .map(|d| d.content.clone())
    }

    fn handle(path: &str, doc: &MemoryDoc) -> DocumentHandle {
        DocumentHandle {
            path: path.to_string(),
            title: title_from_path(path),
            created_ms: doc.created_ms,
            mtime_ms: doc.mtime_ms,
            size: doc.content.len() as u64,
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn enumerate(&self) -> Result<Vec<DocumentHandle>> {
        let docs = self.docs.lock().expect("store lock");
        Ok(docs
            .iter()
            .map(|(path, doc)| Self::handle(path, doc))
            .collect())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let docs = self.docs.lock().expect("store lock");
        docs.get(path)
            .map(|d| d.content.clone())
            .ok_or_else(|| Error::Store(format!("no such document: {path}")))
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let clock = *self.write_clock_ms.lock().expect("clock lock");
        self.touch(path, bytes, clock);
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<Option<DocumentHandle>> {
        let docs = self.docs.lock().expect("store lock");
        Ok(docs.get(path).map(|d| Self::handle(path, d)))
    }

    async fn trash(&self, path: &str) -> Result<()> {
        let removed = self.docs.lock().expect("store lock").remove(path);
        if removed.is_none() {
            return Err(Error::Store(format!("no such document: {path}")));
        }
        self.trashed.lock().expect("trash lock").push(path.to_string());
        Ok(())
    }
}

// =============================================================================
// SCRIPTED INTERACTION
// =============================================================================

/// Interaction double driven by pre-loaded answers.
///
/// Exhausted scripts fall back to the safe defaults (deny / skip), matching
/// the dismissed-prompt rule the engines rely on.
#[derive(Default)]
pub struct ScriptedInteraction {
    confirms: Mutex<VecDeque<bool>>,
    conflict_choices: Mutex<VecDeque<ConflictChoice>>,
    notices: Mutex<Vec<String>>,
    progress_updates: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_confirm(&self, answer: bool) {
        self.confirms.lock().expect("confirm lock").push_back(answer);
    }

    pub fn push_conflict_choice(&self, choice: ConflictChoice) {
        self.conflict_choices
            .lock()
            .expect("choice lock")
            .push_back(choice);
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().expect("notice lock").clone()
    }

    pub fn progress_updates(&self) -> Vec<(usize, usize)> {
        self.progress_updates.lock().expect("progress lock").clone()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.confirms
            .lock()
            .expect("confirm lock")
            .pop_front()
            .unwrap_or(false)
    }

    async fn resolve_conflict(&self, _path: &str) -> ConflictChoice {
        self.conflict_choices
            .lock()
            .expect("choice lock")
            .pop_front()
            .unwrap_or(ConflictChoice::Skip)
    }

    async fn notify(&self, message: &str) {
        self.notices
            .lock()
            .expect("notice lock")
            .push(message.to_string());
    }

    async fn progress(&self, done: usize, total: usize) {
        self.progress_updates
            .lock()
            .expect("progress lock")
            .push((done, total));
    }
}

// =============================================================================
// MEMORY SETTINGS STORE
// =============================================================================

/// [`SettingsStore`] that records every persisted snapshot.
#[derive(Default)]
pub struct MemorySettingsStore {
    persisted: Mutex<Vec<Settings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persist_count(&self) -> usize {
        self.persisted.lock().expect("settings lock").len()
    }

    pub fn last_persisted(&self) -> Option<Settings> {
        self.persisted.lock().expect("settings lock").last().cloned()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn persist(&self, settings: &Settings) -> Result<()> {
        self.persisted
            .lock()
            .expect("settings lock")
            .push(settings.clone());
        Ok(())
    }
}
