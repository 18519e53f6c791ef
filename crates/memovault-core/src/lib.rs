//! # memovault-core
//!
//! Core types, traits, and abstractions for the memovault library.
//!
//! This crate provides the shared data model, error taxonomy, configuration
//! surface, and host capability seams that the other memovault crates depend
//! on, plus in-memory capability doubles for tests.

pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod models;
pub mod rules;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{
    SearchMethod, SearchSettings, ServerConfig, Settings, SyncSettings, DEFAULT_BASE_URL,
    DEFAULT_MAX_RESULTS, DEFAULT_TIMEOUT_SECS, DEFAULT_USERNAME,
};
pub use error::{Error, Result};
pub use harness::{MemoryDocumentStore, MemorySettingsStore, ScriptedInteraction};
pub use models::{
    now_ms, ConflictChoice, DocumentRecord, EntryType, SearchOrigin, SearchResult, SyncItem,
    SyncPlan,
};
pub use rules::PathRules;
pub use tags::extract_tags;
pub use traits::{
    title_from_path, DocumentHandle, DocumentStore, Interaction, NullInteraction, SettingsStore,
};
