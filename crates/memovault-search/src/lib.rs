//! # memovault-search
//!
//! Local and remote search engines for memovault.
//!
//! This crate provides:
//! - Query parsing with `tag:`/`file:` mode prefixes and quoted phrases
//! - Local full-text search over the host document store, with exact and
//!   fuzzy (subsequence) keyword matching
//! - Bounded snippet extraction anchored on the best keyword match
//! - Remote search through the note service's entry endpoint
//!
//! ## Example
//!
//! ```ignore
//! use memovault_search::{LocalQuery, LocalSearchEngine};
//!
//! let engine = LocalSearchEngine::new(store, settings);
//!
//! // Exact keyword search
//! let results = engine.search(&LocalQuery::new("meeting notes")).await?;
//!
//! // Fuzzy search, restricted to one folder
//! let results = engine
//!     .search(&LocalQuery::new("meetng").with_folder("work").fuzzy())
//!     .await?;
//! ```

pub mod fuzzy;
pub mod local;
pub mod query;
pub mod remote;
pub mod snippet;

// Re-export core types
pub use memovault_core::*;

// Re-export search types
pub use fuzzy::{fuzzy_match, FuzzyOutcome, EXACT_SCORE, FUZZY_SCORE_FLOOR};
pub use local::{LocalQuery, LocalSearchEngine};
pub use query::{parse, parse_keywords, ParsedQuery, QueryMode};
pub use remote::RemoteSearch;
pub use snippet::{extract_snippet, SNIPPET_LIMIT};
