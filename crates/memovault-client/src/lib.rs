//! HTTP client for the memovault remote note service.
//!
//! This crate owns the wire protocol: login and token caching
//! ([`AuthSession`]), and typed bindings for every service endpoint
//! ([`ApiClient`]). Engines in the search and sync crates consume these
//! bindings and never build HTTP requests themselves.
//!
//! All authenticated calls share one recovery rule: a 401 clears the cached
//! token, logs in again with the configured credentials, and retries the call
//! exactly once.

pub mod api;
pub mod session;

// Re-export commonly used types at crate root
pub use api::{
    ApiClient, CompareRequest, EntryQuery, RemoteEntry, TaskProgress, TaskStatus, UploadBatch,
    UploadFile, UploadOutcome, DEFAULT_MAX_COUNT, UPLOAD_SOURCE,
};
pub use session::AuthSession;
