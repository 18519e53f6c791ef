//! Structured logging schema and field name constants for memovault.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Aborted sync phase or failed search, requires user attention |
//! | WARN  | Recoverable issue, fallback applied (sync fallback, slow op) |
//! | INFO  | Lifecycle events, pass/phase completions |
//! | DEBUG | Decision points, plan partitions, config choices |
//! | TRACE | Per-item iteration (per file, per poll, per search hit) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "sync", "search", "client", "inventory"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "engine", "local_search", "remote_search", "api", "session"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "sync_all", "compare", "upload_group", "search", "update"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Relative document path being operated on.
pub const DOC_PATH: &str = "doc_path";

/// Server-side async task identifier.
pub const TASK_ID: &str = "task_id";

/// Search query text.
pub const QUERY: &str = "query";

/// Vault name a sync pass runs against.
pub const VAULT: &str = "vault";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of files in a batch (upload group, download list).
pub const FILE_COUNT: &str = "file_count";

/// Total payload size in bytes for an upload batch.
pub const PAYLOAD_BYTES: &str = "payload_bytes";

/// Poll attempt counter for async task tracking.
pub const POLL_ATTEMPT: &str = "poll_attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";

/// Pass ended by a user interrupt rather than completion or failure.
pub const INTERRUPTED: &str = "interrupted";
