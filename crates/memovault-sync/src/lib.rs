//! # memovault-sync
//!
//! Incremental synchronization between the local document collection and the
//! remote note service.
//!
//! Two pieces: the [`LocalInventory`], a persisted path → hash/mtime/sync-time
//! map that detects local changes incrementally, and the [`SyncEngine`], the
//! state machine that compares that inventory against the remote vault and
//! executes the resulting upload/download/remove/conflict plan. A [`Scheduler`]
//! drives periodic passes from the configured interval.

pub mod engine;
pub mod inventory;

// Re-export commonly used types at crate root
pub use engine::{
    InterruptHandle, PassOutcome, Scheduler, SchedulerHandle, SyncEngine, SyncEngineConfig,
    SyncReport, ASYNC_FILE_THRESHOLD, ASYNC_PAYLOAD_BYTES, MAX_POLL_ATTEMPTS, POLL_INTERVAL_MS,
    SETTLE_DELAY_MS, UPLOAD_GROUP_SIZE, WATERMARK_SKEW_MS,
};
pub use inventory::{content_md5, LocalInventory, MemorySideStore, SideStore, INVENTORY_FILE};
