//! Sync engine: compares the local inventory against the remote vault and
//! executes the resulting plan.
//!
//! One pass runs Comparing, then Uploading, Downloading, Removing, and
//! ResolvingConflicts in that fixed order, then Finalizing. A second
//! invocation while a pass is running is rejected with
//! [`Error::SyncInProgress`], never queued. Cancellation is cooperative: the
//! interrupt flag is polled between discrete units of work (upload group,
//! download file, poll cycle) and never aborts an in-flight call. Only a
//! fully successful, un-interrupted pass advances the global watermark.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use memovault_client::{ApiClient, CompareRequest, UploadBatch, UploadFile};
use memovault_core::{
    now_ms, ConflictChoice, DocumentStore, Error, Interaction, PathRules, Result, Settings,
    SettingsStore, SyncItem, SyncSettings,
};

use crate::inventory::{content_md5, LocalInventory};

/// Files per synchronous upload group.
pub const UPLOAD_GROUP_SIZE: usize = 5;

/// Payload size above which an asynchronous server-side upload is attempted.
pub const ASYNC_PAYLOAD_BYTES: usize = 20 * 1024 * 1024;

/// File count above which an asynchronous server-side upload is attempted.
pub const ASYNC_FILE_THRESHOLD: usize = 100;

/// Delay between async task status polls.
pub const POLL_INTERVAL_MS: u64 = 5000;

/// Poll ceiling; with the default interval this bounds the wait to 5 minutes.
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Settle delay before finalizing a pass.
pub const SETTLE_DELAY_MS: u64 = 1000;

/// Margin added to the watermark to tolerate clock and latency drift.
pub const WATERMARK_SKEW_MS: i64 = 5000;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Tunable limits for the sync engine. Defaults match the service contract;
/// tests shrink them to keep runs fast.
#[derive(Debug, Clone)]
pub struct SyncEngineConfig {
    pub upload_group_size: usize,
    pub async_payload_bytes: usize,
    pub async_file_threshold: usize,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub settle_delay_ms: u64,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            upload_group_size: UPLOAD_GROUP_SIZE,
            async_payload_bytes: ASYNC_PAYLOAD_BYTES,
            async_file_threshold: ASYNC_FILE_THRESHOLD,
            poll_interval_ms: POLL_INTERVAL_MS,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
            settle_delay_ms: SETTLE_DELAY_MS,
        }
    }
}

impl SyncEngineConfig {
    pub fn with_upload_group_size(mut self, n: usize) -> Self {
        self.upload_group_size = n.max(1);
        self
    }

    pub fn with_async_thresholds(mut self, payload_bytes: usize, file_count: usize) -> Self {
        self.async_payload_bytes = payload_bytes;
        self.async_file_threshold = file_count;
        self
    }

    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn with_settle_delay(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }
}

// =============================================================================
// INTERRUPT HANDLE
// =============================================================================

/// Shared cancellation flag for a running pass.
///
/// Interruption is a normal terminal outcome, not an error: the engine stops
/// before the next unit of work, requests remote task termination when one is
/// in flight, and leaves the watermark unadvanced.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running pass.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// PASS REPORT
// =============================================================================

/// How a sync pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassOutcome {
    /// Every planned phase ran to completion.
    #[default]
    Completed,
    /// Nothing differed between local and remote.
    NothingToDo,
    /// The user cancelled mid-pass; remaining work was skipped.
    Interrupted,
}

/// What one sync pass did, phase by phase.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcome: PassOutcome,
    /// Paths the server accepted during upload.
    pub uploaded: Vec<String>,
    /// Paths written locally from the server.
    pub downloaded: Vec<String>,
    /// Paths moved to trash after confirmation.
    pub removed: Vec<String>,
    /// Conflicts the user resolved, with the chosen direction.
    pub resolved: Vec<(String, ConflictChoice)>,
    /// Conflicts the user deferred; excluded from watermark stamping.
    pub skipped_conflicts: Vec<String>,
    /// Server-side-only removals, reported but never acted on locally.
    pub remote_only: Vec<String>,
    /// The user declined the local-removal prompt; the watermark stays put so
    /// the question comes back next pass.
    pub removal_declined: bool,
    /// Whether finalization advanced the global watermark.
    pub watermark_advanced: bool,
}

impl SyncReport {
    fn nothing_to_do() -> Self {
        Self {
            outcome: PassOutcome::NothingToDo,
            ..Self::default()
        }
    }

    /// Paths whose per-path sync time gets stamped after a successful pass:
    /// everything uploaded, downloaded, or conflict-resolved, skips excluded.
    pub fn synced_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .uploaded
            .iter()
            .chain(self.downloaded.iter())
            .cloned()
            .collect();
        paths.extend(self.resolved.iter().map(|(p, _)| p.clone()));
        paths.sort();
        paths.dedup();
        paths
    }

    /// Total number of actions the pass carried out.
    pub fn total_actions(&self) -> usize {
        self.uploaded.len() + self.downloaded.len() + self.removed.len() + self.resolved.len()
    }
}

/// Clears the running flag on every exit path.
struct Running<'a>(&'a AtomicBool);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The sync engine. Holds the local inventory behind its own lock; inventory
/// mutation only ever happens inside a pass, serialized by the running guard.
pub struct SyncEngine {
    api: Arc<ApiClient>,
    store: Arc<dyn DocumentStore>,
    interaction: Arc<dyn Interaction>,
    settings: Arc<RwLock<Settings>>,
    settings_store: Arc<dyn SettingsStore>,
    inventory: Mutex<LocalInventory>,
    config: SyncEngineConfig,
    running: AtomicBool,
    interrupt: InterruptHandle,
}

impl SyncEngine {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<dyn DocumentStore>,
        interaction: Arc<dyn Interaction>,
        inventory: LocalInventory,
        settings: Arc<RwLock<Settings>>,
        settings_store: Arc<dyn SettingsStore>,
        config: SyncEngineConfig,
    ) -> Self {
        Self {
            api,
            store,
            interaction,
            settings,
            settings_store,
            inventory: Mutex::new(inventory),
            config,
            running: AtomicBool::new(false),
            interrupt: InterruptHandle::new(),
        }
    }

    /// Read the persisted inventory back and refresh it against the store.
    /// Hosts call this once at startup, before the first pass.
    pub async fn load_inventory(&self) -> Result<bool> {
        self.inventory.lock().await.load().await
    }

    /// Handle for cancelling the running pass from another task.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Whether a pass is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one full sync pass.
    #[instrument(skip(self), fields(subsystem = "sync", component = "engine", op = "sync_all"))]
    pub async fn sync_all(&self) -> Result<SyncReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SyncInProgress);
        }
        let _guard = Running(&self.running);
        self.interrupt.reset();
        let start = Instant::now();

        let result = self.run_pass().await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(report) => {
                info!(
                    uploaded = report.uploaded.len(),
                    downloaded = report.downloaded.len(),
                    removed = report.removed.len(),
                    resolved = report.resolved.len(),
                    interrupted = report.outcome == PassOutcome::Interrupted,
                    duration_ms,
                    "Sync pass finished"
                );
            }
            Err(e) => {
                error!(error = %e, duration_ms, "Sync pass failed");
                self.interaction.notify(&format!("Sync failed: {e}")).await;
            }
        }
        result
    }

    async fn run_pass(&self) -> Result<SyncReport> {
        let mut inventory = self.inventory.lock().await;
        inventory.update().await?;

        // Snapshot after the refresh so the index watermark reflects it.
        let (sync_cfg, user_name) = {
            let settings = self.settings.read().await;
            (settings.sync.clone(), settings.server.username.clone())
        };

        // The inventory has not changed since the last successful pass; a
        // lightweight probe can save the full compare round-trip.
        if sync_cfg.last_sync_time > sync_cfg.last_index_time {
            let changed = self
                .api
                .check_update(&user_name, &sync_cfg.vault, sync_cfg.last_sync_time)
                .await?;
            if !changed {
                debug!("Remote unchanged since last sync, short-circuiting");
                self.interaction.notify("Already in sync").await;
                return Ok(SyncReport::nothing_to_do());
            }
        }

        let rules = PathRules::new(&sync_cfg.include, &sync_cfg.exclude);
        let files = inventory.snapshot(&rules);
        let plan = self
            .api
            .compare(&CompareRequest {
                user_name: user_name.clone(),
                vault: sync_cfg.vault.clone(),
                include: sync_cfg.include.clone(),
                exclude: sync_cfg.exclude.clone(),
                last_sync_time: sync_cfg.last_sync_time,
                files,
            })
            .await?
            .normalized();

        if plan.is_empty() {
            self.interaction.notify("Already in sync").await;
            return Ok(SyncReport::nothing_to_do());
        }
        debug!(
            upload = plan.upload.len(),
            download = plan.download.len(),
            remove_local = plan.remove_local.len(),
            remove_remote = plan.remove_remote.len(),
            conflicts = plan.conflicts.len(),
            "Compare partitions"
        );

        let mut report = SyncReport::default();
        if !self.note_interrupt(&mut report) {
            self.run_uploads(&plan.upload, &sync_cfg, &user_name, &mut report)
                .await?;
        }
        if !self.note_interrupt(&mut report) {
            self.run_downloads(&plan.download, &mut report).await?;
        }
        if !self.note_interrupt(&mut report) {
            self.run_removals(&plan.remove_local, &plan.remove_remote, &mut report)
                .await?;
        }
        if !self.note_interrupt(&mut report) {
            self.run_conflicts(&plan.conflicts, &sync_cfg, &user_name, &mut report)
                .await?;
        }

        self.finalize(&mut inventory, &mut report).await?;
        Ok(report)
    }

    /// Upload one document on demand, outside a full pass. Returns whether
    /// the server accepted it; acceptance stamps the per-path sync time but
    /// never advances the global watermark.
    #[instrument(skip(self), fields(subsystem = "sync", component = "engine", op = "sync_document", doc_path = %path))]
    pub async fn sync_document(&self, path: &str) -> Result<bool> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SyncInProgress);
        }
        let _guard = Running(&self.running);

        let (sync_cfg, user_name) = {
            let settings = self.settings.read().await;
            (settings.sync.clone(), settings.server.username.clone())
        };
        let rules = PathRules::new(&sync_cfg.include, &sync_cfg.exclude);
        if !rules.admits(path) {
            return Err(Error::InvalidInput(format!(
                "{path} is outside the configured sync scope"
            )));
        }

        let bytes = self.store.read(path).await?;
        let file = UploadFile::new(path, content_md5(&bytes), bytes);
        let batch = UploadBatch::new(&sync_cfg.vault, &user_name).with_file(file);
        let outcome = self.api.upload_documents(&batch).await?;
        if outcome.embedding_failed() {
            self.interaction
                .notify("Uploaded, but the server could not embed the content")
                .await;
        }

        let accepted = outcome.accepted.iter().any(|p| p == path);
        if accepted {
            let mut inventory = self.inventory.lock().await;
            inventory.update().await?;
            inventory
                .update_files_sync_time(&[path.to_string()], now_ms() + WATERMARK_SKEW_MS)
                .await?;
        } else {
            warn!("Server did not accept the document");
            self.interaction
                .notify(&format!("Server did not accept {path}"))
                .await;
        }
        Ok(accepted)
    }

    /// Flip the report to interrupted when the flag is set.
    fn note_interrupt(&self, report: &mut SyncReport) -> bool {
        if self.interrupt.is_interrupted() {
            report.outcome = PassOutcome::Interrupted;
            true
        } else {
            false
        }
    }

    // ─── Uploading ─────────────────────────────────────────────────────────

    async fn run_uploads(
        &self,
        items: &[SyncItem],
        sync_cfg: &SyncSettings,
        user_name: &str,
        report: &mut SyncReport,
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut files = Vec::with_capacity(items.len());
        for item in items {
            match self.store.read(&item.addr).await {
                Ok(bytes) => {
                    let digest = content_md5(&bytes);
                    files.push(UploadFile::new(item.addr.clone(), digest, bytes));
                }
                Err(e) => {
                    // One unreadable document does not sink the batch.
                    warn!(doc_path = %item.addr, error = %e, "Skipping unreadable document");
                    self.interaction
                        .notify(&format!("Could not read {} for upload: {e}", item.addr))
                        .await;
                }
            }
        }
        if files.is_empty() {
            return Ok(());
        }

        let payload_bytes: usize = files.iter().map(|f| f.content.len()).sum();
        let oversized = payload_bytes > self.config.async_payload_bytes
            || files.len() > self.config.async_file_threshold;
        if oversized {
            match self.api.async_support().await {
                Ok(true) => {
                    return self
                        .upload_async(files, sync_cfg, user_name, report)
                        .await;
                }
                Ok(false) => {
                    debug!("Server lacks async upload, using grouped upload");
                }
                Err(e) => {
                    warn!(error = %e, "Async capability probe failed, using grouped upload");
                }
            }
        }
        self.upload_grouped(files, sync_cfg, user_name, report).await
    }

    /// Synchronous mode: fixed-size groups uploaded sequentially, interrupt
    /// checked before each group.
    async fn upload_grouped(
        &self,
        files: Vec<UploadFile>,
        sync_cfg: &SyncSettings,
        user_name: &str,
        report: &mut SyncReport,
    ) -> Result<()> {
        let total = files.len();
        let mut done = 0;
        for group in files.chunks(self.config.upload_group_size.max(1)) {
            if self.note_interrupt(report) {
                info!(done, total, "Upload interrupted, remaining groups skipped");
                return Ok(());
            }
            let mut batch = UploadBatch::new(&sync_cfg.vault, user_name);
            for file in group {
                batch = batch.with_file(file.clone());
            }
            let outcome = self.api.upload_documents(&batch).await?;
            if outcome.embedding_failed() {
                self.interaction
                    .notify("Uploaded, but the server could not embed the content")
                    .await;
            }
            report.uploaded.extend(outcome.accepted);
            done += group.len();
            self.interaction.progress(done, total).await;
        }
        Ok(())
    }

    /// Asynchronous mode: one submission, then bounded status polling. A task
    /// missing from the running list already completed and was pruned.
    async fn upload_async(
        &self,
        files: Vec<UploadFile>,
        sync_cfg: &SyncSettings,
        user_name: &str,
        report: &mut SyncReport,
    ) -> Result<()> {
        let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        let total = paths.len();

        let mut batch = UploadBatch::new(&sync_cfg.vault, user_name).asynchronous();
        for file in files {
            batch = batch.with_file(file);
        }
        let outcome = self.api.upload_documents(&batch).await?;
        if outcome.embedding_failed() {
            self.interaction
                .notify("Uploaded, but the server could not embed the content")
                .await;
        }
        let Some(task_id) = outcome.task_id else {
            // The server ran the batch inline after all.
            report.uploaded.extend(outcome.accepted);
            return Ok(());
        };
        info!(task_id = %task_id, file_count = total, "Asynchronous upload task submitted");

        for attempt in 1..=self.config.max_poll_attempts {
            if self.interrupt.is_interrupted() {
                if let Err(e) = self.api.terminate_task(&task_id).await {
                    warn!(task_id = %task_id, error = %e, "Task termination request failed");
                }
                report.outcome = PassOutcome::Interrupted;
                return Ok(());
            }
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;

            let tasks = self.api.running_tasks().await?;
            match tasks.iter().find(|t| t.task_id == task_id) {
                Some(task) if task.is_failure() => {
                    return Err(Error::TaskFailed {
                        task_id,
                        detail: task
                            .error
                            .clone()
                            .unwrap_or_else(|| "no detail reported".to_string()),
                    });
                }
                Some(task) if !task.is_success() => {
                    debug!(
                        task_id = %task_id,
                        poll_attempt = attempt,
                        current = task.progress.current,
                        "Upload task still running"
                    );
                    self.interaction
                        .progress(task.progress.current.max(0) as usize, total)
                        .await;
                }
                // Success, or already pruned from the running list.
                _ => {
                    report.uploaded.extend(paths);
                    self.interaction.progress(total, total).await;
                    return Ok(());
                }
            }
        }
        Err(Error::TaskTimeout(task_id))
    }

    // ─── Downloading ───────────────────────────────────────────────────────

    /// Sequential per-file downloads. The first failure aborts the whole
    /// batch to avoid a partially inconsistent local state.
    async fn run_downloads(&self, items: &[SyncItem], report: &mut SyncReport) -> Result<()> {
        let total = items.len();
        for (done, item) in items.iter().enumerate() {
            if self.note_interrupt(report) {
                info!(done, total, "Download interrupted, remaining files skipped");
                return Ok(());
            }
            let idx = item.idx.ok_or_else(|| {
                Error::InvalidInput(format!("download entry {} carries no remote id", item.addr))
            })?;
            let bytes = self.api.download_entry(idx).await?;
            self.store.write(&item.addr, &bytes).await?;
            report.downloaded.push(item.addr.clone());
            self.interaction.progress(done + 1, total).await;
        }
        Ok(())
    }

    // ─── Removing ──────────────────────────────────────────────────────────

    async fn run_removals(
        &self,
        remove_local: &[SyncItem],
        remove_remote: &[SyncItem],
        report: &mut SyncReport,
    ) -> Result<()> {
        if !remove_local.is_empty() {
            let prompt = format!(
                "Remove {} local document(s) that no longer exist on the server?",
                remove_local.len()
            );
            if self.interaction.confirm(&prompt).await {
                for item in remove_local {
                    if self.note_interrupt(report) {
                        return Ok(());
                    }
                    match self.store.trash(&item.addr).await {
                        Ok(()) => report.removed.push(item.addr.clone()),
                        Err(e) => {
                            warn!(doc_path = %item.addr, error = %e, "Failed to trash document");
                            self.interaction
                                .notify(&format!("Could not remove {}: {e}", item.addr))
                                .await;
                        }
                    }
                }
            } else {
                // Dismissal or refusal both keep the documents. The watermark
                // stays put so the prompt returns next pass.
                debug!(
                    file_count = remove_local.len(),
                    "Local removal declined, documents kept"
                );
                report.removal_declined = true;
            }
        }

        if !remove_remote.is_empty() {
            // Server-side-only removals settle when the watermark advances;
            // no delete call is ever issued from here.
            report.remote_only = remove_remote.iter().map(|i| i.addr.clone()).collect();
            self.interaction
                .notify(&format!(
                    "{} document(s) will be removed on the server",
                    remove_remote.len()
                ))
                .await;
        }
        Ok(())
    }

    // ─── Resolving conflicts ───────────────────────────────────────────────

    /// Three-way decision per conflicted document: local wins, remote wins,
    /// or defer. A dismissed prompt resolves to defer.
    async fn run_conflicts(
        &self,
        items: &[SyncItem],
        sync_cfg: &SyncSettings,
        user_name: &str,
        report: &mut SyncReport,
    ) -> Result<()> {
        for item in items {
            if self.note_interrupt(report) {
                return Ok(());
            }
            let choice = self.interaction.resolve_conflict(&item.addr).await;
            debug!(doc_path = %item.addr, choice = %choice, "Conflict resolved");
            match choice {
                ConflictChoice::Upload => {
                    let bytes = self.store.read(&item.addr).await?;
                    let file = UploadFile::new(item.addr.clone(), content_md5(&bytes), bytes);
                    let batch = UploadBatch::new(&sync_cfg.vault, user_name).with_file(file);
                    self.api.upload_documents(&batch).await?;
                    report
                        .resolved
                        .push((item.addr.clone(), ConflictChoice::Upload));
                }
                ConflictChoice::Download => {
                    let idx = item.idx.ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "conflict entry {} carries no remote id",
                            item.addr
                        ))
                    })?;
                    let bytes = self.api.download_entry(idx).await?;
                    self.store.write(&item.addr, &bytes).await?;
                    report
                        .resolved
                        .push((item.addr.clone(), ConflictChoice::Download));
                }
                ConflictChoice::Skip => {
                    report.skipped_conflicts.push(item.addr.clone());
                }
            }
        }
        Ok(())
    }

    // ─── Finalizing ────────────────────────────────────────────────────────

    /// After the settle delay, a fully successful pass advances the global
    /// watermark (never backward) and stamps per-path sync times for every
    /// settled path. Interrupted or declined passes leave both untouched.
    async fn finalize(
        &self,
        inventory: &mut LocalInventory,
        report: &mut SyncReport,
    ) -> Result<()> {
        sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        if report.outcome != PassOutcome::Completed {
            info!(interrupted = true, "Watermark left unchanged");
            return Ok(());
        }
        if report.removal_declined {
            debug!("Removal declined, watermark left unchanged");
            return Ok(());
        }

        let stamp = now_ms() + WATERMARK_SKEW_MS;
        {
            let mut settings = self.settings.write().await;
            if stamp > settings.sync.last_sync_time {
                settings.sync.last_sync_time = stamp;
            }
        }
        let snapshot = self.settings.read().await.clone();
        self.settings_store
            .persist(&snapshot)
            .await
            .map_err(|e| Error::Persist(format!("watermark persist failed: {e}")))?;

        let synced = report.synced_paths();
        if !synced.is_empty() {
            inventory.update().await?;
            inventory.update_files_sync_time(&synced, stamp).await?;
        }
        report.watermark_advanced = true;
        debug!(
            last_sync_time = stamp,
            stamped = synced.len(),
            "Watermark advanced"
        );
        Ok(())
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Periodic sync driver. Reads the configured interval (minutes, 0 disables)
/// and triggers a full pass on every tick; a tick that lands while a pass is
/// still running is a no-op, courtesy of the engine's own guard.
pub struct Scheduler {
    engine: Arc<SyncEngine>,
    interval_override: Option<Duration>,
}

/// Handle for stopping a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Signal the scheduler to stop after the current tick.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::InvalidInput("scheduler already stopped".to_string()))
    }
}

impl Scheduler {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            interval_override: None,
        }
    }

    /// Override the settings-derived interval, for tests and hosts with their
    /// own timers.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_override = Some(interval);
        self
    }

    /// Spawn the tick loop and return a control handle.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });
        SchedulerHandle { shutdown_tx }
    }

    #[instrument(skip(self, shutdown_rx), fields(subsystem = "sync", component = "scheduler", op = "run"))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        let interval = match self.interval_override {
            Some(interval) => Some(interval),
            None => {
                let mins = self.engine.settings.read().await.sync.interval_mins;
                (mins > 0).then(|| Duration::from_secs(mins * 60))
            }
        };
        let Some(interval) = interval else {
            info!("Periodic sync is disabled, scheduler not starting");
            return;
        };
        info!(interval_secs = interval.as_secs(), "Sync scheduler started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Sync scheduler received shutdown signal");
                    break;
                }
                _ = sleep(interval) => {}
            }
            match self.engine.sync_all().await {
                Ok(report) => {
                    debug!(outcome = ?report.outcome, "Scheduled sync tick finished");
                }
                Err(Error::SyncInProgress) => {
                    debug!("Tick overlapped a running pass, skipped");
                }
                Err(e) => {
                    warn!(error = %e, "Scheduled sync failed");
                }
            }
        }
    }
}
