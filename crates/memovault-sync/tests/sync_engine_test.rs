//! Integration tests for the sync engine state machine against a mock server:
//! plan execution order, grouped and asynchronous uploads, confirmation and
//! conflict prompts, interruption, and watermark semantics.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use memovault_client::ApiClient;
use memovault_core::{
    ConflictChoice, DocumentRecord, Error, Interaction, MemoryDocumentStore, MemorySettingsStore,
    ScriptedInteraction, ServerConfig, Settings, SyncSettings,
};
use memovault_sync::{
    content_md5, InterruptHandle, LocalInventory, MemorySideStore, PassOutcome, Scheduler,
    SideStore, SyncEngine, SyncEngineConfig,
};

struct Harness {
    server: MockServer,
    docs: Arc<MemoryDocumentStore>,
    side: Arc<MemorySideStore>,
    settings: Arc<RwLock<Settings>>,
    ui: Arc<ScriptedInteraction>,
    engine: Arc<SyncEngine>,
}

async fn harness(config: SyncEngineConfig) -> Harness {
    let ui = Arc::new(ScriptedInteraction::new());
    harness_with_ui(config, ui.clone(), ui).await
}

async fn harness_with_ui(
    config: SyncEngineConfig,
    interaction: Arc<dyn Interaction>,
    ui: Arc<ScriptedInteraction>,
) -> Harness {
    let server = MockServer::start().await;
    let settings = Arc::new(RwLock::new(Settings {
        server: ServerConfig::new(server.uri())
            .with_credentials("alice", "secret")
            .with_token("tok-1"),
        sync: SyncSettings::default().with_vault("main"),
        ..Settings::default()
    }));
    let settings_store = Arc::new(MemorySettingsStore::new());
    let api = Arc::new(ApiClient::new(settings.clone(), settings_store.clone()).expect("client"));
    let docs = Arc::new(MemoryDocumentStore::new());
    let side = Arc::new(MemorySideStore::new());
    let inventory = LocalInventory::new(
        docs.clone(),
        side.clone(),
        settings.clone(),
        settings_store.clone(),
    );
    let engine = Arc::new(SyncEngine::new(
        api,
        docs.clone(),
        interaction,
        inventory,
        settings.clone(),
        settings_store,
        // Real settle delays would only slow the suite down.
        config.with_settle_delay(0),
    ));
    Harness {
        server,
        docs,
        side,
        settings,
        ui,
        engine,
    }
}

fn persisted_records(side: &MemorySideStore) -> BTreeMap<String, DocumentRecord> {
    serde_json::from_slice(&side.bytes().expect("inventory persisted")).expect("valid json")
}

async fn mount_compare(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/sync/"))
        .and(body_string_contains("rtype=compare"))
        .and(header("Authorization", "Token tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, accepted: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": accepted
        })))
        .mount(server)
        .await;
}

// =============================================================================
// Full pass
// =============================================================================

#[tokio::test]
async fn test_full_pass_uploads_and_advances_watermark() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [{"addr": "notes/a.md"}]}),
    )
    .await;
    mount_upload(&h.server, serde_json::json!(["notes/a.md"])).await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.uploaded, vec!["notes/a.md"]);
    assert!(report.watermark_advanced);
    assert_eq!(h.ui.progress_updates(), vec![(1, 1)]);

    // The per-path stamp equals the advanced global watermark.
    let last_sync = h.settings.read().await.sync.last_sync_time;
    assert!(last_sync > 0);
    let records = persisted_records(&h.side);
    assert_eq!(records["notes/a.md"].last_sync_time, last_sync);
}

#[tokio::test]
async fn test_empty_plan_reports_nothing_to_do() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    mount_compare(&h.server, serde_json::json!({})).await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::NothingToDo);
    assert!(!report.watermark_advanced);
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
}

#[tokio::test]
async fn test_check_update_short_circuits_unchanged_remote() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    // Persisted inventory matches the store, so the refresh will not bump
    // the index watermark past the sync watermark.
    let mut records = BTreeMap::new();
    records.insert(
        "notes/a.md".to_string(),
        DocumentRecord::new("notes/a.md", content_md5(b"alpha"), 100).with_last_sync_time(900),
    );
    h.side
        .write(&serde_json::to_vec(&records).unwrap())
        .await
        .unwrap();
    assert!(!h.engine.load_inventory().await.unwrap());
    {
        let mut settings = h.settings.write().await;
        settings.sync.last_sync_time = 1000;
        settings.sync.last_index_time = 500;
    }

    Mock::given(method("POST"))
        .and(path("/api/sync/"))
        .and(body_string_contains("rtype=check_update"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"update": false})),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sync/"))
        .and(body_string_contains("rtype=compare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::NothingToDo);
    assert_eq!(h.settings.read().await.sync.last_sync_time, 1000);
}

#[tokio::test]
async fn test_include_prefix_filters_compare_snapshot() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("journal/j.md", b"journal", 2, 200);
    h.settings.write().await.sync.include = "notes/".to_string();

    Mock::given(method("POST"))
        .and(path("/api/sync/"))
        .and(body_string_contains("rtype=compare"))
        .and(body_string_contains("notes%2Fa.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.engine.sync_all().await.expect("pass");

    // The form-encoded files field never mentions the out-of-scope path.
    let requests = h.server.received_requests().await.unwrap();
    let compare_body = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .find(|b| b.contains("rtype=compare"))
        .expect("compare request");
    assert!(!compare_body.contains("journal"));
}

// =============================================================================
// Downloads
// =============================================================================

#[tokio::test]
async fn test_download_writes_files_locally() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.set_write_clock(5000);

    mount_compare(
        &h.server,
        serde_json::json!({"download_list": [{"addr": "notes/new.md", "idx": 7}]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/entry/data/7/download/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"from server".to_vec()))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.downloaded, vec!["notes/new.md"]);
    assert_eq!(h.docs.content("notes/new.md").unwrap(), b"from server");
    assert!(report.watermark_advanced);

    let records = persisted_records(&h.side);
    let last_sync = h.settings.read().await.sync.last_sync_time;
    assert_eq!(records["notes/new.md"].last_sync_time, last_sync);
}

#[tokio::test]
async fn test_download_failure_aborts_batch_and_watermark() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    mount_compare(
        &h.server,
        serde_json::json!({"download_list": [
            {"addr": "notes/bad.md", "idx": 1},
            {"addr": "notes/never.md", "idx": 2}
        ]}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/entry/data/1/download/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk error"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/entry/data/2/download/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h.engine.sync_all().await.expect_err("should abort");
    assert!(matches!(err, Error::Server { status: 500, .. }));
    assert!(!h.docs.contains("notes/never.md"));
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
    // The failure surfaced as a user-visible advisory.
    assert!(h.ui.notices().iter().any(|n| n.contains("Sync failed")));
}

// =============================================================================
// Removals
// =============================================================================

#[tokio::test]
async fn test_confirmed_removal_trashes_documents() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/old.md", b"old", 1, 100);
    h.ui.push_confirm(true);

    mount_compare(
        &h.server,
        serde_json::json!({
            "remove_list": [{"addr": "notes/old.md"}],
            "cloud_remove_list": [{"addr": "notes/cloud-only.md"}]
        }),
    )
    .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.removed, vec!["notes/old.md"]);
    assert_eq!(report.remote_only, vec!["notes/cloud-only.md"]);
    assert_eq!(h.docs.trashed(), vec!["notes/old.md".to_string()]);
    assert!(report.watermark_advanced);
}

#[tokio::test]
async fn test_declined_removal_keeps_files_and_watermark() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/old.md", b"old", 1, 100);
    // No scripted answer: a dismissed prompt is a refusal.

    mount_compare(
        &h.server,
        serde_json::json!({"remove_list": [{"addr": "notes/old.md"}]}),
    )
    .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert!(report.removal_declined);
    assert!(report.removed.is_empty());
    assert!(!report.watermark_advanced);
    assert!(h.docs.contains("notes/old.md"));
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
}

// =============================================================================
// Conflicts
// =============================================================================

#[tokio::test]
async fn test_conflict_skip_is_excluded_from_stamping() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/both.md", b"mine", 2, 200);
    h.ui.push_conflict_choice(ConflictChoice::Skip);

    // The conflicted path also appears in upload_list; normalization strips
    // it so the user's decision is the only action taken for it.
    mount_compare(
        &h.server,
        serde_json::json!({
            "upload_list": [{"addr": "notes/a.md"}, {"addr": "notes/both.md"}],
            "conflict_list": [{"addr": "notes/both.md", "idx": 4}]
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": ["notes/a.md"]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.uploaded, vec!["notes/a.md"]);
    assert_eq!(report.skipped_conflicts, vec!["notes/both.md"]);
    assert!(report.watermark_advanced);

    let records = persisted_records(&h.side);
    let last_sync = h.settings.read().await.sync.last_sync_time;
    assert_eq!(records["notes/a.md"].last_sync_time, last_sync);
    assert_eq!(records["notes/both.md"].last_sync_time, 0);
}

#[tokio::test]
async fn test_conflict_upload_and_download_resolutions() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/mine.md", b"local wins", 1, 100);
    h.docs.insert("notes/theirs.md", b"stale", 2, 200);
    h.docs.set_write_clock(9000);
    h.ui.push_conflict_choice(ConflictChoice::Upload);
    h.ui.push_conflict_choice(ConflictChoice::Download);

    mount_compare(
        &h.server,
        serde_json::json!({"conflict_list": [
            {"addr": "notes/mine.md"},
            {"addr": "notes/theirs.md", "idx": 9}
        ]}),
    )
    .await;
    mount_upload(&h.server, serde_json::json!(["notes/mine.md"])).await;
    Mock::given(method("GET"))
        .and(path("/api/entry/data/9/download/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote wins".to_vec()))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(
        report.resolved,
        vec![
            ("notes/mine.md".to_string(), ConflictChoice::Upload),
            ("notes/theirs.md".to_string(), ConflictChoice::Download),
        ]
    );
    assert_eq!(h.docs.content("notes/theirs.md").unwrap(), b"remote wins");

    let records = persisted_records(&h.side);
    let last_sync = h.settings.read().await.sync.last_sync_time;
    assert_eq!(records["notes/mine.md"].last_sync_time, last_sync);
    assert_eq!(records["notes/theirs.md"].last_sync_time, last_sync);
}

// =============================================================================
// Interruption
// =============================================================================

/// Interaction that trips the interrupt flag from the first progress report,
/// simulating a user cancel between upload groups.
#[derive(Default)]
struct InterruptOnProgress {
    handle: std::sync::Mutex<Option<InterruptHandle>>,
}

#[async_trait]
impl Interaction for InterruptOnProgress {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }

    async fn resolve_conflict(&self, _path: &str) -> ConflictChoice {
        ConflictChoice::Skip
    }

    async fn notify(&self, _message: &str) {}

    async fn progress(&self, _done: usize, _total: usize) {
        if let Some(handle) = self.handle.lock().unwrap().as_ref() {
            handle.interrupt();
        }
    }
}

#[tokio::test]
async fn test_interrupt_stops_before_next_upload_group() {
    let interrupter = Arc::new(InterruptOnProgress::default());
    let h = harness_with_ui(
        SyncEngineConfig::default().with_upload_group_size(1),
        interrupter.clone(),
        Arc::new(ScriptedInteraction::new()),
    )
    .await;
    *interrupter.handle.lock().unwrap() = Some(h.engine.interrupt_handle());
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/b.md", b"beta", 2, 200);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [
            {"addr": "notes/a.md"},
            {"addr": "notes/b.md"}
        ]}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": ["notes/a.md"]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::Interrupted);
    assert_eq!(report.uploaded, vec!["notes/a.md"]);
    assert!(!report.watermark_advanced);
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
}

// =============================================================================
// Asynchronous upload
// =============================================================================

fn async_config() -> SyncEngineConfig {
    SyncEngineConfig::default()
        .with_async_thresholds(1, 1)
        .with_poll_interval(10)
}

async fn mount_async_support(server: &MockServer, supported: bool) {
    Mock::given(method("GET"))
        .and(path("/api/tasks/async_support/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "async_supported": supported
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_async_upload_pruned_task_counts_as_success() {
    let h = harness(async_config()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/b.md", b"beta", 2, 200);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [
            {"addr": "notes/a.md"},
            {"addr": "notes/b.md"}
        ]}),
    )
    .await;
    mount_async_support(&h.server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [], "task_id": "task-9"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    // Already gone from the running list: completed and pruned.
    Mock::given(method("GET"))
        .and(path("/api/tasks/running_tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": []
        })))
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.uploaded, vec!["notes/a.md", "notes/b.md"]);
    assert!(report.watermark_advanced);
}

#[tokio::test]
async fn test_async_upload_task_failure_surfaces_detail() {
    let h = harness(async_config()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/b.md", b"beta", 2, 200);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [
            {"addr": "notes/a.md"},
            {"addr": "notes/b.md"}
        ]}),
    )
    .await;
    mount_async_support(&h.server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [], "task_id": "task-9"
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/running_tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"task_id": "task-9", "status": "FAILURE", "error": "disk full"}]
        })))
        .mount(&h.server)
        .await;

    let err = h.engine.sync_all().await.expect_err("task failed");
    match err {
        Error::TaskFailed { task_id, detail } => {
            assert_eq!(task_id, "task-9");
            assert_eq!(detail, "disk full");
        }
        other => panic!("Expected TaskFailed, got {other:?}"),
    }
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
}

#[tokio::test]
async fn test_async_upload_poll_ceiling_times_out() {
    let h = harness(async_config().with_max_poll_attempts(2)).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/b.md", b"beta", 2, 200);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [
            {"addr": "notes/a.md"},
            {"addr": "notes/b.md"}
        ]}),
    )
    .await;
    mount_async_support(&h.server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [], "task_id": "task-9"
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/running_tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"task_id": "task-9", "status": "RUNNING", "progress": {"current": 1}}]
        })))
        .expect(2)
        .mount(&h.server)
        .await;

    let err = h.engine.sync_all().await.expect_err("timeout");
    assert!(matches!(err, Error::TaskTimeout(_)));
}

#[tokio::test]
async fn test_async_unsupported_falls_back_to_grouped_upload() {
    let h = harness(async_config()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/b.md", b"beta", 2, 200);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [
            {"addr": "notes/a.md"},
            {"addr": "notes/b.md"}
        ]}),
    )
    .await;
    mount_async_support(&h.server, false).await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": ["notes/a.md", "notes/b.md"]
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.uploaded.len(), 2);
}

#[tokio::test]
async fn test_interrupt_during_async_poll_terminates_task_once() {
    let interrupter = Arc::new(InterruptOnProgress::default());
    let h = harness_with_ui(
        async_config(),
        interrupter.clone(),
        Arc::new(ScriptedInteraction::new()),
    )
    .await;
    *interrupter.handle.lock().unwrap() = Some(h.engine.interrupt_handle());
    h.docs.insert("notes/a.md", b"alpha", 1, 100);
    h.docs.insert("notes/b.md", b"beta", 2, 200);

    mount_compare(
        &h.server,
        serde_json::json!({"upload_list": [
            {"addr": "notes/a.md"},
            {"addr": "notes/b.md"}
        ]}),
    )
    .await;
    mount_async_support(&h.server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/entry/data/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [], "task_id": "task-9"
        })))
        .mount(&h.server)
        .await;
    // The first status report trips the interrupt, so exactly one poll lands.
    Mock::given(method("GET"))
        .and(path("/api/tasks/running_tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"task_id": "task-9", "status": "RUNNING", "progress": {"current": 1}}]
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/task-9/terminate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": 0})))
        .expect(1)
        .mount(&h.server)
        .await;

    let report = h.engine.sync_all().await.expect("pass");
    assert_eq!(report.outcome, PassOutcome::Interrupted);
    assert!(report.uploaded.is_empty());
    assert!(!report.watermark_advanced);
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
}

// =============================================================================
// Single-document sync
// =============================================================================

#[tokio::test]
async fn test_sync_document_stamps_path_without_global_watermark() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    mount_upload(&h.server, serde_json::json!(["notes/a.md"])).await;

    let accepted = h.engine.sync_document("notes/a.md").await.expect("upload");
    assert!(accepted);

    let records = persisted_records(&h.side);
    assert!(records["notes/a.md"].last_sync_time > 0);
    assert_eq!(h.settings.read().await.sync.last_sync_time, 0);
}

#[tokio::test]
async fn test_sync_document_outside_scope_is_rejected() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("journal/x.md", b"secret", 1, 100);
    h.settings.write().await.sync.include = "notes/".to_string();

    let err = h.engine.sync_document("journal/x.md").await.expect_err("scope");
    assert!(matches!(err, Error::InvalidInput(_)));
}

// =============================================================================
// Re-entrancy and scheduling
// =============================================================================

#[tokio::test]
async fn test_second_pass_rejected_while_running() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    Mock::given(method("POST"))
        .and(path("/api/sync/"))
        .and(body_string_contains("rtype=compare"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&h.server)
        .await;

    let engine = h.engine.clone();
    let first = tokio::spawn(async move { engine.sync_all().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = h.engine.sync_all().await.expect_err("re-entrant");
    assert!(matches!(err, Error::SyncInProgress));

    let report = first.await.unwrap().expect("first pass");
    assert_eq!(report.outcome, PassOutcome::NothingToDo);
}

#[tokio::test]
async fn test_scheduler_triggers_periodic_passes() {
    let h = harness(SyncEngineConfig::default()).await;
    h.docs.insert("notes/a.md", b"alpha", 1, 100);

    Mock::given(method("POST"))
        .and(path("/api/sync/"))
        .and(body_string_contains("rtype=compare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1..)
        .mount(&h.server)
        .await;

    let handle = Scheduler::new(h.engine.clone())
        .with_interval(Duration::from_millis(30))
        .start();
    tokio::time::sleep(Duration::from_millis(120)).await;
    handle.shutdown().await.expect("shutdown");
}
