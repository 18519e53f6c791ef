//! Typed bindings for the remote note service endpoints.
//!
//! Every call goes through the authenticated-request wrapper: a missing token
//! triggers a login, and a 401 response invalidates the cached token and
//! retries the call once with a fresh one. Non-2xx statuses are classified
//! into the crate error taxonomy; transport failures surface as
//! `Error::Connectivity`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use memovault_core::{
    DocumentRecord, Error, Result, SearchMethod, Settings, SettingsStore, SyncItem, SyncPlan,
};

use crate::session::{endpoint, AuthSession};

/// Client identifier sent in the `source` field of every upload.
pub const UPLOAD_SOURCE: &str = "memovault";

/// Default result ceiling for remote searches.
pub const DEFAULT_MAX_COUNT: usize = 100;

// =============================================================================
// REQUEST SHAPES
// =============================================================================

/// Query for the entry search endpoint. Empty string fields are omitted from
/// the request.
#[derive(Debug, Clone)]
pub struct EntryQuery {
    pub keyword: String,
    pub ctype: String,
    pub etype: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    /// Search mode selector; `None` leaves the choice to the server.
    pub method: Option<SearchMethod>,
    pub exclude: String,
    pub max_count: usize,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            ctype: String::new(),
            etype: String::new(),
            status: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            method: None,
            exclude: String::new(),
            max_count: DEFAULT_MAX_COUNT,
        }
    }
}

impl EntryQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    pub fn with_etype(mut self, etype: impl Into<String>) -> Self {
        self.etype = etype.into();
        self
    }

    pub fn with_ctype(mut self, ctype: impl Into<String>) -> Self {
        self.ctype = ctype.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = start.into();
        self.end_date = end.into();
        self
    }

    pub fn with_method(mut self, method: SearchMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = exclude.into();
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }
}

/// One document payload in an upload batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Vault-relative path, sent as the `filepaths` field.
    pub path: String,
    /// Hex md5 of `content`, sent as the `filemd5s` field.
    pub md5: String,
    pub content: Vec<u8>,
}

impl UploadFile {
    pub fn new(path: impl Into<String>, md5: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            md5: md5.into(),
            content,
        }
    }

    /// File name for the multipart part, the last path segment.
    fn part_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Multipart upload request for a group of documents.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub vault: String,
    pub user_name: String,
    /// Request a server-side task instead of an inline upload.
    pub is_async: bool,
    pub files: Vec<UploadFile>,
}

impl UploadBatch {
    pub fn new(vault: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            vault: vault.into(),
            user_name: user_name.into(),
            is_async: false,
            files: Vec::new(),
        }
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn with_file(mut self, file: UploadFile) -> Self {
        self.files.push(file);
        self
    }

    /// Total content size across all files.
    pub fn payload_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }
}

/// Inventory comparison request; `files` is the filtered local snapshot.
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub user_name: String,
    pub vault: String,
    /// Comma-separated include prefixes, as configured.
    pub include: String,
    /// Comma-separated exclude wildcard rules, as configured.
    pub exclude: String,
    pub last_sync_time: i64,
    pub files: Vec<DocumentRecord>,
}

// =============================================================================
// RESPONSE SHAPES
// =============================================================================

/// One row from the entry search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    pub title: String,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub ctype: String,
    #[serde(default)]
    pub etype: String,
    pub addr: String,
    /// Body text; servers populate either `content` or `raw`.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub idx: Option<i64>,
}

impl RemoteEntry {
    /// Body text, whichever field the server populated.
    pub fn body(&self) -> &str {
        self.content
            .as_deref()
            .or(self.raw.as_deref())
            .unwrap_or("")
    }
}

/// Result of a multipart upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadOutcome {
    /// Paths the server accepted.
    #[serde(default, rename = "list")]
    pub accepted: Vec<String>,
    /// Embedding pipeline status, when the server reports one.
    #[serde(default)]
    pub emb_status: Option<String>,
    /// Task id handed back for asynchronous uploads.
    #[serde(default)]
    pub task_id: Option<String>,
}

impl UploadOutcome {
    /// The upload itself succeeded but the server could not embed the
    /// content; worth a warning, not an abort.
    pub fn embedding_failed(&self) -> bool {
        self.emb_status.as_deref() == Some("failed")
    }
}

/// Progress counter inside a task status row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    pub current: i64,
}

/// One row from the running-tasks endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: TaskProgress,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "SUCCESS" | "COMPLETED")
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status.as_str(), "FAILURE" | "FAILED")
    }
}

#[derive(Deserialize)]
struct AsyncSupportResponse {
    #[serde(default)]
    async_supported: bool,
}

#[derive(Deserialize)]
struct RunningTasksResponse {
    #[serde(default)]
    results: Vec<TaskStatus>,
}

#[derive(Deserialize)]
struct TerminateResponse {
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Deserialize)]
struct CheckUpdateResponse {
    #[serde(default)]
    update: bool,
}

/// Wire shape of the compare endpoint, mapped into [`SyncPlan`].
#[derive(Debug, Default, Deserialize)]
struct CompareResponse {
    #[serde(default)]
    upload_list: Vec<SyncItem>,
    #[serde(default)]
    download_list: Vec<SyncItem>,
    #[serde(default)]
    remove_list: Vec<SyncItem>,
    #[serde(default)]
    cloud_remove_list: Vec<SyncItem>,
    #[serde(default)]
    conflict_list: Vec<SyncItem>,
}

impl CompareResponse {
    fn into_plan(self) -> SyncPlan {
        SyncPlan {
            upload: self.upload_list,
            download: self.download_list,
            remove_local: self.remove_list,
            remove_remote: self.cloud_remove_list,
            conflicts: self.conflict_list,
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Authenticated client for the remote note service.
pub struct ApiClient {
    client: Client,
    session: AuthSession,
}

impl ApiClient {
    /// Create a client over a shared settings handle.
    pub fn new(settings: Arc<RwLock<Settings>>, store: Arc<dyn SettingsStore>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Connectivity(format!("failed to create HTTP client: {e}")))?;
        let session = AuthSession::new(client.clone(), settings, store);
        Ok(Self { client, session })
    }

    /// The underlying auth session.
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Send a request built by `build`, logging in first if needed. A 401
    /// invalidates the cached token and retries once with a fresh login; a
    /// second 401 is left for status classification downstream.
    async fn send_authed<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let token = self.session.ensure_token().await?;
        let response = build(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("Got 401 on authenticated call, re-login and retry once");
        self.session.invalidate().await;
        let token = self.session.ensure_token().await?;
        Ok(build(&token).send().await?)
    }

    /// Search entries on the server.
    ///
    /// When the query carries an embedding-backed search method, a 422 from
    /// the server is reported as [`Error::UnsupportedMethod`] so callers can
    /// fall back to keyword search.
    #[instrument(skip(self, query), fields(subsystem = "client", component = "api", op = "search_entries", keyword = %query.keyword))]
    pub async fn search_entries(&self, query: &EntryQuery) -> Result<Vec<RemoteEntry>> {
        let server = self.session.server_config().await;
        let start = Instant::now();

        let mut params: Vec<(&str, String)> = Vec::new();
        if !query.ctype.is_empty() {
            params.push(("ctype", query.ctype.clone()));
        }
        if !query.etype.is_empty() {
            params.push(("etype", query.etype.clone()));
        }
        if !query.status.is_empty() {
            params.push(("status", query.status.clone()));
        }
        if !query.start_date.is_empty() {
            params.push(("start_date", query.start_date.clone()));
        }
        if !query.end_date.is_empty() {
            params.push(("end_date", query.end_date.clone()));
        }
        if !query.keyword.is_empty() {
            params.push(("keyword", query.keyword.clone()));
        }
        if let Some(method) = query.method {
            params.push(("method", method.to_string()));
        }
        if !query.exclude.is_empty() {
            params.push(("exclude", query.exclude.clone()));
        }
        params.push(("max_count", query.max_count.to_string()));

        let optional_capability = query.method.map(|m| m.requires_embedding()).unwrap_or(false);
        let response = self
            .send_authed(|token| {
                self.client
                    .get(endpoint(&server.base_url, "/api/entry/data/"))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
                    .query(&params)
            })
            .await?;
        let response = ensure_success(response, optional_capability).await?;
        let entries: Vec<RemoteEntry> = response.json().await?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            result_count = entries.len(),
            duration_ms = elapsed,
            "Remote search complete"
        );
        if elapsed > 5000 {
            warn!(duration_ms = elapsed, slow = true, "Slow remote search");
        }
        Ok(entries)
    }

    /// Fetch a single entry by its server id.
    #[instrument(skip(self), fields(subsystem = "client", component = "api", op = "entry_detail"))]
    pub async fn entry_detail(&self, idx: i64) -> Result<RemoteEntry> {
        let server = self.session.server_config().await;
        let path = format!("/api/entry/data/{idx}/");
        let response = self
            .send_authed(|token| {
                self.client
                    .get(endpoint(&server.base_url, &path))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
            })
            .await?;
        let response = ensure_success(response, false).await?;
        Ok(response.json().await?)
    }

    /// Download the raw content of an entry by its server id.
    #[instrument(skip(self), fields(subsystem = "client", component = "api", op = "download_entry"))]
    pub async fn download_entry(&self, idx: i64) -> Result<Vec<u8>> {
        let server = self.session.server_config().await;
        let path = format!("/api/entry/data/{idx}/download/");
        let response = self
            .send_authed(|token| {
                self.client
                    .get(endpoint(&server.base_url, &path))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let bytes = response.bytes().await?;
        debug!(payload_bytes = bytes.len(), "Entry downloaded");
        Ok(bytes.to_vec())
    }

    /// Upload a group of documents as one multipart request.
    #[instrument(skip(self, batch), fields(subsystem = "client", component = "api", op = "upload", file_count = batch.files.len(), is_async = batch.is_async))]
    pub async fn upload_documents(&self, batch: &UploadBatch) -> Result<UploadOutcome> {
        let server = self.session.server_config().await;
        let start = Instant::now();
        let payload_bytes = batch.payload_bytes();

        let response = self
            .send_authed(|token| {
                self.client
                    .post(endpoint(&server.base_url, "/api/entry/data/"))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
                    .multipart(build_upload_form(batch))
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let outcome: UploadOutcome = response.json().await?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            accepted = outcome.accepted.len(),
            payload_bytes,
            duration_ms = elapsed,
            "Upload complete"
        );
        if elapsed > 30_000 {
            warn!(
                duration_ms = elapsed,
                payload_bytes,
                slow = true,
                "Slow upload"
            );
        }
        Ok(outcome)
    }

    /// Ask whether the server supports asynchronous upload tasks.
    #[instrument(skip(self), fields(subsystem = "client", component = "api", op = "async_support"))]
    pub async fn async_support(&self) -> Result<bool> {
        let server = self.session.server_config().await;
        let response = self
            .send_authed(|token| {
                self.client
                    .get(endpoint(&server.base_url, "/api/tasks/async_support/"))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let payload: AsyncSupportResponse = response.json().await?;
        Ok(payload.async_supported)
    }

    /// List the tasks the server is currently running.
    #[instrument(skip(self), fields(subsystem = "client", component = "api", op = "running_tasks"))]
    pub async fn running_tasks(&self) -> Result<Vec<TaskStatus>> {
        let server = self.session.server_config().await;
        let response = self
            .send_authed(|token| {
                self.client
                    .get(endpoint(&server.base_url, "/api/tasks/running_tasks/"))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let payload: RunningTasksResponse = response.json().await?;
        Ok(payload.results)
    }

    /// Request termination of a server-side task. Returns whether the server
    /// acknowledged the request.
    #[instrument(skip(self), fields(subsystem = "client", component = "api", op = "terminate_task"))]
    pub async fn terminate_task(&self, task_id: &str) -> Result<bool> {
        let server = self.session.server_config().await;
        let path = format!("/api/tasks/{task_id}/terminate/");
        let response = self
            .send_authed(|token| {
                self.client
                    .post(endpoint(&server.base_url, &path))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let payload: TerminateResponse = response.json().await?;
        Ok(payload.code == Some(0))
    }

    /// Lightweight probe: has anything changed server-side since
    /// `last_sync_time`?
    #[instrument(skip(self), fields(subsystem = "client", component = "api", op = "check_update"))]
    pub async fn check_update(
        &self,
        user_name: &str,
        vault: &str,
        last_sync_time: i64,
    ) -> Result<bool> {
        let server = self.session.server_config().await;
        let params = [
            ("user_name", user_name.to_string()),
            ("vault", vault.to_string()),
            ("rtype", "check_update".to_string()),
            ("last_sync_time", last_sync_time.to_string()),
        ];
        let response = self
            .send_authed(|token| {
                self.client
                    .post(endpoint(&server.base_url, "/api/sync/"))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
                    .form(&params)
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let payload: CheckUpdateResponse = response.json().await?;
        Ok(payload.update)
    }

    /// Send the local inventory snapshot and receive the partitioned plan.
    #[instrument(skip(self, request), fields(subsystem = "client", component = "api", op = "compare", vault = %request.vault, file_count = request.files.len()))]
    pub async fn compare(&self, request: &CompareRequest) -> Result<SyncPlan> {
        let server = self.session.server_config().await;
        let start = Instant::now();
        let files_json = serde_json::to_string(&request.files)?;
        let params = [
            ("user_name", request.user_name.clone()),
            ("vault", request.vault.clone()),
            ("rtype", "compare".to_string()),
            ("include", request.include.clone()),
            ("exclude", request.exclude.clone()),
            ("last_sync_time", request.last_sync_time.to_string()),
            ("files", files_json),
        ];
        let response = self
            .send_authed(|token| {
                self.client
                    .post(endpoint(&server.base_url, "/api/sync/"))
                    .timeout(Duration::from_secs(server.timeout_secs))
                    .header("Authorization", format!("Token {token}"))
                    .form(&params)
            })
            .await?;
        let response = ensure_success(response, false).await?;
        let payload: CompareResponse = response.json().await?;
        let plan = payload.into_plan();

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            planned = plan.total(),
            duration_ms = elapsed,
            "Compare complete"
        );
        Ok(plan)
    }
}

/// Classify a non-success status into the error taxonomy, consuming the body
/// as the error detail.
async fn ensure_success(
    response: reqwest::Response,
    optional_capability: bool,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(Error::from_status(
        status.as_u16(),
        detail,
        optional_capability,
    ))
}

fn build_upload_form(batch: &UploadBatch) -> multipart::Form {
    let mut form = multipart::Form::new()
        .text("etype", "note")
        .text("source", UPLOAD_SOURCE)
        .text("vault", batch.vault.clone())
        .text("rtype", "upload")
        .text("user_name", batch.user_name.clone())
        .text("is_async", if batch.is_async { "true" } else { "false" });
    for file in &batch.files {
        let part = multipart::Part::bytes(file.content.clone())
            .file_name(file.part_name().to_string());
        form = form
            .part("files", part)
            .text("filepaths", file.path.clone())
            .text("filemd5s", file.md5.clone());
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Request Shape Tests
    // ==========================================================================

    #[test]
    fn test_entry_query_defaults() {
        let query = EntryQuery::default();
        assert!(query.keyword.is_empty());
        assert!(query.method.is_none());
        assert_eq!(query.max_count, DEFAULT_MAX_COUNT);
    }

    #[test]
    fn test_entry_query_builder() {
        let query = EntryQuery::new("rust async")
            .with_etype("note")
            .with_method(SearchMethod::EmbeddingOnly)
            .with_max_count(10);
        assert_eq!(query.keyword, "rust async");
        assert_eq!(query.etype, "note");
        assert_eq!(query.method, Some(SearchMethod::EmbeddingOnly));
        assert_eq!(query.max_count, 10);
    }

    #[test]
    fn test_upload_file_part_name_is_last_segment() {
        let file = UploadFile::new("notes/deep/a.md", "d41d8cd9", vec![1, 2, 3]);
        assert_eq!(file.part_name(), "a.md");

        let flat = UploadFile::new("top.md", "d41d8cd9", vec![]);
        assert_eq!(flat.part_name(), "top.md");
    }

    #[test]
    fn test_upload_batch_payload_bytes() {
        let batch = UploadBatch::new("vault", "alice")
            .with_file(UploadFile::new("a.md", "m1", vec![0; 10]))
            .with_file(UploadFile::new("b.md", "m2", vec![0; 32]));
        assert_eq!(batch.payload_bytes(), 42);
        assert!(!batch.is_async);
        assert!(batch.asynchronous().is_async);
    }

    // ==========================================================================
    // Response Shape Tests
    // ==========================================================================

    #[test]
    fn test_remote_entry_body_prefers_content() {
        let entry: RemoteEntry = serde_json::from_value(serde_json::json!({
            "title": "T",
            "addr": "vault/notes/t.md",
            "content": "from content",
            "raw": "from raw"
        }))
        .unwrap();
        assert_eq!(entry.body(), "from content");
    }

    #[test]
    fn test_remote_entry_body_falls_back_to_raw() {
        let entry: RemoteEntry = serde_json::from_value(serde_json::json!({
            "title": "T",
            "addr": "vault/notes/t.md",
            "raw": "from raw"
        }))
        .unwrap();
        assert_eq!(entry.body(), "from raw");
        assert!(entry.idx.is_none());
    }

    #[test]
    fn test_remote_entry_body_empty_when_absent() {
        let entry: RemoteEntry = serde_json::from_value(serde_json::json!({
            "title": "T",
            "addr": "a"
        }))
        .unwrap();
        assert_eq!(entry.body(), "");
    }

    #[test]
    fn test_upload_outcome_deserialization() {
        let outcome: UploadOutcome = serde_json::from_value(serde_json::json!({
            "list": ["notes/a.md", "notes/b.md"],
            "emb_status": "success"
        }))
        .unwrap();
        assert_eq!(outcome.accepted.len(), 2);
        assert!(!outcome.embedding_failed());
        assert!(outcome.task_id.is_none());
    }

    #[test]
    fn test_upload_outcome_embedding_failed() {
        let outcome: UploadOutcome =
            serde_json::from_value(serde_json::json!({"list": [], "emb_status": "failed"}))
                .unwrap();
        assert!(outcome.embedding_failed());
    }

    #[test]
    fn test_upload_outcome_tolerates_empty_object() {
        let outcome: UploadOutcome = serde_json::from_str("{}").unwrap();
        assert!(outcome.accepted.is_empty());
        assert!(outcome.task_id.is_none());
    }

    #[test]
    fn test_task_status_classification() {
        for status in ["SUCCESS", "COMPLETED"] {
            let task: TaskStatus = serde_json::from_value(serde_json::json!({
                "task_id": "t1", "status": status
            }))
            .unwrap();
            assert!(task.is_success(), "{status} should be success");
            assert!(!task.is_failure());
        }
        for status in ["FAILURE", "FAILED"] {
            let task: TaskStatus = serde_json::from_value(serde_json::json!({
                "task_id": "t1", "status": status
            }))
            .unwrap();
            assert!(task.is_failure(), "{status} should be failure");
        }
        let running: TaskStatus = serde_json::from_value(serde_json::json!({
            "task_id": "t1", "status": "RUNNING", "progress": {"current": 3}
        }))
        .unwrap();
        assert!(!running.is_success());
        assert!(!running.is_failure());
        assert_eq!(running.progress.current, 3);
    }

    #[test]
    fn test_terminate_response_missing_code_is_not_zero() {
        let payload: TerminateResponse = serde_json::from_str("{}").unwrap();
        assert_ne!(payload.code, Some(0));
    }

    #[test]
    fn test_compare_response_maps_into_plan() {
        let payload: CompareResponse = serde_json::from_value(serde_json::json!({
            "upload_list": [{"addr": "a.md"}],
            "download_list": [{"addr": "b.md", "idx": 2}],
            "remove_list": [{"addr": "c.md"}],
            "cloud_remove_list": [{"addr": "d.md"}],
            "conflict_list": [{"addr": "e.md"}]
        }))
        .unwrap();
        let plan = payload.into_plan();
        assert_eq!(plan.upload[0].addr, "a.md");
        assert_eq!(plan.download[0].idx, Some(2));
        assert_eq!(plan.remove_local[0].addr, "c.md");
        assert_eq!(plan.remove_remote[0].addr, "d.md");
        assert_eq!(plan.conflicts[0].addr, "e.md");
    }

    #[test]
    fn test_compare_response_partitions_default_empty() {
        let payload: CompareResponse = serde_json::from_str("{}").unwrap();
        let plan = payload.into_plan();
        assert!(plan.is_empty());
    }
}
