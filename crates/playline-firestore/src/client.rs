//! Firestore REST API client.
//!
//! A thin client over the operations the repositories need:
//! - get/create/patch/delete of single documents
//! - equality queries on a top-level collection
//! - paged listing (used by wholesale reset)
//!
//! Requests carry tracing spans and metrics, retry on 429/5xx/network
//! errors with exponential backoff, and re-authenticate once on an expired
//! access token. When `FIRESTORE_EMULATOR_HOST` is set, requests go to the
//! emulator unauthenticated, which is also how the test suite drives the
//! client against a mock server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{info_span, warn, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_request, record_retry};
use crate::retry::RetryConfig;
use crate::token_cache::TokenCache;
use crate::types::{
    Document, ListDocumentsResponse, RunQueryRequest, RunQueryResponse, StructuredQuery, Value,
};

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Emulator host:port; unauthenticated when set.
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST")
            .ok()
            .filter(|s| !s.is_empty());

        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .ok()
            .filter(|s| !s.is_empty());

        let project_id = match (project_id, &emulator_host) {
            (Some(id), _) => id,
            // The emulator accepts any project id.
            (None, Some(_)) => "demo-playline".to_string(),
            (None, None) => {
                return Err(FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                ))
            }
        };

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
            emulator_host,
        })
    }
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    token_cache: Option<Arc<TokenCache>>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let token_cache = match config.emulator_host {
            Some(_) => None,
            None => {
                let auth = Self::create_auth_provider()?;
                Some(Arc::new(TokenCache::new(auth)))
            }
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("playline-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let origin = match &config.emulator_host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("http://{host}"),
            None => "https://firestore.googleapis.com".to_string(),
        };
        let base_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            origin, config.project_id, config.database_id
        );

        Ok(Self {
            http,
            config,
            base_url,
            token_cache,
        })
    }

    fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Build document path.
    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document. Missing documents are `None`, not an error.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);

        self.instrumented("get_document", collection, Some(doc_id), async {
            let response = self.send("get_document", self.http.get(&url)).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Create a document; an existing id surfaces `AlreadyExists`.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = format!(
            "{}/{}?documentId={}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        );
        let body = Document::new(fields);

        self.instrumented("create_document", collection, Some(doc_id), async {
            let response = self
                .send("create_document", self.http.post(&url).json(&body))
                .await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                status => Err(Self::error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Patch a document, merging the given fields.
    ///
    /// With an update mask, only the masked paths are written; a masked path
    /// absent from `fields` is cleared. Patching a missing document creates
    /// it, which is what makes lazily-initialized append targets work.
    pub async fn patch_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        let mut url = self.document_path(collection, doc_id);
        if let Some(mask) = update_mask {
            let params: Vec<String> = mask
                .iter()
                .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
                .collect();
            url = format!("{}?{}", url, params.join("&"));
        }

        let body = Document::new(fields);

        self.instrumented("patch_document", collection, Some(doc_id), async {
            let response = self
                .send("patch_document", self.http.patch(&url).json(&body))
                .await?;
            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                status => Err(Self::error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Delete a document. Deleting a missing document is a no-op.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<()> {
        let url = self.document_path(collection, doc_id);

        self.instrumented("delete_document", collection, Some(doc_id), async {
            let response = self.send("delete_document", self.http.delete(&url)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
                status => Err(Self::error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// List documents in a collection, one page at a time.
    pub async fn list_documents(
        &self,
        collection: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> FirestoreResult<ListDocumentsResponse> {
        let mut url = format!("{}/{}", self.base_url, collection);
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }

        self.instrumented("list_documents", collection, None, async {
            let response = self.send("list_documents", self.http.get(&url)).await?;
            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                status => Err(Self::error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Run a structured query against the documents root.
    pub async fn run_query(&self, query: StructuredQuery) -> FirestoreResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.base_url);
        let request = RunQueryRequest {
            structured_query: query,
        };

        self.instrumented("run_query", "query", None, async {
            let response = self
                .send("run_query", self.http.post(&url).json(&request))
                .await?;
            match response.status() {
                StatusCode::OK => {
                    let body = response.text().await.unwrap_or_default();
                    // runQuery streams a JSON array of per-document results.
                    let responses: Vec<RunQueryResponse> =
                        serde_json::from_str(&body).map_err(|e| {
                            FirestoreError::invalid_response(format!(
                                "Failed to parse runQuery response: {} (body prefix: {})",
                                e,
                                &body[..body.len().min(200)]
                            ))
                        })?;

                    Ok(responses.into_iter().filter_map(|r| r.document).collect())
                }
                status => Err(Self::error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute an operation with tracing and metrics.
    async fn instrumented<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("firestore_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    /// Send a request, retrying retryable failures with backoff.
    ///
    /// Responses with semantic statuses (404, 409, ...) are returned to the
    /// caller for operation-specific mapping; only 429/5xx/network failures
    /// are retried here.
    async fn send(&self, operation: &str, request: RequestBuilder) -> FirestoreResult<Response> {
        let retry = &self.config.retry;
        let mut last_error: Option<FirestoreError> = None;

        for attempt in 0..=retry.max_retries {
            if attempt > 0 {
                let delay =
                    retry.delay_for(attempt - 1, last_error.as_ref().and_then(|e| e.retry_after_ms()));
                warn!(
                    operation = %operation,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Firestore request failed, retrying: {}",
                    last_error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                );
                record_retry(operation);
                tokio::time::sleep(delay).await;
            }

            // All request bodies are buffered JSON, so cloning never fails.
            let attempt_request = request
                .try_clone()
                .ok_or_else(|| FirestoreError::request_failed("request body is not replayable"))?;

            match self.send_once(attempt_request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < retry.max_retries => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| FirestoreError::request_failed("retries exhausted")))
    }

    /// One authorized attempt, replaying once on an expired access token.
    async fn send_once(&self, request: RequestBuilder) -> FirestoreResult<Response> {
        let replay = request.try_clone();
        let mut response = self.authorize(request).await?.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            match (&self.token_cache, replay) {
                (Some(cache), Some(replay)) if Self::is_access_token_expired(&body) => {
                    cache.invalidate().await;
                    response = self.authorize(replay).await?.send().await?;
                }
                _ => return Err(FirestoreError::from_http_status(401, body)),
            }
        }

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirestoreError::from_http_status(status.as_u16(), body));
        }

        Ok(response)
    }

    /// Attach a bearer token; emulator requests go out unauthenticated.
    async fn authorize(&self, request: RequestBuilder) -> FirestoreResult<RequestBuilder> {
        match &self.token_cache {
            Some(cache) => Ok(request.bearer_auth(cache.get_token().await?)),
            None => Ok(request),
        }
    }

    /// Map an unexpected response status to an error, keeping the body.
    async fn error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}
