//! Client for the remote list-management API.
//!
//! ## Wire protocol
//!
//! | Method | URL                       | Body                 | Success |
//! |--------|---------------------------|----------------------|---------|
//! | GET    | `{endpoint}?details=true` | -                    | 200     |
//! | POST   | `{endpoint}`              | collection, no `id`  | 204     |
//! | PUT    | `{endpoint}`              | collection with `id` | 204     |
//!
//! All requests carry `Accept`/`Content-Type: application/json` and
//! `Authorization: Bearer {key}`.
//!
//! [`ListApi`] is the seam the reconciler talks to. [`HttpListApi`] is the
//! real client; [`DryRunApi`] wraps any client and only logs the writes.

use std::future::Future;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::api::logs::{log_info, log_info_indent};
use crate::config::SyncConfig;
use crate::error::{RemoteError, RemoteResult, WriteOp};
use crate::models::Collection;

/// Operations the reconciler needs from the remote service.
pub trait ListApi {
    /// Every existing collection, with entities included.
    fn fetch_collections(&self) -> impl Future<Output = RemoteResult<Vec<Collection>>> + Send;

    /// Create `collection`. Its `id` must be absent.
    fn create_collection(
        &self,
        collection: &Collection,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Overwrite the stored collection with `collection`, matched by `id`.
    fn update_collection(
        &self,
        collection: &Collection,
    ) -> impl Future<Output = RemoteResult<()>> + Send;
}

// =============================================================================
// HTTP client
// =============================================================================

/// [`ListApi`] over HTTP + JSON.
#[derive(Clone)]
pub struct HttpListApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpListApi {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.upload_url, &config.api_key)
    }

    /// Reuse an existing client (connection pool, custom timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn write(
        &self,
        method: reqwest::Method,
        operation: WriteOp,
        collection: &Collection,
    ) -> RemoteResult<()> {
        // Serialized up front so an encoding failure is not reported as transport.
        let payload = serde_json::to_vec(collection)?;

        let response = self
            .request(method, &self.endpoint)
            .body(payload)
            .send()
            .await
            .map_err(|e| RemoteError::Request {
                operation,
                label: collection.label.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            return Err(RemoteError::UnexpectedStatus {
                operation,
                label: collection.label.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl ListApi for HttpListApi {
    async fn fetch_collections(&self) -> RemoteResult<Vec<Collection>> {
        let url = format!("{}?details=true", self.endpoint);

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| RemoteError::Fetch {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RemoteError::Fetch {
                status: Some(status.as_u16()),
                message: format!("unexpected status code: {}", status.as_u16()),
            });
        }

        let body = response.bytes().await.map_err(|e| RemoteError::Fetch {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn create_collection(&self, collection: &Collection) -> RemoteResult<()> {
        self.write(reqwest::Method::POST, WriteOp::Create, collection)
            .await
    }

    async fn update_collection(&self, collection: &Collection) -> RemoteResult<()> {
        self.write(reqwest::Method::PUT, WriteOp::Update, collection)
            .await
    }
}

// =============================================================================
// Dry run
// =============================================================================

/// Reads through to `inner`, logs writes instead of sending them.
pub struct DryRunApi<A> {
    inner: A,
}

impl<A> DryRunApi<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> A {
        self.inner
    }
}

fn log_payload(method: &str, collection: &Collection) -> RemoteResult<()> {
    let payload = serde_json::to_string_pretty(collection)?;
    log_info(format!("Dry run: prepared {} payload for '{}'", method, collection.label));
    for line in payload.lines() {
        log_info_indent(line, 1);
    }
    Ok(())
}

impl<A: ListApi + Sync> ListApi for DryRunApi<A> {
    async fn fetch_collections(&self) -> RemoteResult<Vec<Collection>> {
        self.inner.fetch_collections().await
    }

    async fn create_collection(&self, collection: &Collection) -> RemoteResult<()> {
        log_payload("POST", collection)
    }

    async fn update_collection(&self, collection: &Collection) -> RemoteResult<()> {
        log_payload("PUT", collection)
    }
}
