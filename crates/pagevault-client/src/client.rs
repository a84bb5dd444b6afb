//! Typed wrapper over the PageVault HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use pagevault_core::error::AppError;
use pagevault_core::result::AppResult;
use pagevault_core::traits::snapshot::SnapshotSink;
use pagevault_core::types::{Document, OrderingKey, ProjectId};

use crate::error::{from_response, from_transport};
use crate::wire::{DataEnvelope, DeleteItem, HealthReport, SaveReceipt, UploadItem};

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A file to upload.
#[derive(Debug, Clone)]
pub struct ClientAsset {
    /// File name, including extension.
    pub name: String,
    /// MIME type; the server guesses one from the name when absent.
    pub content_type: Option<String>,
    /// File contents, sent as the multipart part body.
    pub bytes: Bytes,
}

impl ClientAsset {
    /// Asset without a declared content type.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Declare the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Client for one PageVault server.
///
/// The server persists into its configured project; the project id passed
/// to [`SnapshotSink::save`] is only recorded in logs.
#[derive(Debug, Clone)]
pub struct PageVaultClient {
    http: Client,
    base_url: Url,
}

impl PageVaultClient {
    /// Client for the server at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> AppResult<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Client with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Save `document` as a new snapshot.
    pub async fn save_project(&self, document: &Document) -> AppResult<SaveReceipt> {
        let body = serde_json::to_vec(document)
            .map_err(|e| AppError::encoding(format!("Failed to serialize document: {e}")))?;
        let request = self
            .http
            .post(self.url("api/save-project")?)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send_json(request).await
    }

    /// Latest document; `{}` when the project was never saved.
    pub async fn load_project(&self) -> AppResult<Document> {
        self.send_json(self.http.get(self.url("api/load-project")?))
            .await
    }

    /// Snapshot keys, newest first, older than `before` when given.
    pub async fn list_snapshots(
        &self,
        before: Option<&OrderingKey>,
        limit: usize,
    ) -> AppResult<Vec<OrderingKey>> {
        let mut url = self.url("api/snapshots")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(before) = before {
                query.append_pair("before", &before.to_string());
            }
            query.append_pair("limit", &limit.to_string());
        }
        let envelope: DataEnvelope<Vec<OrderingKey>> = self.send_json(self.http.get(url)).await?;
        Ok(envelope.data)
    }

    /// Document saved under `key`.
    pub async fn load_snapshot(&self, key: &OrderingKey) -> AppResult<Document> {
        let url = self.url(&format!("api/snapshots/{key}"))?;
        self.send_json(self.http.get(url)).await
    }

    /// Upload files in one request; one outcome per file, in order.
    pub async fn upload_assets(&self, assets: Vec<ClientAsset>) -> AppResult<Vec<UploadItem>> {
        if assets.is_empty() {
            return Err(AppError::validation("No assets to upload"));
        }

        let count = assets.len();
        let mut form = Form::new();
        for asset in assets {
            let mut part = Part::bytes(asset.bytes.to_vec()).file_name(asset.name.clone());
            if let Some(content_type) = &asset.content_type {
                part = part.mime_str(content_type).map_err(|e| {
                    AppError::validation(format!(
                        "Invalid content type '{content_type}' for '{}': {e}",
                        asset.name
                    ))
                })?;
            }
            form = form.part("files", part);
        }

        let request = self.http.post(self.url("api/save-assets")?).multipart(form);
        let envelope: DataEnvelope<Vec<UploadItem>> = self.send_json(request).await?;
        debug!(count, "Assets uploaded");
        Ok(envelope.data)
    }

    /// Delete assets by id; one outcome per id, in order.
    pub async fn delete_assets(&self, asset_ids: &[String]) -> AppResult<Vec<DeleteItem>> {
        let request = self
            .http
            .delete(self.url("api/delete-assets")?)
            .json(&serde_json::json!({ "assetIds": asset_ids }));
        let envelope: DataEnvelope<Vec<DeleteItem>> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Bytes and content type of a stored asset. `src` is the path returned
    /// by the upload, such as `/api/assets/<id>`.
    pub async fn fetch_asset(&self, src: &str) -> AppResult<(Option<String>, Bytes)> {
        let url = self.url(src.trim_start_matches('/'))?;
        let response = self.http.get(url).send().await.map_err(from_transport)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.bytes().await.map_err(from_transport)?;

        if !status.is_success() {
            return Err(from_response(status, &body));
        }
        Ok((content_type, body))
    }

    /// Server and storage health.
    pub async fn health(&self) -> AppResult<HealthReport> {
        self.send_json(self.http.get(self.url("api/health")?)).await
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::validation(format!("Invalid request path '{path}': {e}")))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request.send().await.map_err(from_transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(from_transport)?;

        if !status.is_success() {
            return Err(from_response(status, &body));
        }
        serde_json::from_slice(&body)
            .map_err(|e| AppError::decoding(format!("Unexpected response body: {e}")))
    }
}

#[async_trait]
impl SnapshotSink for PageVaultClient {
    async fn save(&self, project_id: &ProjectId, document: Document) -> AppResult<OrderingKey> {
        let receipt = self.save_project(&document).await?;
        info!(
            project_id = %project_id,
            ordering_key = %receipt.ordering_key,
            "Project saved to server"
        );
        Ok(receipt.ordering_key)
    }
}

/// Parse a base URL so relative API paths join below it.
fn parse_base_url(base_url: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::configuration(format!("Invalid base URL '{base_url}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(AppError::configuration(format!(
            "Base URL '{base_url}' cannot carry paths"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
