//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use bytes::Bytes;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pagevault_api::AppState;
use pagevault_core::config::AppConfig;
use pagevault_core::traits::storage::StorageProvider;
use pagevault_storage::StorageManager;
use pagevault_storage::providers::{LocalStorageProvider, MemoryStorageProvider};

const MULTIPART_BOUNDARY: &str = "pagevault-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// App over an in-memory provider with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// App over an in-memory provider.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_provider(config, Arc::new(MemoryStorageProvider::new()))
    }

    /// App over the local filesystem provider rooted in `dir`.
    pub async fn on_disk(dir: &TempDir) -> Self {
        let root = dir.path().to_str().expect("Temp dir is not UTF-8");
        let provider = LocalStorageProvider::new(root)
            .await
            .expect("Failed to init local storage");
        Self::with_provider(AppConfig::default(), Arc::new(provider))
    }

    /// App over an explicit provider.
    pub fn with_provider(config: AppConfig, provider: Arc<dyn StorageProvider>) -> Self {
        let project_id = config.project.id.parse().expect("Invalid project id");
        let storage_manager = Arc::new(StorageManager::from_provider(provider));
        let state =
            pagevault_api::app::build_state_with(config.clone(), project_id, storage_manager);
        let router = pagevault_api::build_app(state.clone());

        Self {
            router,
            state,
            config,
        }
    }

    /// Make a JSON request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body = body
            .map(|b| serde_json::to_vec(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        self.request_raw(method, path, "application/json", Bytes::from(body))
            .await
    }

    /// Make a request with an arbitrary body
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        content_type: &str,
        body: Bytes,
    ) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }

    /// Upload files as one multipart request to `/api/save-assets`
    pub async fn upload(&self, files: &[TestFile<'_>]) -> TestResponse {
        let mut body = Vec::new();
        for file in files {
            body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                    file.name
                )
                .as_bytes(),
            );
            if let Some(content_type) = file.content_type {
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(file.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        self.request_raw(
            "POST",
            "/api/save-assets",
            &format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            Bytes::from(body),
        )
        .await
    }

    /// Save a document and return its ordering key
    pub async fn save(&self, document: Value) -> String {
        let response = self
            .request("POST", "/api/save-project", Some(document))
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Save failed: {:?}",
            response.body
        );
        response.body["orderingKey"]
            .as_str()
            .expect("No orderingKey in save response")
            .to_string()
    }
}

/// One part of a multipart upload
pub struct TestFile<'a> {
    pub name: &'a str,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Bytes,
    /// Parsed JSON body, `Null` when the body is not JSON
    pub body: Value,
}
