//! Integration tests for asset upload, serving and deletion.

mod helpers;

use axum::http::{StatusCode, header};
use serde_json::json;

use helpers::TestFile;
use pagevault_core::config::AppConfig;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-an-image";

#[tokio::test]
async fn test_upload_then_serve() {
    let app = helpers::TestApp::new();

    let response = app
        .upload(&[
            TestFile {
                name: "hero.png",
                content_type: Some("image/png"),
                bytes: PNG,
            },
            TestFile {
                name: "notes.txt",
                content_type: None,
                bytes: b"hello",
            },
        ])
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let items = response.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "hero.png");
    assert_eq!(items[0]["status"], "uploaded");
    assert_eq!(items[0]["contentType"], "image/png");
    assert_eq!(items[0]["sizeBytes"], PNG.len());
    assert_eq!(items[1]["name"], "notes.txt");
    assert_eq!(items[1]["contentType"], "text/plain");
    assert_ne!(items[0]["assetId"], items[1]["assetId"]);

    let src = items[0]["src"].as_str().unwrap();
    assert_eq!(
        src,
        format!("/api/assets/{}", items[0]["assetId"].as_str().unwrap())
    );

    let served = app.request("GET", src, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.headers[header::CONTENT_TYPE], "image/png");
    assert!(
        served.headers[header::CACHE_CONTROL]
            .to_str()
            .unwrap()
            .contains("immutable")
    );
    assert_eq!(&served.bytes[..], PNG);
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let app = helpers::TestApp::new();

    let response = app.upload(&[]).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_oversized_asset_fails_alone() {
    let mut config = AppConfig::default();
    config.server.max_asset_bytes = 8;
    let app = helpers::TestApp::with_config(config);

    let response = app
        .upload(&[
            TestFile {
                name: "big.bin",
                content_type: Some("application/octet-stream"),
                bytes: &[0u8; 16],
            },
            TestFile {
                name: "small.txt",
                content_type: Some("text/plain"),
                bytes: b"tiny",
            },
        ])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let items = response.body["data"].as_array().unwrap();
    assert_eq!(items[0]["status"], "error");
    assert!(items[0]["error"].is_string());
    assert!(items[0].get("assetId").is_none());
    assert_eq!(items[1]["status"], "uploaded");
}

#[tokio::test]
async fn test_delete_reports_each_item() {
    let app = helpers::TestApp::new();
    let uploaded = app
        .upload(&[TestFile {
            name: "logo.svg",
            content_type: None,
            bytes: b"<svg/>",
        }])
        .await;
    let asset_id = uploaded.body["data"][0]["assetId"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(uploaded.body["data"][0]["contentType"], "image/svg+xml");

    let missing = "6f1c3a52-9a3e-4d6b-8f5e-2b7c1d0e9a41";
    let response = app
        .request(
            "DELETE",
            "/api/delete-assets",
            Some(json!({"assetIds": [asset_id, "not-an-id", missing]})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let items = response.body["data"].as_array().unwrap();
    assert_eq!(items[0]["assetId"], asset_id.as_str());
    assert_eq!(items[0]["status"], "deleted");
    assert_eq!(items[1]["status"], "invalid");
    assert_eq!(items[2]["status"], "not_found");

    let served = app
        .request("GET", &format!("/api/assets/{asset_id}"), None)
        .await;
    assert_eq!(served.status, StatusCode::NOT_FOUND);

    // Deleting again is not an error, just nothing to delete.
    let response = app
        .request(
            "DELETE",
            "/api/delete-assets",
            Some(json!({"assetIds": [asset_id]})),
        )
        .await;
    assert_eq!(response.body["data"][0]["status"], "not_found");
}

#[tokio::test]
async fn test_delete_request_validation() {
    let app = helpers::TestApp::new();

    let response = app
        .request("DELETE", "/api/delete-assets", Some(json!({"assetIds": []})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("DELETE", "/api/delete-assets", Some(json!({"ids": ["x"]})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION");

    let response = app
        .request("DELETE", "/api/delete-assets", Some(json!({"assetIds": 5})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION");
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_upload_over_request_limit() {
    let mut config = AppConfig::default();
    config.server.max_asset_bytes = 1;
    let app = helpers::TestApp::with_config(config);

    let huge = vec![b'x'; 256 * 1024];
    let response = app
        .upload(&[TestFile {
            name: "huge.bin",
            content_type: Some("application/octet-stream"),
            bytes: &huge,
        }])
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_upload_requires_multipart() {
    let app = helpers::TestApp::new();

    let response = app
        .request_raw(
            "POST",
            "/api/save-assets",
            "application/json",
            bytes::Bytes::from_static(b"{}"),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_referenced_asset_can_still_be_deleted() {
    let app = helpers::TestApp::new();
    let uploaded = app
        .upload(&[TestFile {
            name: "photo.jpg",
            content_type: Some("image/jpeg"),
            bytes: b"jpeg-bytes",
        }])
        .await;
    let src = uploaded.body["data"][0]["src"].as_str().unwrap().to_string();
    let asset_id = uploaded.body["data"][0]["assetId"]
        .as_str()
        .unwrap()
        .to_string();

    app.save(json!({"pages": [{"image": src}]})).await;

    let response = app
        .request(
            "DELETE",
            "/api/delete-assets",
            Some(json!({"assetIds": [asset_id]})),
        )
        .await;
    assert_eq!(response.body["data"][0]["status"], "deleted");

    // The document keeps its now dangling reference.
    let loaded = app.request("GET", "/api/load-project", None).await;
    assert_eq!(loaded.body["pages"][0]["image"], src.as_str());
    let served = app.request("GET", &src, None).await;
    assert_eq!(served.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_unknown_asset() {
    let app = helpers::TestApp::new();

    let response = app.request("GET", "/api/assets/not-an-id", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "GET",
            "/api/assets/6f1c3a52-9a3e-4d6b-8f5e-2b7c1d0e9a41",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_assets_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let app = helpers::TestApp::on_disk(&dir).await;

    let uploaded = app
        .upload(&[TestFile {
            name: "hero.png",
            content_type: Some("image/png"),
            bytes: PNG,
        }])
        .await;
    let src = uploaded.body["data"][0]["src"].as_str().unwrap().to_string();

    let app = helpers::TestApp::on_disk(&dir).await;
    let served = app.request("GET", &src, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(&served.bytes[..], PNG);
}

#[tokio::test]
async fn test_too_many_files_in_one_request() {
    let app = helpers::TestApp::new();
    let names: Vec<String> = (0..21).map(|i| format!("file-{i}.txt")).collect();
    let files: Vec<TestFile<'_>> = names
        .iter()
        .map(|name| TestFile {
            name,
            content_type: Some("text/plain"),
            bytes: b"x",
        })
        .collect();

    let response = app.upload(&files).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
