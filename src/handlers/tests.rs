//! # Tests for Handlers
//!
//! Router-level tests driving the handlers through `oneshot` requests against a
//! fresh store per test.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Json,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::db::{MemoryStore, SharedStore};
use crate::handlers::root;
use crate::processing::{ProcessingJob, ProcessingQueue};
use crate::server::{AppState, create_app};

struct TestApp {
    router: Router,
    store: SharedStore,
    jobs: mpsc::Receiver<ProcessingJob>,
    upload_dir: tempfile::TempDir,
}

fn setup_test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        max_upload_bytes: 1024,
        ..AppConfig::default()
    };
    let store = MemoryStore::shared();
    let (processing, jobs) = ProcessingQueue::channel(16, store.clone());
    let state = AppState {
        config: Arc::new(config),
        store: store.clone(),
        processing,
    };

    TestApp {
        router: create_app(state),
        store,
        jobs,
        upload_dir,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn multipart_request(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, file_name, content) in parts {
        body.push_str(&format!("--{boundary}\r\n"));
        match file_name {
            Some(file_name) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                ));
                body.push_str("Content-Type: application/pdf\r\n\r\n");
            }
            None => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                ));
            }
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/documents/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "delivery-tracker");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_stats_not_found_until_initialized() {
    let app = setup_test_app();

    let (status, body) = send(&app, empty_request("GET", "/api/stats")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["traceId"].is_string());
}

#[tokio::test]
async fn test_stats_returned_after_seeding() {
    let app = setup_test_app();
    crate::seeds::seed_demo_data(&app.store).await.unwrap();

    let (status, body) = send(&app, empty_request("GET", "/api/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messagesProcessed"], 1247);
    assert_eq!(body["onTimeDeliveryRate"], "87.30");
}

#[tokio::test]
async fn test_supplier_crud_flow() {
    let app = setup_test_app();

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/suppliers",
            json!({ "name": "ABC Trading Co.", "rating": "4.5" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["isActive"], true);
    assert_eq!(created["onTimeDeliveryRate"], "0");

    let (status, updated) = send(
        &app,
        json_request("PUT", "/api/suppliers/1", json!({ "phone": "+91-9876543210" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+91-9876543210");
    assert_eq!(updated["name"], "ABC Trading Co.");

    let (status, listed) = send(&app, empty_request("GET", "/api/suppliers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, empty_request("DELETE", "/api/suppliers/1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, empty_request("GET", "/api/suppliers/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["id"], 1);
}

#[tokio::test]
async fn test_unknown_ids_return_404() {
    let app = setup_test_app();

    for request in [
        empty_request("GET", "/api/suppliers/999"),
        empty_request("DELETE", "/api/suppliers/999"),
        json_request("PUT", "/api/deliveries/999", json!({})),
        empty_request("DELETE", "/api/deliveries/999"),
        json_request("PUT", "/api/documents/999", json!({})),
        empty_request("GET", "/api/whatsapp-messages/999"),
        json_request("PUT", "/api/whatsapp-messages/999", json!({})),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let app = setup_test_app();

    let (status, body) = send(&app, empty_request("GET", "/api/deliveries/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_create_delivery_applies_defaults() {
    let app = setup_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/deliveries",
            json!({
                "supplierName": "ABC Trading Co.",
                "materialType": "Raw Steel",
                "quantity": "500",
                "unit": "tons"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["source"], "manual");
    assert_eq!(body["processingStatus"], "completed");
    assert_eq!(body["currency"], "INR");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_delivery_missing_field_names_it() {
    let app = setup_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/deliveries",
            json!({ "supplierName": "ABC", "quantity": "5", "unit": "kg" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["details"]["field"], "materialType");
}

#[tokio::test]
async fn test_invalid_enum_value_rejected() {
    let app = setup_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/deliveries",
            json!({
                "supplierName": "ABC",
                "materialType": "Cement",
                "quantity": "5",
                "unit": "bags",
                "status": "lost"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = setup_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/suppliers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_create_message_queues_processing_job() {
    let mut app = setup_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/whatsapp-messages",
            json!({
                "senderId": "u1",
                "senderName": "ABC",
                "message": "delivered 200 bags of rice"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["processingStatus"], "processing");
    assert!(body["processedAt"].is_null());
    assert_eq!(
        app.jobs.try_recv().unwrap(),
        ProcessingJob::WhatsappMessage { id: 1 }
    );
}

#[tokio::test]
async fn test_webhook_accepts_message() {
    let mut app = setup_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/webhook/whatsapp",
            json!({
                "sender": { "id": "919876543210", "name": "XYZ Suppliers" },
                "message": { "text": "Shipment delayed due to traffic" }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "messageId": 1 }));
    assert_eq!(
        app.jobs.try_recv().unwrap(),
        ProcessingJob::WhatsappMessage { id: 1 }
    );

    let (_, stored) = send(&app, empty_request("GET", "/api/whatsapp-messages/1")).await;
    assert_eq!(stored["senderName"], "XYZ Suppliers");
}

#[tokio::test]
async fn test_webhook_without_sender_rejected() {
    let app = setup_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/webhook/whatsapp",
            json!({ "message": { "text": "hello" } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid webhook data");
}

#[tokio::test]
async fn test_upload_document_stores_file_and_queues_job() {
    let mut app = setup_test_app();

    let request = multipart_request(
        "X-BOUNDARY",
        &[
            ("file", Some("invoice.pdf"), "%PDF-1.4 fake"),
            ("documentType", None, "receipt"),
            ("deliveryId", None, "3"),
        ],
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fileName"], "invoice.pdf");
    assert_eq!(body["fileType"], "application/pdf");
    assert_eq!(body["fileSize"], 13);
    assert_eq!(body["documentType"], "receipt");
    assert_eq!(body["deliveryId"], 3);
    assert_eq!(body["processingStatus"], "processing");

    let stored_path = body["filePath"].as_str().unwrap();
    assert_eq!(std::fs::read(stored_path).unwrap(), b"%PDF-1.4 fake");
    assert_eq!(
        app.jobs.try_recv().unwrap(),
        ProcessingJob::Document { id: 1 }
    );
}

#[tokio::test]
async fn test_upload_defaults_document_type() {
    let app = setup_test_app();

    let request = multipart_request("B", &[("file", Some("scan.png"), "png")]);
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["documentType"], "invoice");
}

#[tokio::test]
async fn test_upload_without_file_rejected() {
    let app = setup_test_app();

    let request = multipart_request("B", &[("documentType", None, "invoice")]);
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "file");
}

fn stored_uploads(app: &TestApp) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(app.upload_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn test_upload_with_blank_filename_uses_stored_name() {
    let app = setup_test_app();

    let request = multipart_request("B", &[("file", Some(""), "orphan-bytes")]);
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    let file_name = body["fileName"].as_str().unwrap();
    assert!(!file_name.is_empty());

    let stored = stored_uploads(&app);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].to_string_lossy(), body["filePath"].as_str().unwrap());
    assert!(stored[0].ends_with(file_name));
}

#[tokio::test]
async fn test_rejected_upload_leaves_no_file() {
    let app = setup_test_app();

    let request = multipart_request(
        "B",
        &[
            ("file", Some("invoice.pdf"), "%PDF-1.4 fake"),
            ("deliveryId", None, "not-a-number"),
        ],
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "deliveryId");
    assert!(stored_uploads(&app).is_empty());

    let (_, listed) = send(&app, empty_request("GET", "/api/documents")).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_upload_over_limit_rejected() {
    let app = setup_test_app();
    let oversized = "x".repeat(4096);

    let request = multipart_request("B", &[("file", Some("big.pdf"), &oversized)]);
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_document_completion_via_update() {
    let app = setup_test_app();
    let (_, created) = send(
        &app,
        json_request(
            "POST",
            "/api/documents",
            json!({
                "fileName": "note.pdf",
                "fileType": "application/pdf",
                "documentType": "delivery-note",
                "processingStatus": "error"
            }),
        ),
    )
    .await;
    assert!(created["processedAt"].is_null());

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/documents/1",
            json!({ "processingStatus": "completed", "confidence": "95" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processingStatus"], "completed");
    assert!(body["processedAt"].is_string());
}

#[tokio::test]
async fn test_null_processing_status_rejected() {
    let app = setup_test_app();
    send(
        &app,
        json_request(
            "POST",
            "/api/documents",
            json!({
                "fileName": "note.pdf",
                "fileType": "application/pdf",
                "documentType": "invoice",
                "processingStatus": "completed"
            }),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request("PUT", "/api/documents/1", json!({ "processingStatus": null })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "processingStatus");
    let (_, stored) = send(&app, empty_request("GET", "/api/documents/1")).await;
    assert_eq!(stored["processingStatus"], "completed");
}

#[tokio::test]
async fn test_trace_id_echoed_on_responses() {
    let app = setup_test_app();
    let request = Request::builder()
        .uri("/api/suppliers/42")
        .header("X-Trace-Id", "trace-from-client")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-from-client"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["traceId"], "trace-from-client");
}

#[tokio::test]
async fn test_openapi_document_lists_endpoints() {
    let app = setup_test_app();

    let (status, body) = send(&app, empty_request("GET", "/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/suppliers/{id}"].is_object());
    assert!(body["paths"]["/api/documents/upload"]["post"].is_object());
    assert!(body["paths"]["/api/webhook/whatsapp"].is_object());
}
