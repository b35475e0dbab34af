//! Shared helpers for integration tests: socket guard, catalog fixtures and
//! in-memory ZIP bodies.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::net::TcpListener;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

fn socket_tests_required() -> bool {
    std::env::var("TRANSIT_DOWNLOADER_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a wiremock server, or returns `None` when localhost sockets are
/// unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    assert!(
        !socket_tests_required(),
        "cannot bind localhost socket; wiremock-based test cannot run"
    );
    eprintln!("[socket-bound-test] cannot bind localhost socket; skipping test");
    None
}

/// Listing entry for one dataset.
pub fn dataset_entry(id: &str, title: &str, dataset_type: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "updated": "2024-03-01T08:15:00.000000Z",
        "type": dataset_type,
        "page_url": format!("https://catalog.example/datasets/{id}"),
        "resources": []
    })
}

/// Available resource with a single format.
pub fn resource(title: &str, format: &str, updated: &str, url: &str) -> Value {
    json!({
        "id": format!("res-{title}"),
        "title": title,
        "format": format,
        "is_available": true,
        "updated": updated,
        "original_url": url
    })
}

/// Mounts `GET /api/datasets` returning `datasets`.
pub async fn mount_listing(server: &MockServer, datasets: &[Value]) {
    Mock::given(method("GET"))
        .and(path("/api/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(datasets.to_vec())))
        .mount(server)
        .await;
}

/// Mounts `GET /api/datasets/{id}` returning the detail with `resources`,
/// expecting exactly `calls` requests.
pub async fn mount_detail(
    server: &MockServer,
    id: &str,
    title: &str,
    resources: &[Value],
    calls: u64,
) {
    let body = json!({
        "id": id,
        "title": title,
        "type": "public-transit",
        "resources": resources
    });
    Mock::given(method("GET"))
        .and(path(format!("/api/datasets/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

/// Mounts a file body at `file_path`.
pub async fn mount_file(server: &MockServer, file_path: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Builds a ZIP archive in memory.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}
