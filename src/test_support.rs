//! Test-only helpers shared by unit tests.

use std::net::TcpListener;

use wiremock::MockServer;

fn socket_tests_required() -> bool {
    std::env::var("TRANSIT_DOWNLOADER_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a wiremock server, or returns `None` when localhost sockets are
/// unavailable in the sandbox.
pub(crate) async fn start_mock_server_or_skip() -> Option<MockServer> {
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
