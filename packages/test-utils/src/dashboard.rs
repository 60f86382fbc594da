//! Mock dashboard server for testing snapshot reads and seek commands
//!
//! Provides a [`MockDashboardServer`] that simulates the guild player and
//! queue endpoints without a real dashboard instance.

use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session cookie value the mocks expect
pub const TEST_SESSION: &str = "test-session";

/// Mock dashboard server
///
/// Wraps a [`wiremock::MockServer`] and mounts responses for
/// `/api/guild/{id}/player`, `/api/guild/{id}/queue` and the seek command.
/// Success mocks only match requests carrying the [`TEST_SESSION`] cookie.
pub struct MockDashboardServer {
    server: MockServer,
}

impl MockDashboardServer {
    /// Start a new mock dashboard server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Cookie header a client authenticated with [`TEST_SESSION`] sends
    pub fn session_cookie() -> String {
        format!("session={}", TEST_SESSION)
    }

    /// Mount a mock for the player snapshot of `target`
    pub async fn mock_player_snapshot(&self, target: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/guild/{}/player", target)))
            .and(header("cookie", Self::session_cookie().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the queue snapshot of `target`
    pub async fn mock_queue_snapshot(&self, target: &str, queue: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/guild/{}/queue", target)))
            .and(header("cookie", Self::session_cookie().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(queue))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock accepting a seek to exactly `position`
    pub async fn mock_seek_success(&self, target: &str, position: f64) {
        Mock::given(method("POST"))
            .and(path(format!("/api/guild/{}/player/seek", target)))
            .and(header("cookie", Self::session_cookie().as_str()))
            .and(body_json(json!({ "position": position })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mount a 401 for every guild endpoint, as sent when the session expired
    pub async fn mock_unauthorized(&self) {
        Mock::given(path_regex(r"^/api/guild/.+"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Not authenticated"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a 403 for `target`, as sent when the user is not in the guild
    pub async fn mock_forbidden(&self, target: &str) {
        Mock::given(path_regex(format!(
            r"^/api/guild/{}/.+",
            target
        )))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "You are not in this guild"
        })))
        .mount(&self.server)
        .await;
    }

    /// Mount an application error: HTTP 500 with an `error` body
    pub async fn mock_server_error(&self, target: &str, message: &str) {
        Mock::given(path_regex(format!(
            r"^/api/guild/{}/.+",
            target
        )))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": message })))
        .mount(&self.server)
        .await;
    }

    /// Mount a queue response that arrives after `delay`
    pub async fn mock_slow_queue(&self, target: &str, delay: std::time::Duration) {
        Mock::given(method("GET"))
            .and(path(format!("/api/guild/{}/queue", target)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }
}
