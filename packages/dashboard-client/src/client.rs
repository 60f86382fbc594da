//! Dashboard REST client implementation

use std::fmt;
use std::time::Duration;

use encore_shared_config::DashboardConfig;
use encore_sync::{PlayerSnapshot, Target, Track};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{CommandResponse, ErrorResponse, SeekRequest};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Name of the cookie the dashboard issues at login
const SESSION_COOKIE: &str = "session";

/// Dashboard REST client
///
/// Failed requests are returned as-is; nothing is retried.
#[derive(Clone)]
pub struct DashboardClient {
    http_client: Client,
    base_url: Url,
    has_session: bool,
}

impl fmt::Debug for DashboardClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.has_session.then_some("[REDACTED]"))
            .finish()
    }
}

impl DashboardClient {
    /// Create a client for the dashboard at `base_url`
    ///
    /// # Errors
    /// - `DashboardError::InvalidInput` if the URL or session cookie is malformed
    /// - `DashboardError::Http` if the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        session: Option<&str>,
        timeout: Option<Duration>,
    ) -> DashboardResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DashboardError::InvalidInput(format!("invalid dashboard URL: {}", e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(DashboardError::InvalidInput(format!(
                "dashboard URL must be http or https: {}",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(session) = session {
            let mut cookie = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, session))
                .map_err(|_| {
                    DashboardError::InvalidInput("session contains invalid characters".to_string())
                })?;
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
        }

        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("Encore/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            has_session: session.is_some(),
        })
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &DashboardConfig) -> DashboardResult<Self> {
        Self::new(
            &config.url,
            config.session.as_deref(),
            Some(config.timeout()),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, target: &Target, suffix: &str) -> DashboardResult<Url> {
        self.base_url
            .join(&format!("/api/guild/{}/{}", target, suffix))
            .map_err(|e| DashboardError::InvalidInput(e.to_string()))
    }

    /// Send a request and decode the body, mapping dashboard error conventions
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> DashboardResult<T> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DashboardError::Timeout
            } else {
                DashboardError::Http(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Dashboard rejected the session");
            return Err(DashboardError::Unauthorized);
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                DashboardError::Timeout
            } else {
                DashboardError::Http(e)
            }
        })?;

        // Errors come back as `{"error": "..."}`, sometimes with a 200
        if let Ok(ErrorResponse { error }) = serde_json::from_str::<ErrorResponse>(&text) {
            return Err(if status == StatusCode::FORBIDDEN {
                DashboardError::Forbidden(error)
            } else {
                DashboardError::Api {
                    status: status.as_u16(),
                    message: error,
                }
            });
        }

        if status == StatusCode::FORBIDDEN {
            return Err(DashboardError::Forbidden(status.to_string()));
        }
        if !status.is_success() {
            return Err(DashboardError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch the full player snapshot for `target`
    ///
    /// # Errors
    /// - `DashboardError::Unauthorized` - session missing or expired
    /// - `DashboardError::Forbidden` - the user cannot see this target
    /// - `DashboardError::Api` - dashboard reported an error
    /// - `DashboardError::Timeout` / `DashboardError::Http` - transport failure
    #[instrument(skip(self, target), fields(target = %target))]
    pub async fn fetch_player_snapshot(&self, target: &Target) -> DashboardResult<PlayerSnapshot> {
        let url = self.endpoint(target, "player")?;
        debug!(%url, "Fetching player snapshot");

        let snapshot: PlayerSnapshot = self.execute(self.http_client.get(url)).await?;

        debug!(
            playing = snapshot.playing,
            has_track = snapshot.current.is_some(),
            "Fetched player snapshot"
        );
        Ok(snapshot)
    }

    /// Fetch the queue for `target`
    #[instrument(skip(self, target), fields(target = %target))]
    pub async fn fetch_queue_snapshot(&self, target: &Target) -> DashboardResult<Vec<Track>> {
        let url = self.endpoint(target, "queue")?;
        debug!(%url, "Fetching queue snapshot");

        let queue: Vec<Track> = self.execute(self.http_client.get(url)).await?;

        debug!(track_count = queue.len(), "Fetched queue snapshot");
        Ok(queue)
    }

    /// Seek the remote player to `position` seconds
    ///
    /// # Errors
    /// Returns `DashboardError::InvalidInput` for negative or non-finite positions
    #[instrument(skip(self, target), fields(target = %target))]
    pub async fn seek(&self, target: &Target, position: f64) -> DashboardResult<CommandResponse> {
        let position = Self::validate_position(position)?;
        let url = self.endpoint(target, "player/seek")?;

        let response: CommandResponse = self
            .execute(self.http_client.post(url).json(&SeekRequest { position }))
            .await?;

        debug!(position, "Seek accepted");
        Ok(response)
    }

    fn validate_position(position: f64) -> DashboardResult<f64> {
        if !position.is_finite() || position < 0.0 {
            return Err(DashboardError::InvalidInput(format!(
                "seek position must be a non-negative number of seconds, got {}",
                position
            )));
        }
        // The dashboard seeks in whole seconds
        Ok(position.floor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_bad_url() {
        assert!(matches!(
            DashboardClient::new("not a url", None, None),
            Err(DashboardError::InvalidInput(_))
        ));
        assert!(matches!(
            DashboardClient::new("ws://dash.example", None, None),
            Err(DashboardError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_client_rejects_header_breaking_session() {
        assert!(matches!(
            DashboardClient::new("http://dash.example", Some("abc\r\nX-Evil: 1"), None),
            Err(DashboardError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_client_debug_redacts_session() {
        let client =
            DashboardClient::new("http://dash.example", Some("secret_cookie"), None).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_cookie"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_endpoint_paths() {
        let client = DashboardClient::new("https://dash.example/", None, None).unwrap();
        let target = Target::new("123").unwrap();
        assert_eq!(
            client.endpoint(&target, "player").unwrap().as_str(),
            "https://dash.example/api/guild/123/player"
        );
        assert_eq!(
            client.endpoint(&target, "player/seek").unwrap().as_str(),
            "https://dash.example/api/guild/123/player/seek"
        );
    }

    #[test]
    fn test_validate_position() {
        assert_eq!(DashboardClient::validate_position(61.8).unwrap(), 61.0);
        assert_eq!(DashboardClient::validate_position(0.0).unwrap(), 0.0);
        assert!(DashboardClient::validate_position(-1.0).is_err());
        assert!(DashboardClient::validate_position(f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = DashboardConfig::with_url("http://localhost:9000").with_session("s");
        let client = DashboardClient::from_config(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:9000/");
    }
}
