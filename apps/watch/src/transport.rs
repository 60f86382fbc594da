//! Websocket transport backed by tokio-tungstenite
//!
//! Each opened connection runs in its own task and reports `Opened`,
//! `Frame` and `Closed` events tagged with its [`ConnectionId`]. Closing a
//! connection aborts its task, so a retired socket never reports again.

use std::collections::HashMap;
use std::time::Duration;

use encore_sync::{CloseReason, ConnectionId, Transport};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, trace};
use url::Url;

use crate::event::{EventSender, HostEvent};

/// Handshake timeout for a single attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawns one websocket task per opened connection
pub struct TokioTransport {
    events: EventSender,
    session: Option<String>,
    connections: HashMap<ConnectionId, JoinHandle<()>>,
}

impl TokioTransport {
    pub fn new(events: EventSender, session: Option<String>) -> Self {
        Self {
            events,
            session,
            connections: HashMap::new(),
        }
    }

    /// Connections whose task is still running
    pub fn active(&self) -> usize {
        self.connections
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Transport for TokioTransport {
    fn open(&mut self, id: ConnectionId, endpoint: &Url) {
        self.connections.retain(|_, handle| !handle.is_finished());

        let task = run_connection(id, endpoint.clone(), self.session.clone(), self.events.clone());
        self.connections.insert(id, tokio::spawn(task));
    }

    fn close(&mut self, id: ConnectionId) {
        if let Some(handle) = self.connections.remove(&id) {
            debug!(connection = %id, "Closing websocket");
            handle.abort();
        }
    }
}

impl Drop for TokioTransport {
    fn drop(&mut self) {
        for handle in self.connections.values() {
            handle.abort();
        }
    }
}

/// Build the upgrade request, attaching the dashboard session cookie
pub fn build_request(endpoint: &Url, session: Option<&str>) -> Result<Request, tungstenite::Error> {
    let mut request = endpoint.as_str().into_client_request()?;
    if let Some(session) = session {
        let cookie = HeaderValue::from_str(&format!("session={}", session))
            .map_err(|e| tungstenite::Error::HttpFormat(e.into()))?;
        request.headers_mut().insert(COOKIE, cookie);
    }
    Ok(request)
}

/// Map a failed handshake onto the sync core's close taxonomy
pub fn classify_connect_error(error: &tungstenite::Error) -> CloseReason {
    match error {
        tungstenite::Error::Http(response) => {
            CloseReason::from_handshake_status(response.status().as_u16())
        }
        other => CloseReason::Dropped(other.to_string()),
    }
}

async fn run_connection(
    id: ConnectionId,
    endpoint: Url,
    session: Option<String>,
    events: EventSender,
) {
    let reason = connect_and_read(id, &endpoint, session.as_deref(), &events).await;
    debug!(connection = %id, ?reason, "Websocket finished");
    // The host may already be gone during shutdown
    let _ = events.send(HostEvent::Closed(id, reason));
}

async fn connect_and_read(
    id: ConnectionId,
    endpoint: &Url,
    session: Option<&str>,
    events: &EventSender,
) -> CloseReason {
    let request = match build_request(endpoint, session) {
        Ok(request) => request,
        Err(e) => return CloseReason::Dropped(format!("invalid request: {}", e)),
    };

    let mut stream = match tokio::time::timeout(CONNECT_TIMEOUT, connect_async(request)).await {
        Err(_) => return CloseReason::Dropped("handshake timed out".to_string()),
        Ok(Err(e)) => return classify_connect_error(&e),
        Ok(Ok((stream, _response))) => stream,
    };

    if events.send(HostEvent::Opened(id)).is_err() {
        return CloseReason::Dropped("host stopped".to_string());
    }

    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                trace!(connection = %id, len = text.len(), "Frame received");
                if events.send(HostEvent::Frame(id, text)).is_err() {
                    return CloseReason::Dropped("host stopped".to_string());
                }
            }
            Some(Ok(Message::Close(frame))) => {
                return match frame {
                    Some(frame) => CloseReason::from_close_code(u16::from(frame.code), frame.reason),
                    None => CloseReason::Dropped("closed without status".to_string()),
                };
            }
            // Pings are answered by tungstenite; binary frames are not part of the protocol
            Some(Ok(_)) => {}
            Some(Err(e)) => return CloseReason::Dropped(e.to_string()),
            None => return CloseReason::Dropped("stream ended".to_string()),
        }
    }
}
