//! Realtime connection lifecycle
//!
//! [`ConnectionManager`] owns at most one live transport for one target. It
//! never performs IO itself: sockets and timers are driven through the
//! [`Transport`] and [`Scheduler`] traits, and their events are fed back in
//! through `on_open`, `on_closed` and `on_timer`. Every event carries the
//! [`ConnectionId`] or [`TimerToken`] it was issued under, and anything from a
//! superseded generation is dropped.

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::model::Target;

/// Delay before the first reconnect attempt
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound for the reconnect delay
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Close code sent when the session cookie is missing or invalid
pub const CLOSE_NOT_AUTHENTICATED: u16 = 4001;

/// Close code sent when the user may not observe the target
pub const CLOSE_NO_ACCESS: u16 = 4003;

/// Reconnect delay bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_ms: INITIAL_BACKOFF_MS,
            max_ms: MAX_BACKOFF_MS,
        }
    }
}

impl BackoffPolicy {
    /// Delay to use after a failure that was scheduled with `current_ms`
    pub fn next_delay(&self, current_ms: u64) -> u64 {
        current_ms.saturating_mul(2).min(self.max_ms)
    }
}

/// Identity of one transport instance
///
/// `generation` changes on every `connect`/`disconnect`; `attempt` counts
/// reconnects inside one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId {
    pub generation: u64,
    pub attempt: u32,
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.generation, self.attempt)
    }
}

/// Handle for a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Transport lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Reconnecting {
        delay_ms: u64,
    },
}

impl ConnectionState {
    /// Connectivity indicator for the renderer
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting { delay_ms } => {
                write!(f, "reconnecting in {}ms", delay_ms)
            }
        }
    }
}

/// Why a transport went away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Refused, dropped, or protocol error; recovered by reconnecting
    Dropped(String),
    /// Server refused the session; reconnecting would not help
    AuthRejected { code: u16, reason: String },
}

impl CloseReason {
    /// Classify a websocket close frame
    pub fn from_close_code(code: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match code {
            CLOSE_NOT_AUTHENTICATED | CLOSE_NO_ACCESS => CloseReason::AuthRejected { code, reason },
            _ => CloseReason::Dropped(format!("closed with code {}: {}", code, reason)),
        }
    }

    /// Classify a failed upgrade handshake by HTTP status
    pub fn from_handshake_status(status: u16) -> Self {
        match status {
            401 | 403 => CloseReason::AuthRejected {
                code: status,
                reason: "handshake rejected".to_string(),
            },
            _ => CloseReason::Dropped(format!("handshake failed with status {}", status)),
        }
    }
}

/// Socket factory driven by the connection manager
pub trait Transport {
    /// Open a socket to `endpoint`. Every event it later produces must be
    /// reported with `id`.
    fn open(&mut self, id: ConnectionId, endpoint: &Url);

    /// Close the socket opened as `id`. Its close event, if any, is ignored.
    fn close(&mut self, id: ConnectionId);
}

/// One-shot timers; a fired timer is reported back through `on_timer`
pub trait Scheduler {
    fn after(&mut self, delay: Duration) -> TimerToken;

    fn cancel(&mut self, token: TimerToken);
}

/// Derive the websocket endpoint for `target` from the page origin
///
/// The secure scheme is used iff the origin itself is secure.
pub fn endpoint_for(origin: &Url, target: &Target) -> SyncResult<Url> {
    let scheme = match origin.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(SyncError::InvalidOrigin(
                origin.to_string(),
                format!("unsupported scheme {}", other),
            ))
        }
    };

    let mut endpoint = origin
        .join(&format!("/ws/{}", target))
        .map_err(|e| SyncError::InvalidOrigin(origin.to_string(), e.to_string()))?;
    endpoint
        .set_scheme(scheme)
        .map_err(|_| SyncError::InvalidOrigin(origin.to_string(), "cannot set scheme".into()))?;
    Ok(endpoint)
}

/// Owns the transport lifecycle for exactly one target at a time
#[derive(Debug)]
pub struct ConnectionManager<T, S> {
    transport: T,
    scheduler: S,
    origin: Url,
    policy: BackoffPolicy,
    target: Option<Target>,
    endpoint: Option<Url>,
    state: ConnectionState,
    backoff_ms: u64,
    generation: u64,
    attempt: u32,
    live: Option<ConnectionId>,
    reconnect_timer: Option<TimerToken>,
}

impl<T: Transport, S: Scheduler> ConnectionManager<T, S> {
    /// Create an idle manager for targets served from `origin`
    ///
    /// # Errors
    /// Returns `SyncError::InvalidOrigin` if `origin` is not http(s) or ws(s)
    pub fn new(transport: T, scheduler: S, origin: Url, policy: BackoffPolicy) -> SyncResult<Self> {
        // Reject unusable origins up front rather than on first connect
        let probe = Target::new("0")?;
        endpoint_for(&origin, &probe)?;

        let policy = BackoffPolicy {
            initial_ms: policy.initial_ms.max(1),
            max_ms: policy.max_ms.max(policy.initial_ms.max(1)),
        };

        Ok(Self {
            transport,
            scheduler,
            origin,
            policy,
            target: None,
            endpoint: None,
            state: ConnectionState::Idle,
            backoff_ms: policy.initial_ms,
            generation: 0,
            attempt: 0,
            live: None,
            reconnect_timer: None,
        })
    }

    /// Start observing `target`, tearing down any other target first
    ///
    /// Connecting to the target that is already active is a no-op.
    pub fn connect(&mut self, target: Target) -> SyncResult<()> {
        if self.target.as_ref() == Some(&target) && self.state != ConnectionState::Idle {
            debug!(target = %target, state = %self.state, "Already observing target");
            return Ok(());
        }

        let endpoint = endpoint_for(&self.origin, &target)?;
        self.disconnect();

        self.generation += 1;
        self.attempt = 0;
        self.backoff_ms = self.policy.initial_ms;
        info!(target = %target, generation = self.generation, "Connecting to target");

        self.target = Some(target);
        self.endpoint = Some(endpoint);
        self.open_transport();
        Ok(())
    }

    /// Stop observing. Idempotent; always lands in `Idle`.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Idle && self.target.is_none() {
            return;
        }

        if let Some(token) = self.reconnect_timer.take() {
            self.scheduler.cancel(token);
        }
        if let Some(id) = self.live.take() {
            self.transport.close(id);
        }

        // Retire the generation so late events from the old transport are dropped
        self.generation += 1;
        self.state = ConnectionState::Idle;
        self.endpoint = None;
        if let Some(target) = self.target.take() {
            info!(target = %target, "Disconnected from target");
        }
    }

    /// Transport `id` finished its handshake
    ///
    /// Returns false if the event was stale and ignored.
    pub fn on_open(&mut self, id: ConnectionId) -> bool {
        if !self.is_live(id) {
            debug!(connection = %id, "Ignoring open from retired connection");
            return false;
        }

        self.state = ConnectionState::Connected;
        self.backoff_ms = self.policy.initial_ms;
        info!(connection = %id, target = ?self.target.as_ref().map(Target::as_str), "Realtime channel connected");
        true
    }

    /// Whether a frame from `id` may be handed to the dispatcher
    pub fn accepts(&self, id: ConnectionId) -> bool {
        self.is_live(id)
    }

    /// Transport `id` closed or failed
    ///
    /// Transport failures schedule a reconnect. Only an authentication
    /// rejection is returned as an error; it leaves the manager `Idle`.
    pub fn on_closed(&mut self, id: ConnectionId, reason: CloseReason) -> SyncResult<()> {
        if !self.is_live(id) {
            debug!(connection = %id, "Ignoring close from retired connection");
            return Ok(());
        }
        self.live = None;

        match reason {
            CloseReason::AuthRejected { code, reason } => {
                let target = self.target.take();
                self.generation += 1;
                self.state = ConnectionState::Idle;
                self.endpoint = None;
                warn!(connection = %id, code, reason = %reason, "Realtime channel rejected, not reconnecting");

                match target {
                    Some(target) => Err(SyncError::AuthRejected {
                        target,
                        code,
                        reason,
                    }),
                    None => Ok(()),
                }
            }
            CloseReason::Dropped(cause) => {
                warn!(connection = %id, cause = %cause, "Realtime channel lost");
                self.schedule_reconnect();
                Ok(())
            }
        }
    }

    /// A timer fired. Returns true if it started a reconnect attempt.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        if self.reconnect_timer != Some(token) {
            debug!(?token, "Ignoring stale timer");
            return false;
        }
        self.reconnect_timer = None;
        self.attempt += 1;
        self.open_transport();
        true
    }

    fn schedule_reconnect(&mut self) {
        if self.target.is_none() {
            self.state = ConnectionState::Idle;
            return;
        }

        let delay_ms = self.backoff_ms;
        let token = self.scheduler.after(Duration::from_millis(delay_ms));
        self.reconnect_timer = Some(token);
        self.state = ConnectionState::Reconnecting { delay_ms };
        self.backoff_ms = self.policy.next_delay(delay_ms);

        info!(
            generation = self.generation,
            delay_ms,
            next_delay_ms = self.backoff_ms,
            "Reconnect scheduled"
        );
    }

    fn open_transport(&mut self) {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return;
        };

        let id = ConnectionId {
            generation: self.generation,
            attempt: self.attempt,
        };
        self.live = Some(id);
        self.state = ConnectionState::Connecting;
        debug!(connection = %id, endpoint = %endpoint, "Opening transport");
        self.transport.open(id, endpoint);
    }

    fn is_live(&self, id: ConnectionId) -> bool {
        self.live == Some(id)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Delay the next failure will be scheduled with
    pub fn backoff_delay_ms(&self) -> u64 {
        self.backoff_ms
    }

    pub fn live_connection(&self) -> Option<ConnectionId> {
        self.live
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect_timer.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Default)]
    struct NullTransport {
        opened: Vec<ConnectionId>,
        closed: Vec<ConnectionId>,
    }

    impl Transport for NullTransport {
        fn open(&mut self, id: ConnectionId, _endpoint: &Url) {
            self.opened.push(id);
        }

        fn close(&mut self, id: ConnectionId) {
            self.closed.push(id);
        }
    }

    #[derive(Debug, Default)]
    struct CountingScheduler {
        next: u64,
        cancelled: Vec<TimerToken>,
    }

    impl Scheduler for CountingScheduler {
        fn after(&mut self, _delay: Duration) -> TimerToken {
            self.next += 1;
            TimerToken(self.next)
        }

        fn cancel(&mut self, token: TimerToken) {
            self.cancelled.push(token);
        }
    }

    fn manager() -> ConnectionManager<NullTransport, CountingScheduler> {
        ConnectionManager::new(
            NullTransport::default(),
            CountingScheduler::default(),
            Url::parse("http://localhost:8080").unwrap(),
            BackoffPolicy::default(),
        )
        .unwrap()
    }

    #[rstest]
    #[case("http://dash.example", "ws://dash.example/ws/42")]
    #[case("https://dash.example", "wss://dash.example/ws/42")]
    #[case("https://dash.example:8443/app/", "wss://dash.example:8443/ws/42")]
    #[case("ws://127.0.0.1:5000", "ws://127.0.0.1:5000/ws/42")]
    fn test_endpoint_follows_origin_scheme(#[case] origin: &str, #[case] expected: &str) {
        let origin = Url::parse(origin).unwrap();
        let target = Target::new("42").unwrap();
        assert_eq!(endpoint_for(&origin, &target).unwrap().as_str(), expected);
    }

    #[test]
    fn test_endpoint_rejects_other_schemes() {
        let origin = Url::parse("ftp://dash.example").unwrap();
        let target = Target::new("42").unwrap();
        assert!(matches!(
            endpoint_for(&origin, &target),
            Err(SyncError::InvalidOrigin(_, _))
        ));
    }

    #[test]
    fn test_new_rejects_bad_origin() {
        let result = ConnectionManager::new(
            NullTransport::default(),
            CountingScheduler::default(),
            Url::parse("file:///tmp/page.html").unwrap(),
            BackoffPolicy::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_backoff_policy_caps_without_overflow() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_delay(1000), 2000);
        assert_eq!(policy.next_delay(16_000), 30_000);
        assert_eq!(policy.next_delay(30_000), 30_000);
        assert_eq!(policy.next_delay(u64::MAX), 30_000);
    }

    #[test]
    fn test_close_code_classification() {
        assert!(matches!(
            CloseReason::from_close_code(4001, "Not authenticated"),
            CloseReason::AuthRejected { code: 4001, .. }
        ));
        assert!(matches!(
            CloseReason::from_close_code(4003, "No access to this guild"),
            CloseReason::AuthRejected { code: 4003, .. }
        ));
        assert!(matches!(
            CloseReason::from_close_code(1006, ""),
            CloseReason::Dropped(_)
        ));
        assert!(matches!(
            CloseReason::from_handshake_status(401),
            CloseReason::AuthRejected { code: 401, .. }
        ));
        assert!(matches!(
            CloseReason::from_handshake_status(502),
            CloseReason::Dropped(_)
        ));
    }

    #[test]
    fn test_connect_same_target_is_noop() {
        let mut manager = manager();
        let target = Target::new("1").unwrap();
        manager.connect(target.clone()).unwrap();
        let generation = manager.generation();

        manager.connect(target).unwrap();

        assert_eq!(manager.generation(), generation);
        assert_eq!(manager.transport().opened.len(), 1);
    }

    #[test]
    fn test_disconnect_when_idle_is_noop() {
        let mut manager = manager();
        manager.disconnect();
        assert_eq!(manager.generation(), 0);
        assert_eq!(manager.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_timer_reopens_under_same_generation() {
        let mut manager = manager();
        manager.connect(Target::new("1").unwrap()).unwrap();
        let first = manager.live_connection().unwrap();

        manager
            .on_closed(first, CloseReason::Dropped("reset".into()))
            .unwrap();
        assert!(manager.on_timer(TimerToken(1)));

        let second = manager.live_connection().unwrap();
        assert_eq!(second.generation, first.generation);
        assert_eq!(second.attempt, first.attempt + 1);
        assert!(!manager.on_timer(TimerToken(1)));
    }

    #[test]
    fn test_policy_is_sanitized() {
        let manager = ConnectionManager::new(
            NullTransport::default(),
            CountingScheduler::default(),
            Url::parse("http://localhost").unwrap(),
            BackoffPolicy {
                initial_ms: 0,
                max_ms: 0,
            },
        )
        .unwrap();
        assert_eq!(manager.backoff_delay_ms(), 1);
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Idle.to_string(), "idle");
        assert_eq!(
            ConnectionState::Reconnecting { delay_ms: 2000 }.to_string(),
            "reconnecting in 2000ms"
        );
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
    }
}
