//! Recording fakes for the host-side traits

use std::collections::HashSet;
use std::time::Duration;

use encore_sync::{
    ConnectionId, FetchTicket, Scheduler, SnapshotFetcher, TimerToken, Transport,
};
use url::Url;

/// Records every open and close without touching the network
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub opened: Vec<(ConnectionId, Url)>,
    pub closed: Vec<ConnectionId>,
}

impl FakeTransport {
    /// Connections opened and not yet closed by the manager
    pub fn live(&self) -> Vec<ConnectionId> {
        self.opened
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !self.closed.contains(id))
            .collect()
    }

    pub fn last_opened(&self) -> Option<ConnectionId> {
        self.opened.last().map(|(id, _)| *id)
    }
}

impl Transport for FakeTransport {
    fn open(&mut self, id: ConnectionId, endpoint: &Url) {
        self.opened.push((id, endpoint.clone()));
    }

    fn close(&mut self, id: ConnectionId) {
        self.closed.push(id);
    }
}

/// Hands out sequential tokens and remembers delays and cancellations
#[derive(Debug, Default)]
pub struct FakeScheduler {
    next: u64,
    pub scheduled: Vec<(TimerToken, Duration)>,
    pub cancelled: HashSet<TimerToken>,
}

impl FakeScheduler {
    /// Timers that were armed and never cancelled
    pub fn pending(&self) -> Vec<TimerToken> {
        self.scheduled
            .iter()
            .map(|(token, _)| *token)
            .filter(|token| !self.cancelled.contains(token))
            .collect()
    }

    pub fn delays_ms(&self) -> Vec<u64> {
        self.scheduled
            .iter()
            .map(|(_, delay)| delay.as_millis() as u64)
            .collect()
    }

    pub fn last_token(&self) -> Option<TimerToken> {
        self.scheduled.last().map(|(token, _)| *token)
    }
}

impl Scheduler for FakeScheduler {
    fn after(&mut self, delay: Duration) -> TimerToken {
        self.next += 1;
        let token = TimerToken(self.next);
        self.scheduled.push((token, delay));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.cancelled.insert(token);
    }
}

/// Records snapshot requests; tests resolve them by hand
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pub player_requests: Vec<FetchTicket>,
    pub queue_requests: Vec<FetchTicket>,
}

impl SnapshotFetcher for FakeFetcher {
    fn fetch_player(&mut self, ticket: FetchTicket) {
        self.player_requests.push(ticket);
    }

    fn fetch_queue(&mut self, ticket: FetchTicket) {
        self.queue_requests.push(ticket);
    }
}
