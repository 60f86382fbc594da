//! Snapshot reads issued on behalf of the sync core

use encore_dashboard_client::DashboardClient;
use encore_sync::{FetchTicket, SnapshotFetcher};
use tracing::debug;

use crate::event::{EventSender, HostEvent};

/// Runs each dashboard request in its own task and posts the result back
pub struct DashboardFetcher {
    client: DashboardClient,
    events: EventSender,
}

impl DashboardFetcher {
    pub fn new(client: DashboardClient, events: EventSender) -> Self {
        Self { client, events }
    }
}

impl SnapshotFetcher for DashboardFetcher {
    fn fetch_player(&mut self, ticket: FetchTicket) {
        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_player_snapshot(&ticket.target).await;
            debug!(target = %ticket.target, ok = result.is_ok(), "Player snapshot request finished");
            let _ = events.send(HostEvent::PlayerFetched(ticket, result));
        });
    }

    fn fetch_queue(&mut self, ticket: FetchTicket) {
        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_queue_snapshot(&ticket.target).await;
            debug!(target = %ticket.target, ok = result.is_ok(), "Queue snapshot request finished");
            let _ = events.send(HostEvent::QueueFetched(ticket, result));
        });
    }
}
