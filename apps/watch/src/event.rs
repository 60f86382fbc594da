//! Events fed from spawned IO tasks back into the host loop

use encore_dashboard_client::{CommandResponse, DashboardResult};
use encore_sync::{CloseReason, ConnectionId, FetchTicket, PlayerSnapshot, TimerToken, Track};
use tokio::sync::mpsc;

/// Everything the host loop reacts to besides ticks and typed commands
#[derive(Debug)]
pub enum HostEvent {
    Opened(ConnectionId),
    Frame(ConnectionId, String),
    Closed(ConnectionId, CloseReason),
    TimerFired(TimerToken),
    PlayerFetched(FetchTicket, DashboardResult<PlayerSnapshot>),
    QueueFetched(FetchTicket, DashboardResult<Vec<Track>>),
    SeekFinished(DashboardResult<CommandResponse>),
}

pub type EventSender = mpsc::UnboundedSender<HostEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<HostEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Seconds since the Unix epoch, the unit the dashboard stamps samples with
pub fn wall_clock_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
