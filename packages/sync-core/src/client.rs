//! Per-target sync session
//!
//! [`SyncClient`] ties the connection manager, dispatcher, store and clock
//! together for whichever target is currently selected. The host owns one
//! instance and feeds it transport, timer and fetch events in order.

use std::fmt::Display;

use tracing::{debug, info, warn};
use url::Url;

use crate::clock::PlaybackClock;
use crate::connection::{
    BackoffPolicy, CloseReason, ConnectionId, ConnectionManager, ConnectionState, Scheduler,
    TimerToken, Transport,
};
use crate::dispatch::{dispatch, DispatchOutcome};
use crate::envelope::PlayerSnapshot;
use crate::error::SyncResult;
use crate::model::{PlayerState, Target, Track};
use crate::store::StateStore;

/// Identifies which session a snapshot request was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub target: Target,
    pub generation: u64,
}

/// Snapshot reads over the request/response API
///
/// Implementations start the request and return immediately. The result is
/// handed back through [`SyncClient::apply_player_snapshot`] or
/// [`SyncClient::apply_queue_snapshot`] with the same ticket. Failures must
/// not be retried automatically.
pub trait SnapshotFetcher {
    fn fetch_player(&mut self, ticket: FetchTicket);

    fn fetch_queue(&mut self, ticket: FetchTicket);
}

/// Synchronized view of one remote player
#[derive(Debug)]
pub struct SyncClient<T, S, F> {
    connection: ConnectionManager<T, S>,
    store: StateStore,
    clock: PlaybackClock,
    fetcher: F,
}

impl<T, S, F> SyncClient<T, S, F>
where
    T: Transport,
    S: Scheduler,
    F: SnapshotFetcher,
{
    /// Create an idle client for targets served from `origin`
    pub fn new(
        transport: T,
        scheduler: S,
        fetcher: F,
        origin: Url,
        policy: BackoffPolicy,
    ) -> SyncResult<Self> {
        Ok(Self {
            connection: ConnectionManager::new(transport, scheduler, origin, policy)?,
            store: StateStore::new(),
            clock: PlaybackClock::new(),
            fetcher,
        })
    }

    /// Switch to `target`, or stop observing when `None`
    ///
    /// Selecting the target that is already being observed does nothing.
    /// Any other change clears the store before the new session starts.
    pub fn select_target(&mut self, target: Option<Target>) -> SyncResult<()> {
        match target {
            Some(target) => {
                if self.connection.target() == Some(&target)
                    && self.connection.state() != ConnectionState::Idle
                {
                    return Ok(());
                }

                self.store.clear();
                self.clock.reset();
                self.connection.connect(target)?;
                self.request_snapshots();
                Ok(())
            }
            None => {
                self.disconnect();
                Ok(())
            }
        }
    }

    /// Stop observing and forget the current session
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
        self.store.clear();
        self.clock.reset();
    }

    /// Ask for fresh player and queue snapshots for the current target
    pub fn request_snapshots(&mut self) {
        if let Some(ticket) = self.ticket() {
            debug!(target = %ticket.target, generation = ticket.generation, "Requesting snapshots");
            self.fetcher.fetch_player(ticket.clone());
            self.fetcher.fetch_queue(ticket);
        }
    }

    pub fn on_open(&mut self, id: ConnectionId) -> bool {
        self.connection.on_open(id)
    }

    /// Handle one text frame from transport `id`
    ///
    /// Returns `None` if the frame came from a retired connection.
    pub fn on_frame(
        &mut self,
        id: ConnectionId,
        frame: &str,
        received_at: f64,
    ) -> Option<DispatchOutcome> {
        if !self.connection.accepts(id) {
            debug!(connection = %id, "Dropping frame from retired connection");
            return None;
        }

        let outcome = dispatch(frame, received_at, &mut self.store, &mut self.clock);
        if outcome == DispatchOutcome::RefetchQueue {
            if let Some(ticket) = self.ticket() {
                debug!(target = %ticket.target, "Queue push was empty, fetching snapshot");
                self.fetcher.fetch_queue(ticket);
            }
        }
        Some(outcome)
    }

    /// Transport `id` went away
    ///
    /// An authentication rejection ends the session and is returned to the
    /// caller; everything else is retried by the connection manager.
    pub fn on_closed(&mut self, id: ConnectionId, reason: CloseReason) -> SyncResult<()> {
        let result = self.connection.on_closed(id, reason);
        if result.is_err() {
            self.store.clear();
            self.clock.reset();
        }
        result
    }

    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        self.connection.on_timer(token)
    }

    /// Whether a fetch issued under `ticket` still belongs to this session
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.connection.target() == Some(&ticket.target)
            && self.connection.generation() == ticket.generation
    }

    /// Apply a queue snapshot; returns false if it was discarded
    ///
    /// A failed fetch keeps the queue that is already shown.
    pub fn apply_queue_snapshot<E: Display>(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Track>, E>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(target = %ticket.target, "Discarding stale queue snapshot");
            return false;
        }

        match result {
            Ok(queue) => {
                info!(target = %ticket.target, tracks = queue.len(), "Queue snapshot applied");
                self.store.replace_queue(queue);
                true
            }
            Err(e) => {
                warn!(target = %ticket.target, error = %e, "Queue snapshot fetch failed");
                false
            }
        }
    }

    /// Apply a player snapshot as if it were a `full_state` push
    pub fn apply_player_snapshot<E: Display>(
        &mut self,
        ticket: &FetchTicket,
        result: Result<PlayerSnapshot, E>,
        received_at: f64,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(target = %ticket.target, "Discarding stale player snapshot");
            return false;
        }

        match result {
            Ok(snapshot) => {
                self.store
                    .apply_full_state(snapshot, received_at, &mut self.clock);
                true
            }
            Err(e) => {
                warn!(target = %ticket.target, error = %e, "Player snapshot fetch failed");
                false
            }
        }
    }

    /// Displayed playback position at `now`
    pub fn position(&self, now: f64) -> f64 {
        self.clock.query(now, self.store.player())
    }

    pub fn begin_scrub(&mut self, now: f64) {
        self.clock.begin_scrub(now, self.store.player());
    }

    /// Move the held position, bounded by the current track's duration
    pub fn scrub_to(&mut self, position: f64) {
        let duration = self.store.player().duration_seconds();
        let position = if duration > 0.0 {
            position.min(duration)
        } else {
            position
        };
        self.clock.scrub_to(position);
    }

    /// End the seek gesture
    ///
    /// Returns the position to send as a seek command when the gesture is
    /// committed over a loaded track.
    pub fn end_scrub(&mut self, commit: bool) -> Option<f64> {
        let position = self.clock.end_scrub()?;
        if !commit || self.store.player().is_idle() {
            return None;
        }

        let duration = self.store.player().duration_seconds();
        if duration > 0.0 {
            Some(position.min(duration))
        } else {
            Some(position)
        }
    }

    /// Commit the gesture and keep showing the committed position
    ///
    /// The position becomes the sample at `now`, so the view extrapolates
    /// from it until the server reports where the player actually is.
    pub fn commit_scrub(&mut self, now: f64) -> Option<f64> {
        let position = self.end_scrub(true)?;
        self.store.apply_seek(position, now, &mut self.clock);
        Some(position)
    }

    fn ticket(&self) -> Option<FetchTicket> {
        self.connection.target().map(|target| FetchTicket {
            target: target.clone(),
            generation: self.connection.generation(),
        })
    }

    pub fn player(&self) -> &PlayerState {
        self.store.player()
    }

    pub fn queue(&self) -> &[Track] {
        self.store.queue()
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.state().is_connected()
    }

    pub fn target(&self) -> Option<&Target> {
        self.connection.target()
    }

    pub fn connection(&self) -> &ConnectionManager<T, S> {
        &self.connection
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}
