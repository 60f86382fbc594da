//! Realtime player synchronization for the Encore dashboard
//!
//! This crate keeps a client-side copy of a remote music player in sync over
//! a long-lived websocket, without polling:
//! - Envelope decoding for the server's `{type, data}` frames
//! - Connection lifecycle with capped exponential reconnect backoff
//! - A state store for the current track, flags and queue
//! - Local extrapolation of the playback position between heartbeats
//!
//! Nothing here performs IO. The host implements [`Transport`], [`Scheduler`]
//! and [`SnapshotFetcher`], then feeds their events back into [`SyncClient`].
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_sync::{BackoffPolicy, SyncClient, Target};
//! # use encore_sync::{ConnectionId, FetchTicket, Scheduler, SnapshotFetcher, TimerToken, Transport};
//! # use std::time::Duration;
//! # struct Socket; struct Timers; struct Rest;
//! # impl Transport for Socket { fn open(&mut self, _: ConnectionId, _: &url::Url) {} fn close(&mut self, _: ConnectionId) {} }
//! # impl Scheduler for Timers { fn after(&mut self, _: Duration) -> TimerToken { TimerToken(0) } fn cancel(&mut self, _: TimerToken) {} }
//! # impl SnapshotFetcher for Rest { fn fetch_player(&mut self, _: FetchTicket) {} fn fetch_queue(&mut self, _: FetchTicket) {} }
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let origin = url::Url::parse("https://dashboard.example")?;
//! let mut client = SyncClient::new(Socket, Timers, Rest, origin, BackoffPolicy::default())?;
//!
//! client.select_target(Some(Target::new("123456789")?))?;
//! // ... feed on_open / on_frame / on_closed / on_timer from the host loop ...
//! println!("{}", encore_sync::format_time(client.position(1_700_000_000.0)));
//! # Ok(())
//! # }
//! ```

mod client;
mod clock;
mod connection;
mod dispatch;
mod envelope;
mod error;
mod format;
mod model;
mod store;

pub use client::{FetchTicket, SnapshotFetcher, SyncClient};
pub use clock::PlaybackClock;
pub use connection::{
    endpoint_for, BackoffPolicy, CloseReason, ConnectionId, ConnectionManager, ConnectionState,
    Scheduler, TimerToken, Transport, CLOSE_NOT_AUTHENTICATED, CLOSE_NO_ACCESS,
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS,
};
pub use dispatch::{apply, dispatch, DispatchOutcome};
pub use envelope::{
    decode, HeartbeatPayload, LoopPayload, Message, MessageKind, PlayerPatch, PlayerSnapshot,
    QueuePayload, VolumePayload,
};
pub use error::{DecodeError, SyncError, SyncResult};
pub use format::format_time;
pub use model::{clamp_volume, LoopMode, PlaybackSample, PlayerState, Target, Track, DEFAULT_VOLUME};
pub use store::{QueueUpdateOutcome, StateStore};
