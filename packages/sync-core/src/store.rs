//! Canonical player and queue state
//!
//! The store is the only writer of [`PlayerState`] and the queue. Every
//! mutation is synchronous, so the renderer sees the result as soon as the
//! dispatch call that triggered it returns.

use tracing::debug;

use crate::clock::PlaybackClock;
use crate::envelope::{HeartbeatPayload, PlayerPatch, PlayerSnapshot, QueuePayload};
use crate::model::{clamp_volume, LoopMode, PlayerState, Track};

/// What a `queue_update` did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueUpdateOutcome {
    /// Queue replaced wholesale with this many tracks
    Replaced(usize),
    /// Push carried no queue; the caller must fetch a snapshot
    RefetchRequired,
}

/// In-memory player and queue state for the selected target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateStore {
    player: PlayerState,
    queue: Vec<Track>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Upcoming tracks in playback order
    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    /// Replace the player state (and the queue, when the snapshot carries one)
    pub fn apply_full_state(
        &mut self,
        snapshot: PlayerSnapshot,
        received_at: f64,
        clock: &mut PlaybackClock,
    ) {
        let previous = std::mem::take(&mut self.player);

        self.player = PlayerState {
            current_track: snapshot.current,
            elapsed_seconds: previous.elapsed_seconds,
            paused: snapshot.paused,
            playing: snapshot.playing,
            volume: clamp_volume(snapshot.volume),
            loop_mode: snapshot.loop_mode,
            active_filter: snapshot.filter.unwrap_or_default(),
            last_sample_wall_clock: previous.last_sample_wall_clock,
            in_voice: snapshot.in_voice,
        };

        if let Some(queue) = snapshot.queue {
            self.queue = queue;
        }

        let sampled_at = snapshot.timestamp.unwrap_or(received_at);
        self.resample(snapshot.elapsed, sampled_at, clock);
    }

    /// Merge the fields present in `patch`; the queue is never touched
    pub fn apply_player_update(
        &mut self,
        patch: PlayerPatch,
        received_at: f64,
        clock: &mut PlaybackClock,
    ) {
        let sampled_at = patch.timestamp.unwrap_or(received_at);
        // Without an explicit position, carry the extrapolated one forward
        let elapsed = patch
            .elapsed
            .unwrap_or_else(|| clock.query(sampled_at, &self.player));

        if let Some(current) = patch.current {
            self.player.current_track = current;
        }
        if let Some(paused) = patch.paused {
            self.player.paused = paused;
        }
        if let Some(playing) = patch.playing {
            self.player.playing = playing;
        }
        if let Some(volume) = patch.volume {
            self.player.volume = clamp_volume(volume);
        }
        if let Some(mode) = patch.loop_mode {
            self.player.loop_mode = mode;
        }
        if let Some(filter) = patch.filter {
            self.player.active_filter = filter.unwrap_or_default();
        }
        if let Some(in_voice) = patch.in_voice {
            self.player.in_voice = in_voice;
        }

        self.resample(elapsed, sampled_at, clock);
    }

    /// Resync position and pause flags; track and queue are unchanged
    pub fn apply_heartbeat(
        &mut self,
        heartbeat: HeartbeatPayload,
        received_at: f64,
        clock: &mut PlaybackClock,
    ) {
        self.player.paused = heartbeat.paused;
        if let Some(playing) = heartbeat.playing {
            self.player.playing = playing;
        }
        let sampled_at = heartbeat.timestamp.unwrap_or(received_at);
        self.resample(heartbeat.elapsed, sampled_at, clock);
    }

    pub fn apply_volume_update(&mut self, volume: f64) {
        self.player.volume = clamp_volume(volume);
    }

    pub fn apply_loop_update(&mut self, mode: LoopMode) {
        self.player.loop_mode = mode;
    }

    /// Replace the queue if the push carries one, otherwise ask for a refetch
    ///
    /// A populated queue is always authoritative, even if it might be partial.
    pub fn apply_queue_update(&mut self, payload: QueuePayload) -> QueueUpdateOutcome {
        match payload.queue {
            Some(queue) => {
                let len = queue.len();
                self.queue = queue;
                QueueUpdateOutcome::Replaced(len)
            }
            None => QueueUpdateOutcome::RefetchRequired,
        }
    }

    /// Wholesale replace from a fetched queue snapshot
    pub fn replace_queue(&mut self, queue: Vec<Track>) {
        self.queue = queue;
    }

    /// The remote player left voice: nothing is playing and nothing is queued
    pub fn apply_disconnected(&mut self) {
        self.player.current_track = None;
        self.queue.clear();
    }

    /// Forget everything; used when the target changes or goes away
    pub fn clear(&mut self) {
        self.player = PlayerState::default();
        self.queue.clear();
    }

    /// Record a position the user just committed as a fresh sample
    pub fn apply_seek(&mut self, position: f64, at: f64, clock: &mut PlaybackClock) {
        self.resample(position, at, clock);
    }

    /// Position writes are suppressed while the user is scrubbing
    fn resample(&mut self, elapsed: f64, sampled_at: f64, clock: &mut PlaybackClock) {
        if clock.is_scrubbing() {
            debug!(elapsed, "scrub in progress, ignoring position update");
            return;
        }
        self.player.elapsed_seconds = elapsed;
        self.player.last_sample_wall_clock = sampled_at;
        clock.set_sample(elapsed, sampled_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaybackSample;

    const T: f64 = 1_700_000_000.0;

    fn snapshot_with_queue() -> PlayerSnapshot {
        PlayerSnapshot {
            current: Some(Track::new("Now", 200.0)),
            elapsed: 30.0,
            playing: true,
            volume: 80.0,
            loop_mode: LoopMode::Queue,
            filter: Some("Vaporwave".to_string()),
            queue: Some(vec![Track::new("A", 100.0), Track::new("B", 120.0)]),
            in_voice: true,
            timestamp: Some(T),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_state_replaces_everything_and_resamples() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();

        store.apply_full_state(snapshot_with_queue(), T + 1.0, &mut clock);

        let player = store.player();
        assert_eq!(player.current_track.as_ref().unwrap().title, "Now");
        assert_eq!(player.volume, 80);
        assert_eq!(player.loop_mode, LoopMode::Queue);
        assert_eq!(player.active_filter, "Vaporwave");
        assert!(player.in_voice);
        assert_eq!(player.elapsed_seconds, 30.0);
        assert_eq!(player.last_sample_wall_clock, T);
        assert_eq!(store.queue().len(), 2);
        assert_eq!(clock.sample(), PlaybackSample::new(30.0, T));
    }

    #[test]
    fn test_full_state_without_queue_keeps_queue() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        let snapshot = PlayerSnapshot {
            queue: None,
            ..snapshot_with_queue()
        };
        store.apply_full_state(snapshot, T, &mut clock);
        assert_eq!(store.queue().len(), 2);
    }

    #[test]
    fn test_full_state_without_timestamp_uses_receive_time() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        let snapshot = PlayerSnapshot {
            timestamp: None,
            ..snapshot_with_queue()
        };
        store.apply_full_state(snapshot, T + 9.0, &mut clock);
        assert_eq!(clock.sample().wall_clock_at_sample, T + 9.0);
    }

    #[test]
    fn test_player_update_merges_present_fields() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        let patch = PlayerPatch {
            paused: Some(true),
            volume: Some(20.0),
            elapsed: Some(50.0),
            timestamp: Some(T + 20.0),
            ..Default::default()
        };
        store.apply_player_update(patch, T + 21.0, &mut clock);

        let player = store.player();
        assert!(player.paused);
        assert_eq!(player.volume, 20);
        assert_eq!(player.loop_mode, LoopMode::Queue);
        assert_eq!(player.current_track.as_ref().unwrap().title, "Now");
        assert_eq!(store.queue().len(), 2);
        assert_eq!(clock.sample(), PlaybackSample::new(50.0, T + 20.0));
    }

    #[test]
    fn test_player_update_without_elapsed_carries_position_forward() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        let patch = PlayerPatch {
            volume: Some(10.0),
            ..Default::default()
        };
        store.apply_player_update(patch, T + 4.0, &mut clock);

        assert_eq!(clock.sample(), PlaybackSample::new(34.0, T + 4.0));
    }

    #[test]
    fn test_player_update_can_clear_current_track_and_filter() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        let patch = PlayerPatch {
            current: Some(None),
            filter: Some(None),
            ..Default::default()
        };
        store.apply_player_update(patch, T, &mut clock);

        assert!(store.player().is_idle());
        assert!(store.player().active_filter.is_empty());
    }

    #[test]
    fn test_heartbeat_only_touches_position_flags() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        let heartbeat = HeartbeatPayload {
            elapsed: 45.0,
            paused: true,
            playing: Some(false),
            timestamp: Some(T + 15.0),
        };
        store.apply_heartbeat(heartbeat, T + 16.0, &mut clock);

        let player = store.player();
        assert!(player.paused);
        assert!(!player.playing);
        assert_eq!(player.elapsed_seconds, 45.0);
        assert_eq!(player.current_track.as_ref().unwrap().title, "Now");
        assert_eq!(store.queue().len(), 2);
        assert_eq!(clock.sample(), PlaybackSample::new(45.0, T + 15.0));
    }

    #[test]
    fn test_single_field_updates_leave_clock_alone() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);
        let before = clock.sample();

        store.apply_volume_update(250.0);
        store.apply_loop_update(LoopMode::Track);

        assert_eq!(store.player().volume, 100);
        assert_eq!(store.player().loop_mode, LoopMode::Track);
        assert_eq!(clock.sample(), before);
    }

    #[test]
    fn test_queue_update_outcomes() {
        let mut store = StateStore::new();

        let outcome = store.apply_queue_update(QueuePayload {
            queue: Some(vec![Track::new("X", 1.0)]),
        });
        assert_eq!(outcome, QueueUpdateOutcome::Replaced(1));
        assert_eq!(store.queue()[0].title, "X");

        let outcome = store.apply_queue_update(QueuePayload { queue: None });
        assert_eq!(outcome, QueueUpdateOutcome::RefetchRequired);
        assert_eq!(store.queue().len(), 1);
    }

    #[test]
    fn test_disconnected_clears_track_and_queue_only() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        store.apply_disconnected();

        assert!(store.player().is_idle());
        assert!(store.queue().is_empty());
        assert_eq!(store.player().volume, 80);
    }

    #[test]
    fn test_scrub_suppresses_position_writes() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);
        clock.begin_scrub(T, store.player());

        let heartbeat = HeartbeatPayload {
            elapsed: 99.0,
            paused: false,
            playing: Some(true),
            timestamp: Some(T + 5.0),
        };
        store.apply_heartbeat(heartbeat, T + 5.0, &mut clock);

        assert_eq!(store.player().elapsed_seconds, 30.0);
        assert_eq!(clock.sample(), PlaybackSample::new(30.0, T));
    }

    #[test]
    fn test_clear_resets_to_defaults() {
        let mut store = StateStore::new();
        let mut clock = PlaybackClock::new();
        store.apply_full_state(snapshot_with_queue(), T, &mut clock);

        store.clear();
        assert_eq!(store.player(), &PlayerState::default());
        assert!(store.queue().is_empty());
    }
}
