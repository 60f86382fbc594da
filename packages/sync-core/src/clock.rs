//! Playback position extrapolation
//!
//! Heartbeats are sparse, so between samples the position is estimated as
//! `sample.elapsed + (now - sample.wall_clock)`. The clock never reads the
//! system time itself; callers pass `now` in, which keeps it deterministic.

use crate::model::{PlaybackSample, PlayerState};

/// Extrapolates the live playback position from the latest sample
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    sample: PlaybackSample,
    /// Position held while the user drags the seek bar
    scrub: Option<f64>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current sample atomically
    pub fn set_sample(&mut self, elapsed_seconds: f64, wall_clock_at_sample: f64) {
        self.sample = PlaybackSample::new(elapsed_seconds, wall_clock_at_sample);
    }

    pub fn sample(&self) -> PlaybackSample {
        self.sample
    }

    /// Position to display at `now`
    ///
    /// Frozen at the last known position when idle, paused or scrubbing,
    /// extrapolated otherwise. Whatever the source, the result is clamped
    /// to `[0, duration]` unless the track is live.
    pub fn query(&self, now: f64, player: &PlayerState) -> f64 {
        let position = match (self.scrub, &player.current_track) {
            (Some(held), _) => held,
            (None, Some(_)) if !player.paused => {
                // A sample stamped ahead of the local clock must not run backwards
                let delta = (now - self.sample.wall_clock_at_sample).max(0.0);
                self.sample.elapsed_seconds + delta
            }
            _ => self.sample.elapsed_seconds,
        };

        match &player.current_track {
            Some(track) if !track.is_live() => position.clamp(0.0, track.duration_seconds),
            _ => position.max(0.0),
        }
    }

    /// Start a manual seek gesture, holding the currently displayed position
    pub fn begin_scrub(&mut self, now: f64, player: &PlayerState) {
        if self.scrub.is_none() {
            let held = self.query(now, player);
            self.scrub = Some(held);
        }
    }

    /// Move the held position while scrubbing; ignored otherwise
    pub fn scrub_to(&mut self, position: f64) {
        if let Some(held) = self.scrub.as_mut() {
            *held = position.max(0.0);
        }
    }

    /// Finish the gesture and return the position the user settled on
    pub fn end_scrub(&mut self) -> Option<f64> {
        self.scrub.take()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
