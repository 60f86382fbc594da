//! Client-side model of the remote player
//!
//! These types hold what the renderer reads. Wire payloads live in
//! [`crate::envelope`] and are folded into these by the [`StateStore`](crate::StateStore).

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SyncError, SyncResult};

/// Maximum target identifier length
const MAX_TARGET_LENGTH: usize = 128;

/// Volume shown before the server reports one
pub const DEFAULT_VOLUME: u8 = 50;

/// Identifier of the observed session (a guild/channel id)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// Validate and wrap a target identifier
    ///
    /// The id becomes a URL path segment, so only ASCII alphanumerics,
    /// `-` and `_` are accepted.
    pub fn new(id: impl Into<String>) -> SyncResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SyncError::InvalidTarget(
                "target cannot be empty".to_string(),
            ));
        }
        if id.len() > MAX_TARGET_LENGTH {
            return Err(SyncError::InvalidTarget(format!(
                "target must be at most {} characters",
                MAX_TARGET_LENGTH
            )));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SyncError::InvalidTarget(format!(
                "target contains invalid characters: {}",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Target {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

/// Loop mode options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Off,
    Track,
    Queue,
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopMode::Off => write!(f, "off"),
            LoopMode::Track => write!(f, "track"),
            LoopMode::Queue => write!(f, "queue"),
        }
    }
}

/// A playable item, either current or queued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, rename = "thumbnail")]
    pub thumbnail_url: Option<String>,

    /// Length in seconds; 0 means unknown or a live stream
    #[serde(default, rename = "duration", deserialize_with = "duration_or_zero")]
    pub duration_seconds: f64,

    #[serde(default, rename = "requester")]
    pub requester_name: String,
}

impl Track {
    pub fn new(title: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            title: title.into(),
            url: None,
            thumbnail_url: None,
            duration_seconds: duration_seconds.max(0.0),
            requester_name: String::new(),
        }
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester_name = requester.into();
        self
    }

    /// Live streams and unknown-length tracks have no duration to clamp to
    pub fn is_live(&self) -> bool {
        self.duration_seconds <= 0.0
    }
}

/// `null`, missing, negative and non-finite durations all mean "unknown"
fn duration_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0))
}

/// Canonical view of the remote player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub current_track: Option<Track>,
    pub elapsed_seconds: f64,
    pub paused: bool,
    pub playing: bool,
    /// Volume percentage in `[0, 100]`
    pub volume: u8,
    pub loop_mode: LoopMode,
    /// Name of the active audio filter, empty when none
    pub active_filter: String,
    /// Wall clock (seconds) at which `elapsed_seconds` was sampled
    pub last_sample_wall_clock: f64,
    pub in_voice: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            elapsed_seconds: 0.0,
            paused: false,
            playing: false,
            volume: DEFAULT_VOLUME,
            loop_mode: LoopMode::Off,
            active_filter: String::new(),
            last_sample_wall_clock: 0.0,
            in_voice: false,
        }
    }
}

impl PlayerState {
    /// Nothing is loaded on the remote player
    pub fn is_idle(&self) -> bool {
        self.current_track.is_none()
    }

    /// Duration of the current track, 0 when idle or live
    pub fn duration_seconds(&self) -> f64 {
        self.current_track
            .as_ref()
            .map(|t| t.duration_seconds)
            .unwrap_or(0.0)
    }
}

/// Immutable (position, wall clock) pair the playback clock extrapolates from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackSample {
    pub elapsed_seconds: f64,
    pub wall_clock_at_sample: f64,
}

impl PlaybackSample {
    pub fn new(elapsed_seconds: f64, wall_clock_at_sample: f64) -> Self {
        Self {
            elapsed_seconds,
            wall_clock_at_sample,
        }
    }
}

/// Clamp a reported volume into `[0, 100]`
pub fn clamp_volume(volume: f64) -> u8 {
    if !volume.is_finite() {
        return 0;
    }
    volume.round().clamp(0.0, 100.0) as u8
}
