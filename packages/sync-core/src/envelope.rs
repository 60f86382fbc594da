//! Wire envelope codec
//!
//! Inbound frames are JSON objects of the form `{"type": <tag>, "data": <payload>}`.
//! Decoding happens in two steps: the envelope is read with an untyped
//! payload, then the tag selects the payload shape.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::{LoopMode, Track};

// =============================================================================
// Message tags
// =============================================================================

/// Every tag the server is known to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    FullState,
    PlayerUpdate,
    Heartbeat,
    VolumeUpdate,
    LoopUpdate,
    QueueUpdate,
    Disconnected,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::FullState,
        MessageKind::PlayerUpdate,
        MessageKind::Heartbeat,
        MessageKind::VolumeUpdate,
        MessageKind::LoopUpdate,
        MessageKind::QueueUpdate,
        MessageKind::Disconnected,
    ];

    /// Tag as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::FullState => "full_state",
            MessageKind::PlayerUpdate => "player_update",
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::VolumeUpdate => "volume_update",
            MessageKind::LoopUpdate => "loop_update",
            MessageKind::QueueUpdate => "queue_update",
            MessageKind::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

// =============================================================================
// Payload Types
// =============================================================================

/// Full player snapshot, sent as `full_state` and returned by the player REST endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub current: Option<Track>,

    #[serde(default)]
    pub elapsed: f64,

    #[serde(default)]
    pub paused: bool,

    #[serde(default)]
    pub playing: bool,

    #[serde(default = "default_snapshot_volume")]
    pub volume: f64,

    #[serde(default, rename = "loop")]
    pub loop_mode: LoopMode,

    #[serde(default)]
    pub filter: Option<String>,

    /// Absent in REST player snapshots that predate queue embedding
    #[serde(default)]
    pub queue: Option<Vec<Track>>,

    #[serde(default)]
    pub in_voice: bool,

    /// Server wall clock (seconds) when `elapsed` was measured
    #[serde(default)]
    pub timestamp: Option<f64>,
}

fn default_snapshot_volume() -> f64 {
    f64::from(crate::model::DEFAULT_VOLUME)
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            current: None,
            elapsed: 0.0,
            paused: false,
            playing: false,
            volume: default_snapshot_volume(),
            loop_mode: LoopMode::Off,
            filter: None,
            queue: None,
            in_voice: false,
            timestamp: None,
        }
    }
}

/// Partial player state; absent fields leave the store untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlayerPatch {
    /// `Some(None)` means the server explicitly reported no current track
    #[serde(default, deserialize_with = "present")]
    pub current: Option<Option<Track>>,

    #[serde(default)]
    pub elapsed: Option<f64>,

    #[serde(default)]
    pub paused: Option<bool>,

    #[serde(default)]
    pub playing: Option<bool>,

    #[serde(default)]
    pub volume: Option<f64>,

    #[serde(default, rename = "loop")]
    pub loop_mode: Option<LoopMode>,

    #[serde(default, deserialize_with = "present")]
    pub filter: Option<Option<String>>,

    #[serde(default)]
    pub in_voice: Option<bool>,

    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Distinguish a field that is present but `null` from one that is missing
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Position resync pushed periodically by the server
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HeartbeatPayload {
    pub elapsed: f64,

    #[serde(default)]
    pub paused: bool,

    /// Left untouched when absent
    #[serde(default)]
    pub playing: Option<bool>,

    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VolumePayload {
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LoopPayload {
    #[serde(rename = "loop")]
    pub mode: LoopMode,
}

/// Queue push; a missing `queue` asks the client to fetch the queue itself
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueuePayload {
    #[serde(default)]
    pub queue: Option<Vec<Track>>,
}

// =============================================================================
// Decoded message
// =============================================================================

/// A validated inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    FullState(PlayerSnapshot),
    PlayerUpdate(PlayerPatch),
    Heartbeat(HeartbeatPayload),
    VolumeUpdate(VolumePayload),
    LoopUpdate(LoopPayload),
    QueueUpdate(QueuePayload),
    Disconnected,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::FullState(_) => MessageKind::FullState,
            Message::PlayerUpdate(_) => MessageKind::PlayerUpdate,
            Message::Heartbeat(_) => MessageKind::Heartbeat,
            Message::VolumeUpdate(_) => MessageKind::VolumeUpdate,
            Message::LoopUpdate(_) => MessageKind::LoopUpdate,
            Message::QueueUpdate(_) => MessageKind::QueueUpdate,
            Message::Disconnected => MessageKind::Disconnected,
        }
    }

    /// Build a typed message from a tag and its raw payload
    pub fn from_parts(kind: MessageKind, data: Value) -> Result<Self, DecodeError> {
        // Payloads made only of optional fields accept a missing/null `data`
        let data = match (kind, data) {
            (
                MessageKind::FullState | MessageKind::PlayerUpdate | MessageKind::QueueUpdate,
                Value::Null,
            ) => Value::Object(Default::default()),
            (_, data) => data,
        };

        let payload_err = |source| DecodeError::Payload { kind, source };

        Ok(match kind {
            MessageKind::FullState => {
                Message::FullState(serde_json::from_value(data).map_err(payload_err)?)
            }
            MessageKind::PlayerUpdate => {
                Message::PlayerUpdate(serde_json::from_value(data).map_err(payload_err)?)
            }
            MessageKind::Heartbeat => {
                Message::Heartbeat(serde_json::from_value(data).map_err(payload_err)?)
            }
            MessageKind::VolumeUpdate => {
                Message::VolumeUpdate(serde_json::from_value(data).map_err(payload_err)?)
            }
            MessageKind::LoopUpdate => {
                Message::LoopUpdate(serde_json::from_value(data).map_err(payload_err)?)
            }
            MessageKind::QueueUpdate => {
                Message::QueueUpdate(serde_json::from_value(data).map_err(payload_err)?)
            }
            MessageKind::Disconnected => Message::Disconnected,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    data: Value,
}

/// Decode one inbound text frame
///
/// # Errors
/// - `DecodeError::Json` - frame is not a JSON object
/// - `DecodeError::MissingType` - envelope has no `type`
/// - `DecodeError::UnknownType` - tag is not one of [`MessageKind::ALL`]
/// - `DecodeError::Payload` - payload does not match the tag
pub fn decode(frame: &str) -> Result<Message, DecodeError> {
    let raw: RawEnvelope = serde_json::from_str(frame)?;
    let tag = raw.kind.ok_or(DecodeError::MissingType)?;
    let kind: MessageKind = tag
        .parse()
        .map_err(|_| DecodeError::UnknownType(tag.clone()))?;
    Message::from_parts(kind, raw.data)
}
