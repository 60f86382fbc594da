//! Error types for the synchronization core
//!
//! Only two kinds of failure ever leave this crate: an authentication
//! rejection on the realtime channel, and invalid input handed to a
//! constructor. Everything else (transport drops, malformed frames, failed
//! snapshot fetches) ends in a state transition or a dropped message.

use thiserror::Error;

use crate::envelope::MessageKind;
use crate::model::Target;

/// Errors surfaced to the owner of a [`SyncClient`](crate::SyncClient)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The server refused the realtime channel for this target.
    /// No reconnect is scheduled after this error.
    #[error("realtime channel rejected for target {target} (code {code}): {reason}")]
    AuthRejected {
        target: Target,
        code: u16,
        reason: String,
    },

    /// Target identifier failed validation
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Page origin cannot be turned into a websocket endpoint
    #[error("invalid origin {0}: {1}")]
    InvalidOrigin(String, String),
}

impl SyncError {
    /// Whether the caller should re-authenticate before trying again
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SyncError::AuthRejected { .. })
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Reasons an inbound frame could not be turned into a [`Message`](crate::Message)
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame is not a JSON object
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope has no `type` tag
    #[error("frame has no `type` tag")]
    MissingType,

    /// Tag is well-formed but no handler exists for it
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// Tag is known but the payload has the wrong shape
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}
