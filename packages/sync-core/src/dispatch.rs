//! Routes decoded envelopes to the state store

use tracing::{debug, trace};

use crate::clock::PlaybackClock;
use crate::envelope::{decode, Message, MessageKind};
use crate::store::{QueueUpdateOutcome, StateStore};

/// What handling a frame did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message was folded into the store
    Applied(MessageKind),
    /// A `queue_update` arrived without a queue; the caller should fetch one
    RefetchQueue,
    /// The frame could not be decoded; the store is unchanged
    Dropped,
}

/// Decode one raw frame and apply it
///
/// Malformed frames are logged and dropped, never surfaced as errors.
pub fn dispatch(
    frame: &str,
    received_at: f64,
    store: &mut StateStore,
    clock: &mut PlaybackClock,
) -> DispatchOutcome {
    match decode(frame) {
        Ok(message) => apply(message, received_at, store, clock),
        Err(e) => {
            debug!(error = %e, len = frame.len(), "Dropping undecodable frame");
            DispatchOutcome::Dropped
        }
    }
}

/// Apply an already decoded message
pub fn apply(
    message: Message,
    received_at: f64,
    store: &mut StateStore,
    clock: &mut PlaybackClock,
) -> DispatchOutcome {
    let kind = message.kind();
    trace!(kind = %kind, "Applying message");

    match message {
        Message::FullState(snapshot) => store.apply_full_state(snapshot, received_at, clock),
        Message::PlayerUpdate(patch) => store.apply_player_update(patch, received_at, clock),
        Message::Heartbeat(heartbeat) => store.apply_heartbeat(heartbeat, received_at, clock),
        Message::VolumeUpdate(payload) => store.apply_volume_update(payload.volume),
        Message::LoopUpdate(payload) => store.apply_loop_update(payload.mode),
        Message::QueueUpdate(payload) => {
            if store.apply_queue_update(payload) == QueueUpdateOutcome::RefetchRequired {
                return DispatchOutcome::RefetchQueue;
            }
        }
        Message::Disconnected => store.apply_disconnected(),
    }

    DispatchOutcome::Applied(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoopMode;
    use tracing_test::traced_test;

    const T: f64 = 1_700_000_000.0;

    fn fresh() -> (StateStore, PlaybackClock) {
        (StateStore::new(), PlaybackClock::new())
    }

    #[test]
    #[traced_test]
    fn test_dispatch_malformed_is_dropped() {
        let (mut store, mut clock) = fresh();
        let before = store.clone();

        assert_eq!(
            dispatch("{not json", T, &mut store, &mut clock),
            DispatchOutcome::Dropped
        );
        assert_eq!(store, before);
        assert!(logs_contain("Dropping undecodable frame"));
    }

    #[test]
    fn test_dispatch_unknown_type_is_dropped() {
        let (mut store, mut clock) = fresh();
        assert_eq!(
            dispatch(r#"{"type":"lyrics","data":{}}"#, T, &mut store, &mut clock),
            DispatchOutcome::Dropped
        );
    }

    #[test]
    fn test_dispatch_loop_update() {
        let (mut store, mut clock) = fresh();
        let outcome = dispatch(
            r#"{"type":"loop_update","data":{"loop":"track"}}"#,
            T,
            &mut store,
            &mut clock,
        );
        assert_eq!(outcome, DispatchOutcome::Applied(MessageKind::LoopUpdate));
        assert_eq!(store.player().loop_mode, LoopMode::Track);
    }

    #[test]
    fn test_dispatch_empty_queue_update_requests_refetch() {
        let (mut store, mut clock) = fresh();
        assert_eq!(
            dispatch(r#"{"type":"queue_update","data":{}}"#, T, &mut store, &mut clock),
            DispatchOutcome::RefetchQueue
        );
    }

    #[test]
    fn test_dispatch_volume_is_clamped() {
        let (mut store, mut clock) = fresh();
        dispatch(
            r#"{"type":"volume_update","data":{"volume":140}}"#,
            T,
            &mut store,
            &mut clock,
        );
        assert_eq!(store.player().volume, 100);
    }
}
