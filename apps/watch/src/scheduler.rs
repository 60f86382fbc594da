//! One-shot timers on the tokio runtime

use std::collections::HashMap;
use std::time::Duration;

use encore_sync::{Scheduler, TimerToken};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::event::{EventSender, HostEvent};

/// Each timer is a sleeping task that posts `TimerFired` when it wakes
pub struct TokioScheduler {
    events: EventSender,
    next: u64,
    timers: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            next: 0,
            timers: HashMap::new(),
        }
    }

    /// Timers armed and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.timers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Scheduler for TokioScheduler {
    fn after(&mut self, delay: Duration) -> TimerToken {
        self.timers.retain(|_, handle| !handle.is_finished());

        self.next += 1;
        let token = TimerToken(self.next);
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(HostEvent::TimerFired(token));
        });

        trace!(?token, delay_ms = delay.as_millis() as u64, "Timer armed");
        self.timers.insert(token, handle);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.timers.remove(&token) {
            trace!(?token, "Timer cancelled");
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for handle in self.timers.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::channel;

    #[tokio::test]
    async fn test_timer_fires_with_its_token() {
        let (tx, mut rx) = channel();
        let mut scheduler = TokioScheduler::new(tx);

        let token = scheduler.after(Duration::from_millis(10));

        match rx.recv().await {
            Some(HostEvent::TimerFired(fired)) => assert_eq!(fired, token),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = channel();
        let mut scheduler = TokioScheduler::new(tx);

        let cancelled = scheduler.after(Duration::from_millis(10));
        scheduler.cancel(cancelled);
        let kept = scheduler.after(Duration::from_millis(40));
        assert_eq!(scheduler.pending(), 1);

        match rx.recv().await {
            Some(HostEvent::TimerFired(fired)) => assert_eq!(fired, kept),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let (tx, _rx) = channel();
        let mut scheduler = TokioScheduler::new(tx);
        let a = scheduler.after(Duration::from_secs(60));
        let b = scheduler.after(Duration::from_secs(60));
        assert_ne!(a, b);
    }
}
