//! The host event loop
//!
//! All sync state lives in one [`SyncClient`] owned by [`Host`]. Socket,
//! timer and fetch tasks only post [`HostEvent`]s; the loop applies them
//! one at a time, so no state is shared across tasks.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use encore_dashboard_client::DashboardClient;
use encore_sync::{SyncClient, Target};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::Config;
use crate::error::{WatchError, WatchResult};
use crate::event::{self, wall_clock_now, EventReceiver, EventSender, HostEvent};
use crate::fetcher::DashboardFetcher;
use crate::render::now_playing_line;
use crate::scheduler::TokioScheduler;
use crate::transport::TokioTransport;

pub type WatchClient = SyncClient<TokioTransport, TokioScheduler, DashboardFetcher>;

/// Owns the sync session and drives it from tokio tasks
pub struct Host {
    sync: WatchClient,
    dashboard: DashboardClient,
    events_tx: EventSender,
    events_rx: EventReceiver,
    tick: Duration,
    last_line: Option<String>,
}

impl Host {
    /// Wire the websocket transport, timers and dashboard fetcher together
    pub fn new(config: &Config) -> WatchResult<Self> {
        let (events_tx, events_rx) = event::channel();

        let dashboard = DashboardClient::from_config(config.dashboard())?;
        let origin = config.dashboard().origin()?;

        let transport = TokioTransport::new(events_tx.clone(), config.session().map(str::to_string));
        let scheduler = TokioScheduler::new(events_tx.clone());
        let fetcher = DashboardFetcher::new(dashboard.clone(), events_tx.clone());
        let sync = SyncClient::new(transport, scheduler, fetcher, origin, config.backoff_policy())?;

        Ok(Self {
            sync,
            dashboard,
            events_tx,
            events_rx,
            tick: config.tick(),
            last_line: None,
        })
    }

    pub fn sync(&self) -> &WatchClient {
        &self.sync
    }

    /// Wait for the next event posted by a socket, timer or fetch task
    pub async fn next_event(&mut self) -> Option<HostEvent> {
        self.events_rx.recv().await
    }

    pub fn select_target(&mut self, target: Option<Target>) -> WatchResult<()> {
        match &target {
            Some(target) => info!(target = %target, "Watching target"),
            None => info!("Stopped watching"),
        }
        self.sync.select_target(target)?;
        Ok(())
    }

    /// Apply one event from a socket, timer or fetch task
    ///
    /// # Errors
    /// Returns `WatchError::Sync` when the dashboard rejects the session;
    /// everything else is absorbed by the sync core.
    pub fn handle_event(&mut self, event: HostEvent) -> WatchResult<()> {
        match event {
            HostEvent::Opened(id) => {
                self.sync.on_open(id);
            }
            HostEvent::Frame(id, frame) => {
                self.sync.on_frame(id, &frame, wall_clock_now());
            }
            HostEvent::Closed(id, reason) => {
                self.sync.on_closed(id, reason)?;
            }
            HostEvent::TimerFired(token) => {
                self.sync.on_timer(token);
            }
            HostEvent::PlayerFetched(ticket, result) => {
                if let Err(e) = &result {
                    if e.is_auth_failure() {
                        warn!(target = %ticket.target, "Dashboard session rejected, update DASHBOARD_SESSION");
                    }
                }
                self.sync
                    .apply_player_snapshot(&ticket, result, wall_clock_now());
            }
            HostEvent::QueueFetched(ticket, result) => {
                self.sync.apply_queue_snapshot(&ticket, result);
            }
            HostEvent::SeekFinished(result) => match result {
                Ok(_) => debug!("Seek acknowledged"),
                Err(e) => warn!(error = %e, "Seek failed"),
            },
        }
        Ok(())
    }

    /// Apply a typed command; `Break` ends the session
    pub fn handle_command(&mut self, command: Command) -> WatchResult<ControlFlow<()>> {
        match command {
            Command::Seek(position) => self.seek(position),
            Command::Watch(target) => self.select_target(Some(target))?,
            Command::Leave => self.select_target(None)?,
            Command::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Run a seek through the scrub gesture so the view holds the new position
    fn seek(&mut self, position: f64) {
        let now = wall_clock_now();
        self.sync.begin_scrub(now);
        self.sync.scrub_to(position);

        let (Some(position), Some(target)) = (self.sync.commit_scrub(now), self.sync.target().cloned())
        else {
            warn!("Nothing is playing, ignoring seek");
            return;
        };

        let dashboard = self.dashboard.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = dashboard.seek(&target, position).await;
            let _ = events.send(HostEvent::SeekFinished(result));
        });
    }

    /// Render the status line, returning it only when it changed
    pub fn render(&mut self, now: f64) -> Option<String> {
        let line = now_playing_line(
            self.sync.player(),
            self.sync.position(now),
            self.sync.queue().len(),
            self.sync.connection_state(),
        );
        if self.last_line.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last_line = Some(line.clone());
        Some(line)
    }

    /// Process events, commands and render ticks until `shutdown` resolves,
    /// the user quits, or the session is rejected
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        shutdown: F,
    ) -> WatchResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        let mut commands_open = true;

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        break Err(WatchError::ChannelClosed);
                    };
                    if let Err(e) = self.handle_event(event) {
                        break Err(e);
                    }
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => match self.handle_command(command) {
                        Ok(ControlFlow::Break(())) => break Ok(()),
                        Ok(ControlFlow::Continue(())) => {}
                        Err(e) => warn!(error = %e, "Command failed"),
                    },
                    None => commands_open = false,
                },
                _ = ticker.tick() => {
                    if let Some(line) = self.render(wall_clock_now()) {
                        println!("{}", line);
                    }
                }
            }
        };

        self.sync.disconnect();
        result
    }
}
