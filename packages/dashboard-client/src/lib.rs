//! Dashboard REST client for Encore
//!
//! This crate talks to the dashboard's request/response API, which the
//! realtime sync core relies on for:
//! - Initial player and queue snapshots when a target is selected
//! - Queue snapshots after a `queue_update` push without a queue
//! - Seek commands once a scrub gesture is committed
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_dashboard_client::DashboardClient;
//! use encore_sync::Target;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DashboardClient::new("https://music.example.com", Some("session-cookie"), None)?;
//! let target = Target::new("123456789")?;
//!
//! let player = client.fetch_player_snapshot(&target).await?;
//! let queue = client.fetch_queue_snapshot(&target).await?;
//! println!("{} queued, playing: {}", queue.len(), player.playing);
//!
//! client.seek(&target, 42.0).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_URL`: dashboard origin (default `http://localhost:8080`)
//! - `DASHBOARD_SESSION`: value of the `session` cookie
//! - `DASHBOARD_TIMEOUT`: request timeout in seconds (default 10)

mod client;
mod error;
mod models;

pub use client::DashboardClient;
pub use error::{DashboardError, DashboardResult};
pub use models::CommandResponse;
