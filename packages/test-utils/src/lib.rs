//! Shared test utilities for the Encore workspace
//!
//! This crate provides a mock dashboard server and JSON fixtures for the
//! realtime and REST payloads, so the sync core, dashboard client and watch
//! app can be tested without a running dashboard.
//!
//! # Mock Services
//!
//! - [`MockDashboardServer`] - Mock dashboard REST API for snapshot and seek tests
//!
//! # Fixtures
//!
//! - [`track_json`], [`queue_json`], [`player_json`] - payload bodies
//! - [`frame`] - a `{type, data}` websocket envelope
//!
//! # Example
//!
//! ```rust,ignore
//! use encore_test_utils::{player_json, track_json, MockDashboardServer};
//!
//! #[tokio::test]
//! async fn test_with_mock() {
//!     let server = MockDashboardServer::start().await;
//!     server
//!         .mock_player_snapshot("123", player_json(Some(track_json("Song", 180.0)), 12.0, false))
//!         .await;
//!
//!     // Use server.url() to configure your client
//! }
//! ```

mod dashboard;
mod fixtures;

pub use dashboard::{MockDashboardServer, TEST_SESSION};
pub use fixtures::{frame, player_json, queue_json, track_json};
