//! Encore watch library
//!
//! Tokio host for the realtime sync core: websocket transport, timers,
//! snapshot fetches and a terminal renderer. Exposed as a library for the
//! integration tests.

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod host;
pub mod render;
pub mod scheduler;
pub mod transport;

pub use config::Config;
pub use error::{WatchError, WatchResult};
pub use event::HostEvent;
pub use host::Host;
