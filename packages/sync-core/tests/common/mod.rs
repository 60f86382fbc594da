//! Common test utilities for sync-core integration tests
//!
//! Recording fakes for the transport, scheduler and snapshot fetcher, plus a
//! client builder wired to them.

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fakes;

pub use fakes::*;

use encore_sync::{BackoffPolicy, SyncClient};
use url::Url;

/// Wall clock used as "now" throughout the scenarios
pub const T: f64 = 1_700_000_000.0;

pub type TestClient = SyncClient<FakeTransport, FakeScheduler, FakeFetcher>;

pub fn origin() -> Url {
    Url::parse("https://dashboard.test").unwrap()
}

/// Idle client with default backoff
pub fn client() -> TestClient {
    SyncClient::new(
        FakeTransport::default(),
        FakeScheduler::default(),
        FakeFetcher::default(),
        origin(),
        BackoffPolicy::default(),
    )
    .unwrap()
}
