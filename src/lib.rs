// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod cycle;
pub mod feed;
pub mod image;
pub mod ledger;
pub mod metrics;
pub mod publisher;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::config::{Config, Schedule};
pub use crate::cycle::{run_cycle, CycleOutcome};
pub use crate::feed::{FeedEntry, FeedSource, Rss2JsonClient};
pub use crate::ledger::{identity_key, Ledger};
pub use crate::publisher::{MastodonClient, StatusPublisher};
