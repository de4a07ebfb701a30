//! Pipeline entry points for the feed engine.
//!
//! - `FeedOrchestrator`: rebuild and publish feeds from saved queries
//! - `run_scheduler`: periodic update cycles
//! - `watch_file` / `run_reloader`: hot reload of the saved queries file

pub mod feeds;
pub mod schedule;
pub mod watch;

pub use feeds::{FeedOrchestrator, UpdateSummary};
pub use schedule::run_scheduler;
pub use watch::{FileEvent, run_reloader, watch_file};
