//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlTask`: a unit of work held by the frontier
//! - `FetchOutcome`: the result of processing one task
//! - `PageState`: the terminal state an outcome records
//! - `HostState`: per-host politeness bookkeeping

mod host_state;
mod outcome;
mod page_state;
mod task;

// Re-export main types
pub use host_state::HostState;
pub use outcome::FetchOutcome;
pub use page_state::PageState;
pub use task::CrawlTask;
