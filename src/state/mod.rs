//! State module for tracking export jobs
//!
//! # Components
//!
//! - `JobState`: lifecycle state machine (`Pending → Running → terminal`)
//! - `CrawlJob`: one job's cancellation flag, counters and progress log
//! - `JobStatus`: serializable snapshot returned by status queries

mod job;
mod job_state;

// Re-export main types
pub use job::{CrawlJob, JobId, JobLogEntry, JobStatus, LogLevel, MAX_LOG_ENTRIES};
pub use job_state::JobState;
