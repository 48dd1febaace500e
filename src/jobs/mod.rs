//! Job lifecycle for Sumi-Press
//!
//! This module provides the front-end facing operations:
//!
//! - `start_job`: validate parameters and register a `Pending` job
//! - `cancel_job`: set a job's cooperative cancellation flag
//! - `status`: progress counters and the job's log
//! - `stream_result`: claim the archive stream that drives the job
//!
//! # Example
//!
//! ```no_run
//! use sumi_press::config::Config;
//! use sumi_press::jobs::{JobService, StartJobParams};
//! use sumi_press::ScopeMode;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let service = JobService::with_chromium(Config::default());
//! let id = service.start_job(
//!     StartJobParams::new("https://example.com/docs/")
//!         .depth(1)
//!         .scope(ScopeMode::Children),
//! )?;
//!
//! let mut file = tokio::fs::File::create("site-export.zip").await?;
//! let outcome = service.stream_result(&id)?.write_to(&mut file).await?;
//! println!("{} pages exported", outcome.pages_exported);
//! # Ok(())
//! # }
//! ```

mod registry;
mod request;
mod service;

pub use registry::JobRegistry;
pub use request::{JobRequest, StartJobParams};
pub use service::{JobOutcome, JobService, ResultStream};

pub use crate::state::{JobId, JobStatus};
