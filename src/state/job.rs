//! Per-job record shared between the registry and the running traversal
//!
//! The cancellation flag and stream claim are atomics so they can be flipped
//! from any task without waiting on the traversal. Counters and the progress
//! log sit behind one mutex that is only held for short, non-async sections.

use crate::jobs::JobRequest;
use crate::state::JobState;
use crate::PressError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Oldest entries are dropped once a job's log grows past this
pub const MAX_LOG_ENTRIES: usize = 10_000;

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh id: 12 hex characters of a SHA-256 over the seed,
    /// the creation time and a process-wide counter
    pub fn generate(seed: &str) -> Self {
        let counter = JOB_COUNTER.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();

        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(now.timestamp().to_le_bytes());
        hasher.update(now.timestamp_subsec_nanos().to_le_bytes());
        hasher.update(counter.to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());

        let digest = hex::encode(hasher.finalize());
        Self(digest[..12].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Severity of a job log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One line of a job's human-readable progress log
#[derive(Debug, Clone, Serialize)]
pub struct JobLogEntry {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for JobLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            LogLevel::Info => "",
            LogLevel::Warn => "WARN ",
            LogLevel::Error => "ERROR ",
        };
        write!(
            f,
            "[{}] {}{}",
            self.at.format("%H:%M:%S"),
            marker,
            self.message
        )
    }
}

/// Point-in-time view of a job, as returned by status queries
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: JobId,
    pub seed: String,
    pub state: JobState,
    pub done: bool,
    pub cancelled: bool,
    pub pages_attempted: u32,
    pub pages_exported: u32,
    pub pages_failed: u32,
    pub artifacts: u32,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Log entries dropped because the log reached its cap
    pub log_dropped: usize,
    pub log: Vec<JobLogEntry>,
}

#[derive(Debug)]
struct JobProgress {
    state: JobState,
    pages_attempted: u32,
    pages_exported: u32,
    pages_failed: u32,
    artifacts: u32,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
    log: VecDeque<JobLogEntry>,
    log_dropped: usize,
}

/// A crawl-and-export job
#[derive(Debug)]
pub struct CrawlJob {
    id: JobId,
    request: JobRequest,
    created_at: DateTime<Utc>,
    cancelled: AtomicBool,
    stream_claimed: AtomicBool,
    progress: Mutex<JobProgress>,
}

impl CrawlJob {
    /// Creates a job in `Pending`
    pub fn new(id: JobId, request: JobRequest) -> Self {
        Self {
            id,
            request,
            created_at: Utc::now(),
            cancelled: AtomicBool::new(false),
            stream_claimed: AtomicBool::new(false),
            progress: Mutex::new(JobProgress {
                state: JobState::Pending,
                pages_attempted: 0,
                pages_exported: 0,
                pages_failed: 0,
                artifacts: 0,
                finished_at: None,
                error: None,
                log: VecDeque::new(),
                log_dropped: 0,
            }),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn request(&self) -> &JobRequest {
        &self.request
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn progress(&self) -> MutexGuard<'_, JobProgress> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Requests cooperative cancellation
    ///
    /// Returns true the first time; later calls are no-ops.
    pub fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.warn("Cancellation requested");
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Claims the right to stream this job's result
    ///
    /// Returns false if the result stream was already claimed.
    pub fn claim_stream(&self) -> bool {
        self.stream_claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn state(&self) -> JobState {
        self.progress().state
    }

    /// Moves the job to `next`, rejecting illegal transitions
    pub fn transition(&self, next: JobState) -> Result<(), PressError> {
        let mut progress = self.progress();
        let current = progress.state;
        if !current.can_transition_to(next) {
            return Err(PressError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        progress.state = next;
        if next.is_terminal() {
            progress.finished_at = Some(Utc::now());
        }
        drop(progress);

        tracing::debug!(job_id = %self.id, from = %current, to = %next, "Job state changed");
        Ok(())
    }

    /// Records the error that ended the job
    pub fn set_error(&self, message: impl Into<String>) {
        self.progress().error = Some(message.into());
    }

    pub fn record_attempt(&self) -> u32 {
        let mut progress = self.progress();
        progress.pages_attempted += 1;
        progress.pages_attempted
    }

    pub fn record_export(&self, artifacts: usize) {
        let mut progress = self.progress();
        progress.pages_exported += 1;
        progress.artifacts += artifacts as u32;
    }

    pub fn record_failure(&self) {
        self.progress().pages_failed += 1;
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message.into());
    }

    /// Appends to the job log and mirrors the entry to `tracing`
    pub fn log(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!(job_id = %self.id, "{}", message),
            LogLevel::Warn => tracing::warn!(job_id = %self.id, "{}", message),
            LogLevel::Error => tracing::error!(job_id = %self.id, "{}", message),
        }

        let mut progress = self.progress();
        if progress.log.len() >= MAX_LOG_ENTRIES {
            progress.log.pop_front();
            progress.log_dropped += 1;
        }
        progress.log.push_back(JobLogEntry {
            at: Utc::now(),
            level,
            message,
        });
    }

    /// Snapshot of the job's progress
    pub fn status(&self) -> JobStatus {
        let progress = self.progress();
        JobStatus {
            id: self.id.clone(),
            seed: self.request.seed.url.to_string(),
            state: progress.state,
            done: progress.state.is_terminal(),
            cancelled: self.is_cancelled(),
            pages_attempted: progress.pages_attempted,
            pages_exported: progress.pages_exported,
            pages_failed: progress.pages_failed,
            artifacts: progress.artifacts,
            created_at: self.created_at,
            finished_at: progress.finished_at,
            error: progress.error.clone(),
            log_dropped: progress.log_dropped,
            log: progress.log.iter().cloned().collect(),
        }
    }
}
