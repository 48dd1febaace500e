/// Job state definitions for tracking a crawl-and-export job
///
/// A job moves `Pending → Running → {Completed | Cancelled | Failed}`.
use serde::Serialize;
use std::fmt;

/// Represents the lifecycle state of one job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    // ===== Active States =====
    /// Job was accepted and is waiting for its result stream to be requested
    Pending,

    /// Traversal loop is running
    Running,

    // ===== Terminal States =====
    /// Frontier drained or page cap reached; archive finalized
    Completed,

    /// Cancellation was observed; archive finalized with what was exported
    Cancelled,

    /// The job could not continue (engine launch or archive write failure)
    Failed,
}

impl JobState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running) => true,
            // A job cancelled or failed before it ever ran
            (Self::Pending, Self::Cancelled | Self::Failed) => true,
            (Self::Running, Self::Completed | Self::Cancelled | Self::Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its string representation
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Running,
            Self::Completed,
            Self::Cancelled,
            Self::Failed,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
