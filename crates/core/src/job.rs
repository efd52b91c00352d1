//! Job records and the job state machine
//!
//! ```text
//! pending ──► running ──► done
//!    │           │
//!    └───────────┴──────► failed
//! ```
//!
//! `done` and `failed` are terminal. Every mutation goes through
//! [`Job::apply`], so any store implementation inherits the invariants:
//! progress never decreases, `error_text` is only set on failed jobs,
//! `output_path` is only set on done jobs, and input parameters are frozen
//! at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Opaque parameter map as submitted by the dispatch layer
pub type Params = serde_json::Map<String, Value>;

/// Job kind, which also selects the queue lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Preview,
    Train,
    Tts,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Preview => "preview",
            JobKind::Train => "train",
            JobKind::Tts => "tts",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    fn can_move_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Pending, Running) | (Pending, Failed) | (Running, Done) | (Running, Failed)
            )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected job mutation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("job is {0} and can no longer change")]
    Terminal(JobStatus),

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("progress {0} is out of range")]
    ProgressOutOfRange(u8),

    #[error("progress may not decrease ({current} -> {requested})")]
    ProgressRegressed { current: u8, requested: u8 },

    #[error("error text requires failed status")]
    ErrorWithoutFailure,

    #[error("failed status requires error text")]
    FailureWithoutError,

    #[error("output path requires done status")]
    OutputWithoutDone,

    #[error("done status requires an output path")]
    DoneWithoutOutput,

    #[error("profile cannot be ready without reference audio")]
    ProfileWithoutReferences,
}

/// A unit of asynchronous work tracked by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    /// 0..=100, non-decreasing until terminal
    pub progress: u8,
    /// Submitted parameters, frozen at creation
    pub input_params: Params,
    /// Fields appended while processing (prepared text, chunk counts)
    #[serde(default)]
    pub derived: Params,
    pub error_text: Option<String>,
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a pending job
    pub fn new(kind: JobKind, input_params: Params) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            status: JobStatus::Pending,
            progress: 0,
            input_params,
            derived: Params::new(),
            error_text: None,
            output_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fresh pending job carrying this job's original input parameters
    pub fn retry_clone(&self) -> Self {
        Self::new(self.kind, self.input_params.clone())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate and apply an update in place
    ///
    /// On error the job is left untouched.
    pub fn apply(&mut self, update: JobUpdate) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }

        let next = update.status.unwrap_or(self.status);
        if !self.status.can_move_to(next) {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        if let Some(progress) = update.progress {
            if progress > 100 {
                return Err(TransitionError::ProgressOutOfRange(progress));
            }
            if progress < self.progress {
                return Err(TransitionError::ProgressRegressed {
                    current: self.progress,
                    requested: progress,
                });
            }
        }

        match (next, update.error_text.is_some()) {
            (JobStatus::Failed, false) => return Err(TransitionError::FailureWithoutError),
            (status, true) if status != JobStatus::Failed => {
                return Err(TransitionError::ErrorWithoutFailure)
            }
            _ => {}
        }

        match (next, update.output_path.is_some()) {
            (JobStatus::Done, false) => return Err(TransitionError::DoneWithoutOutput),
            (status, true) if status != JobStatus::Done => {
                return Err(TransitionError::OutputWithoutDone)
            }
            _ => {}
        }

        self.status = next;
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if update.error_text.is_some() {
            self.error_text = update.error_text;
        }
        if update.output_path.is_some() {
            self.output_path = update.output_path;
        }
        self.derived.extend(update.derived);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Field changes for one job, applied atomically by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub derived: Params,
    pub error_text: Option<String>,
    pub output_path: Option<PathBuf>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn derive(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.derived.insert(key.into(), value.into());
        self
    }

    /// Terminal failure with its description
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error_text: Some(message.into()),
            ..Self::default()
        }
    }

    /// Terminal success
    pub fn done(output_path: impl Into<PathBuf>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            progress: Some(100),
            output_path: Some(output_path.into()),
            ..Self::default()
        }
    }

    /// Fold `other` into this update, later values winning
    pub fn merge(&mut self, other: JobUpdate) {
        if other.status.is_some() {
            self.status = other.status;
        }
        if other.progress.is_some() {
            self.progress = other.progress;
        }
        if other.error_text.is_some() {
            self.error_text = other.error_text;
        }
        if other.output_path.is_some() {
            self.output_path = other.output_path;
        }
        self.derived.extend(other.derived);
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.derived.is_empty()
            && self.error_text.is_none()
            && self.output_path.is_none()
    }
}

/// What the dispatch layer sees when polling a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status,
            progress: job.progress,
            error_text: job.error_text.clone(),
            output_path: job.output_path.clone(),
        }
    }
}
