//! Error taxonomy shared by every pipeline stage
//!
//! Input errors fail a job before any synthesis call, backend errors fail the
//! job mid-run, and persistence errors are handed back to the dispatch layer
//! untouched.

use thiserror::Error;

use crate::job::TransitionError;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Neither the profile nor the voice's samples provided reference audio
    #[error("no reference audio found for voice '{voice_id}'")]
    NoReferences { voice_id: String },

    #[error("text is empty after preprocessing")]
    EmptyText,

    /// Malformed or out-of-range job parameters
    #[error("invalid input: {0}")]
    Input(String),

    /// Synthesis engine or accenter sidecar failure
    #[error("synthesis backend error: {0}")]
    Backend(String),

    #[error("audio error: {0}")]
    Audio(String),

    /// The job/profile store is unavailable or rejected the write
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// The dispatch queue no longer accepts jobs
    #[error("queue error: {0}")]
    Queue(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Precondition failures detected before synthesis starts
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Error::NoReferences { .. } | Error::EmptyText | Error::Input(_)
        )
    }

    /// Store failures the core never tries to reconcile
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_references_message() {
        let err = Error::NoReferences {
            voice_id: "v1".to_string(),
        };
        assert!(err.to_string().contains("no reference audio"));
        assert!(err.is_input());
        assert!(!err.is_persistence());
    }

    #[test]
    fn test_persistence_classification() {
        assert!(Error::Persistence("down".into()).is_persistence());
        assert!(!Error::Backend("boom".into()).is_persistence());
        assert!(!Error::Backend("boom".into()).is_input());
    }
}
