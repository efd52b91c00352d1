//! Persistence error types

use thiserror::Error;
use voice_render_core::{Error, TransitionError};

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("duplicate id: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<PersistenceError> for Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::JobNotFound(id) => Error::JobNotFound(id),
            PersistenceError::ProfileNotFound(id) => Error::ProfileNotFound(id),
            PersistenceError::Transition(e) => Error::Transition(e),
            other => Error::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_taxonomy() {
        let err: Error = PersistenceError::JobNotFound("j1".into()).into();
        assert!(matches!(err, Error::JobNotFound(id) if id == "j1"));

        let err: Error = PersistenceError::Duplicate("j1".into()).into();
        assert!(err.is_persistence());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = PersistenceError::Io(io).into();
        assert!(err.is_persistence());
    }
}
