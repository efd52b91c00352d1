//! Text frontend errors

use thiserror::Error;
use voice_render_core::Error;

#[derive(Debug, Error)]
pub enum TextError {
    /// Override file unreadable or malformed; callers keep the previous map
    #[error("override store error: {0}")]
    OverrideStore(String),

    #[error("lexicon error: {0}")]
    Lexicon(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TextError> for Error {
    fn from(err: TextError) -> Self {
        match err {
            TextError::Io(e) => Error::Io(e),
            other => Error::Input(other.to_string()),
        }
    }
}
