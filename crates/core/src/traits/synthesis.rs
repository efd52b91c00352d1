//! Synthesis engine port

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One synthesis call: a single utterance rendered to a WAV file
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub output_path: &'a Path,
    /// Playback speed factor (1.0 = natural)
    pub speed: f32,
    /// Reference recordings the cloned voice is conditioned on
    pub references: &'a [PathBuf],
    pub language: &'a str,
}

/// External speech synthesis engine
///
/// Implementations are constructed once per worker and called sequentially;
/// they need not support concurrent calls.
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    /// Render `request.text` into `request.output_path`
    ///
    /// Returns once the file is fully written. Any failure is a backend error.
    async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<()>;

    /// Backend identifier recorded in profile caches
    fn name(&self) -> &str;
}
