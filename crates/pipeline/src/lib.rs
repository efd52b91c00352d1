//! Synthesis and audio assembly
//!
//! Features:
//! - Synthesis engines selected from configuration (stub, HTTP sidecar)
//! - WAV decoding with downmix and resampling
//! - Chunk assembly with crossfades and pacing pauses
//! - MP3 transcoding through ffmpeg
//! - Reference sample analysis

pub mod audio;
pub mod engine;

pub use audio::{
    analyze, analyze_file, crossfade_len, load_wav, resample, write_wav, AssemblerConfig,
    AssemblyItem, AudioAssembler, AudioTrack, Pauses, SampleAnalysis,
};
pub use engine::{create_engine, HttpEngine, HttpEngineConfig, StubEngine, SynthesisEngine};

use thiserror::Error;
use voice_render_core::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("resample error: {0}")]
    Resample(String),

    #[error("transcode error: {0}")]
    Transcode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Synthesis(msg) => Error::Backend(msg),
            PipelineError::Io(e) => Error::Io(e),
            other => Error::Audio(other.to_string()),
        }
    }
}
