//! Core types and traits for the voice render pipeline
//!
//! Everything the job pipeline passes between crates lives here:
//! - Job records and their state machine
//! - Voice profiles, samples and artifacts
//! - Typed request views over a job's input parameters
//! - Collaborator ports (store, synthesis engine, automatic accenter)

pub mod error;
pub mod job;
pub mod request;
pub mod traits;
pub mod voice;

pub use error::{Error, Result};
pub use job::{Job, JobKind, JobStatus, JobStatusView, JobUpdate, Params, TransitionError};
pub use request::{
    AccentMode, OutputFormat, PreviewRequest, StressFormat, TextMode, TrainRequest, TtsRequest,
};
pub use traits::{Accenter, JobStore, SynthesisPort, SynthesisRequest};
pub use voice::{Artifact, ProfileStatus, ProfileUpdate, VoiceProfile, VoiceSample};
