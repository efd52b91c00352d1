//! Configuration for the voice render workers
//!
//! - [`constants`]: pacing, progress checkpoints and defaults
//! - [`settings`]: layered file + environment settings

pub mod constants;
pub mod settings;

pub use settings::{
    AccenterKind, AccenterSettings, AudioSettings, ConfigError, LogFormat, PathSettings,
    Settings, StoreKind, StoreSettings, SynthesisEngineKind, SynthesisSettings, WorkerSettings,
};
