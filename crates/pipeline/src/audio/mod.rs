//! Audio handling for rendered speech
//!
//! All processing happens on mono `f32` tracks at the configured sample rate.

mod analysis;
mod assembler;
mod resample;
mod track;
mod wav;

pub use analysis::{analyze, analyze_file, SampleAnalysis};
pub use assembler::{crossfade_len, AssemblerConfig, AssemblyItem, AudioAssembler, Pauses};
pub use resample::resample;
pub use track::AudioTrack;
pub use wav::{load_wav, write_wav};
