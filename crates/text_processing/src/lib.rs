//! Text frontend for voice rendering
//!
//! Features:
//! - Literal number/abbreviation expansion and whitespace collapse
//! - Accent resolution (manual marks > user overrides > automatic accenter)
//! - Story/poem utterance splitting
//! - Stress-hint encodings for synthesis backends

pub mod accenter;
pub mod accents;
pub mod error;
pub mod frontend;
pub mod normalize;
pub mod overrides;
pub mod split;
pub mod stress;

pub use accenter::{DictionaryAccenter, HttpAccenter, HttpAccenterConfig};
pub use accents::{protect, ProtectedText, ACCENT_MARK};
pub use error::TextError;
pub use frontend::TextFrontend;
pub use normalize::normalize;
pub use overrides::{OverrideMap, OverrideStore};
pub use split::{split_poem, split_story, Utterance};
pub use stress::to_stress_hint_format;
