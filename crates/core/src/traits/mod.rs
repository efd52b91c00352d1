//! Collaborator ports consumed by the job pipeline
//!
//! - [`JobStore`]: job/profile/sample persistence
//! - [`SynthesisPort`]: external speech synthesis engine
//! - [`Accenter`]: optional automatic stress placement

mod accenter;
mod store;
mod synthesis;

pub use accenter::Accenter;
pub use store::JobStore;
pub use synthesis::{SynthesisPort, SynthesisRequest};
