//! Persistence port
//!
//! Each method is an independent transaction. The pipeline never assumes
//! atomicity across calls; multi-field changes to one record travel together
//! in a single [`JobUpdate`] or [`ProfileUpdate`].

use async_trait::async_trait;

use crate::error::Result;
use crate::job::{Job, JobUpdate};
use crate::voice::{Artifact, ProfileUpdate, VoiceProfile, VoiceSample};

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a newly created job
    async fn create_job(&self, job: Job) -> Result<Job>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>>;

    /// Apply an update through [`Job::apply`] and return the committed row
    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job>;

    async fn get_profile(&self, id: &str) -> Result<Option<VoiceProfile>>;

    async fn create_profile(&self, profile: VoiceProfile) -> Result<VoiceProfile>;

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<VoiceProfile>;

    /// Samples owned by a voice, oldest first
    async fn list_samples(&self, voice_id: &str) -> Result<Vec<VoiceSample>>;

    async fn add_artifact(&self, artifact: Artifact) -> Result<()>;

    async fn list_artifacts(&self, job_id: &str) -> Result<Vec<Artifact>>;

    /// Store name for logging
    fn name(&self) -> &str;
}
