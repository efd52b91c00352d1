//! In-process store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use voice_render_core::{
    Artifact, Job, JobStore, JobUpdate, ProfileUpdate, Result, VoiceProfile, VoiceSample,
};

use crate::PersistenceError;

#[derive(Default)]
struct Tables {
    jobs: HashMap<String, Job>,
    profiles: HashMap<String, VoiceProfile>,
    samples: HashMap<String, VoiceSample>,
    artifacts: Vec<Artifact>,
}

/// Process-local store; all state is lost on drop
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a normalized sample (normally done by the upload collaborator)
    pub fn insert_sample(&self, sample: VoiceSample) {
        self.tables.write().samples.insert(sample.id.clone(), sample);
    }

    pub fn job_count(&self) -> usize {
        self.tables.read().jobs.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: Job) -> Result<Job> {
        let mut tables = self.tables.write();
        if tables.jobs.contains_key(&job.id) {
            return Err(PersistenceError::Duplicate(job.id).into());
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.tables.read().jobs.get(id).cloned())
    }

    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job> {
        let mut tables = self.tables.write();
        let job = tables
            .jobs
            .get_mut(id)
            .ok_or_else(|| PersistenceError::JobNotFound(id.to_string()))?;
        // Apply to a copy so a rejected update leaves the row untouched
        let mut next = job.clone();
        next.apply(update).map_err(PersistenceError::from)?;
        *job = next.clone();
        Ok(next)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<VoiceProfile>> {
        Ok(self.tables.read().profiles.get(id).cloned())
    }

    async fn create_profile(&self, profile: VoiceProfile) -> Result<VoiceProfile> {
        let mut tables = self.tables.write();
        if tables.profiles.contains_key(&profile.id) {
            return Err(PersistenceError::Duplicate(profile.id).into());
        }
        tables.profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<VoiceProfile> {
        let mut tables = self.tables.write();
        let profile = tables
            .profiles
            .get_mut(id)
            .ok_or_else(|| PersistenceError::ProfileNotFound(id.to_string()))?;
        let mut next = profile.clone();
        next.apply(update).map_err(PersistenceError::from)?;
        *profile = next.clone();
        Ok(next)
    }

    async fn list_samples(&self, voice_id: &str) -> Result<Vec<VoiceSample>> {
        let tables = self.tables.read();
        let mut samples: Vec<_> = tables
            .samples
            .values()
            .filter(|s| s.voice_id == voice_id)
            .cloned()
            .collect();
        samples.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(samples)
    }

    async fn add_artifact(&self, artifact: Artifact) -> Result<()> {
        self.tables.write().artifacts.push(artifact);
        Ok(())
    }

    async fn list_artifacts(&self, job_id: &str) -> Result<Vec<Artifact>> {
        Ok(self
            .tables
            .read()
            .artifacts
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
