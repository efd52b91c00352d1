//! JSON-document store on the local filesystem
//!
//! Layout under the store directory:
//!
//! ```text
//! jobs/<id>.json
//! profiles/<id>.json
//! samples/<id>.json
//! artifacts/<id>.json
//! ```
//!
//! Writes go to a temporary file and are renamed into place, so readers in
//! other processes never see a partial document. Read-modify-write updates
//! are serialized within one process only.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use voice_render_core::{
    Artifact, Job, JobStore, JobUpdate, ProfileUpdate, Result, VoiceProfile, VoiceSample,
};

use crate::PersistenceError;

const JOBS: &str = "jobs";
const PROFILES: &str = "profiles";
const SAMPLES: &str = "samples";
const ARTIFACTS: &str = "artifacts";

pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(root: impl AsRef<Path>) -> std::result::Result<Self, PersistenceError> {
        let root = root.as_ref().to_path_buf();
        for table in [JOBS, PROFILES, SAMPLES, ARTIFACTS] {
            tokio::fs::create_dir_all(root.join(table)).await?;
        }
        tracing::debug!(root = %root.display(), "File store opened");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register a normalized sample (normally done by the upload collaborator)
    pub async fn insert_sample(&self, sample: VoiceSample) -> std::result::Result<(), PersistenceError> {
        let path = self.doc_path(SAMPLES, &sample.id)?;
        write_doc(&path, &sample).await
    }

    fn doc_path(&self, table: &str, id: &str) -> std::result::Result<PathBuf, PersistenceError> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(PersistenceError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid record id '{}'", id),
            )));
        }
        Ok(self.root.join(table).join(format!("{}.json", id)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> std::result::Result<Option<T>, PersistenceError> {
        let path = self.doc_path(table, id)?;
        read_doc(&path).await
    }

    async fn list<T: DeserializeOwned>(&self, table: &str) -> std::result::Result<Vec<T>, PersistenceError> {
        let mut entries = tokio::fs::read_dir(self.root.join(table)).await?;
        let mut docs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(doc) = read_doc(&path).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

async fn read_doc<T: DeserializeOwned>(path: &Path) -> std::result::Result<Option<T>, PersistenceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        // Removed between listing and reading
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_doc<T: Serialize>(path: &Path, value: &T) -> std::result::Result<(), PersistenceError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl JobStore for FileStore {
    async fn create_job(&self, job: Job) -> Result<Job> {
        let path = self.doc_path(JOBS, &job.id)?;
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path).await.map_err(PersistenceError::from)? {
            return Err(PersistenceError::Duplicate(job.id).into());
        }
        write_doc(&path, &job).await?;
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.get(JOBS, id).await?)
    }

    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job> {
        let path = self.doc_path(JOBS, id)?;
        let _guard = self.write_lock.lock().await;
        let mut job: Job = read_doc(&path)
            .await?
            .ok_or_else(|| PersistenceError::JobNotFound(id.to_string()))?;
        job.apply(update).map_err(PersistenceError::from)?;
        write_doc(&path, &job).await?;
        Ok(job)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<VoiceProfile>> {
        Ok(self.get(PROFILES, id).await?)
    }

    async fn create_profile(&self, profile: VoiceProfile) -> Result<VoiceProfile> {
        let path = self.doc_path(PROFILES, &profile.id)?;
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path).await.map_err(PersistenceError::from)? {
            return Err(PersistenceError::Duplicate(profile.id).into());
        }
        write_doc(&path, &profile).await?;
        Ok(profile)
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<VoiceProfile> {
        let path = self.doc_path(PROFILES, id)?;
        let _guard = self.write_lock.lock().await;
        let mut profile: VoiceProfile = read_doc(&path)
            .await?
            .ok_or_else(|| PersistenceError::ProfileNotFound(id.to_string()))?;
        profile.apply(update).map_err(PersistenceError::from)?;
        write_doc(&path, &profile).await?;
        Ok(profile)
    }

    async fn list_samples(&self, voice_id: &str) -> Result<Vec<VoiceSample>> {
        let mut samples: Vec<VoiceSample> = self
            .list::<VoiceSample>(SAMPLES)
            .await?
            .into_iter()
            .filter(|s| s.voice_id == voice_id)
            .collect();
        samples.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(samples)
    }

    async fn add_artifact(&self, artifact: Artifact) -> Result<()> {
        let path = self.doc_path(ARTIFACTS, &artifact.id)?;
        write_doc(&path, &artifact).await?;
        Ok(())
    }

    async fn list_artifacts(&self, job_id: &str) -> Result<Vec<Artifact>> {
        let mut artifacts: Vec<Artifact> = self
            .list::<Artifact>(ARTIFACTS)
            .await?
            .into_iter()
            .filter(|a| a.job_id == job_id)
            .collect();
        artifacts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(artifacts)
    }

    fn name(&self) -> &str {
        "file"
    }
}
