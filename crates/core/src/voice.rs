//! Voice profiles, reference samples and produced artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use uuid::Uuid;

use crate::job::{Params, TransitionError};

/// Params key holding the ordered reference audio list of a ready profile
pub const REFERENCES_KEY: &str = "references";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Building,
    Ready,
}

/// A named, prepared voice built from a voice's samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub id: String,
    pub voice_id: String,
    pub name: String,
    pub status: ProfileStatus,
    pub params: Params,
    /// Reference cache descriptor written by the profile cache
    pub model_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VoiceProfile {
    /// New profile in `building` state with empty params
    pub fn new(voice_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            voice_id: voice_id.into(),
            name: name.into(),
            status: ProfileStatus::Building,
            params: Params::new(),
            model_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Ordered reference audio paths stored in params (empty if absent)
    pub fn reference_paths(&self) -> Vec<PathBuf> {
        references_in(&self.params)
    }

    pub fn apply(&mut self, update: ProfileUpdate) -> Result<(), TransitionError> {
        let next_status = update.status.unwrap_or(self.status);
        let next_refs = match &update.params {
            Some(params) => references_in(params),
            None => self.reference_paths(),
        };
        if next_status == ProfileStatus::Ready && next_refs.is_empty() {
            return Err(TransitionError::ProfileWithoutReferences);
        }

        self.status = next_status;
        if let Some(params) = update.params {
            self.params = params;
        }
        if update.model_path.is_some() {
            self.model_path = update.model_path;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn references_in(params: &Params) -> Vec<PathBuf> {
    params
        .get(REFERENCES_KEY)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(PathBuf::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Field changes for one profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub status: Option<ProfileStatus>,
    pub params: Option<Params>,
    pub model_path: Option<PathBuf>,
}

/// Normalized reference recording uploaded for a voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSample {
    pub id: String,
    pub voice_id: String,
    pub normalized_path: PathBuf,
    pub duration_sec: f64,
    pub created_at: DateTime<Utc>,
}

impl VoiceSample {
    pub fn new(
        voice_id: impl Into<String>,
        normalized_path: impl Into<PathBuf>,
        duration_sec: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            voice_id: voice_id.into(),
            normalized_path: normalized_path.into(),
            duration_sec,
            created_at: Utc::now(),
        }
    }
}

/// Audit record of a file produced by a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub job_id: String,
    pub kind: String,
    pub path: PathBuf,
    #[serde(default)]
    pub metadata: Params,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        job_id: impl Into<String>,
        kind: impl Into<String>,
        path: impl Into<PathBuf>,
        metadata: Params,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.into(),
            kind: kind.into(),
            path: path.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}
