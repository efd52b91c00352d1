//! Reference audio resolution and profile caches
//!
//! A voice is defined by its reference recordings. A ready profile pins an
//! ordered list of them; otherwise every normalized sample of the voice is
//! used. The profile cache records that list together with an
//! order-independent fingerprint so a backend can tell whether a cached
//! conditioning is still valid.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use voice_render_config::constants;
use voice_render_core::{Error, JobStore, Result};

/// Profile references if present, otherwise every sample of the voice
pub async fn resolve_references(
    store: &dyn JobStore,
    voice_id: &str,
    profile_id: Option<&str>,
) -> Result<Vec<PathBuf>> {
    if let Some(references) = profile_references(store, profile_id).await? {
        return Ok(references);
    }

    let references: Vec<PathBuf> = store
        .list_samples(voice_id)
        .await?
        .into_iter()
        .map(|s| s.normalized_path)
        .collect();
    if references.is_empty() {
        return Err(Error::NoReferences {
            voice_id: voice_id.to_string(),
        });
    }
    Ok(references)
}

/// Profile references if present, otherwise the most recent sample only
pub async fn resolve_latest_sample(
    store: &dyn JobStore,
    voice_id: &str,
    profile_id: Option<&str>,
) -> Result<Vec<PathBuf>> {
    if let Some(references) = profile_references(store, profile_id).await? {
        return Ok(references);
    }

    // oldest first
    store
        .list_samples(voice_id)
        .await?
        .pop()
        .map(|sample| vec![sample.normalized_path])
        .ok_or_else(|| Error::NoReferences {
            voice_id: voice_id.to_string(),
        })
}

async fn profile_references(
    store: &dyn JobStore,
    profile_id: Option<&str>,
) -> Result<Option<Vec<PathBuf>>> {
    let Some(profile_id) = profile_id else {
        return Ok(None);
    };
    match store.get_profile(profile_id).await? {
        Some(profile) => {
            let references = profile.reference_paths();
            if references.is_empty() {
                tracing::debug!(profile_id, "Profile has no references, using voice samples");
                Ok(None)
            } else {
                Ok(Some(references))
            }
        }
        None => {
            tracing::warn!(profile_id, "Profile not found, using voice samples");
            Ok(None)
        }
    }
}

/// SHA-256 hex over the sorted, newline-joined path list
pub fn fingerprint(paths: &[PathBuf]) -> String {
    let mut sorted: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(sorted.join("\n").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Descriptor persisted as `reference_cache.json` in a profile directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCacheMeta {
    pub backend: String,
    pub cloning_mode: String,
    pub references: Vec<PathBuf>,
    pub fingerprint: String,
    pub language: String,
}

/// Writes reference cache descriptors for one synthesis backend
#[derive(Debug, Clone)]
pub struct ProfileCache {
    backend: String,
    cloning_mode: String,
    language: String,
}

impl ProfileCache {
    pub fn new(
        backend: impl Into<String>,
        cloning_mode: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            cloning_mode: cloning_mode.into(),
            language: language.into(),
        }
    }

    pub fn descriptor_path(profile_dir: &Path) -> PathBuf {
        profile_dir.join(constants::paths::REFERENCE_CACHE_FILE)
    }

    /// Sort, fingerprint and persist the reference list into `profile_dir`
    pub async fn build(&self, reference_paths: &[PathBuf], profile_dir: &Path) -> Result<ProfileCacheMeta> {
        if reference_paths.is_empty() {
            return Err(Error::Input("profile cache needs at least one reference".into()));
        }

        let mut references = reference_paths.to_vec();
        references.sort();
        let meta = ProfileCacheMeta {
            backend: self.backend.clone(),
            cloning_mode: self.cloning_mode.clone(),
            fingerprint: fingerprint(&references),
            references,
            language: self.language.clone(),
        };

        tokio::fs::create_dir_all(profile_dir).await?;
        let json = serde_json::to_vec_pretty(&meta).map_err(std::io::Error::from)?;
        tokio::fs::write(Self::descriptor_path(profile_dir), json).await?;

        tracing::debug!(
            dir = %profile_dir.display(),
            references = meta.references.len(),
            fingerprint = %meta.fingerprint,
            "Reference cache written"
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use voice_render_core::{Params, ProfileStatus, ProfileUpdate, VoiceProfile, VoiceSample};
    use voice_render_persistence::MemoryStore;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_fingerprint_order_independent() {
        let a = fingerprint(&paths(&["/s/b.wav", "/s/a.wav", "/s/c.wav"]));
        let b = fingerprint(&paths(&["/s/c.wav", "/s/a.wav", "/s/b.wav"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint(&paths(&["/s/a.wav"])));
    }

    #[test]
    fn test_fingerprint_is_sha256_of_joined_paths() {
        let expected = format!("{:x}", Sha256::digest(b"/a.wav\n/b.wav"));
        assert_eq!(fingerprint(&paths(&["/b.wav", "/a.wav"])), expected);
    }

    #[tokio::test]
    async fn test_build_writes_sorted_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProfileCache::new("stub", "reference", "ru");
        let meta = cache
            .build(&paths(&["/s/b.wav", "/s/a.wav"]), &dir.path().join("v1").join("p1"))
            .await
            .unwrap();
        assert_eq!(meta.references, paths(&["/s/a.wav", "/s/b.wav"]));

        let raw = std::fs::read_to_string(dir.path().join("v1/p1/reference_cache.json")).unwrap();
        let stored: ProfileCacheMeta = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, meta);
        assert_eq!(stored.backend, "stub");
    }

    #[tokio::test]
    async fn test_resolution_falls_back_to_samples() {
        let store = MemoryStore::new();
        store.insert_sample(VoiceSample::new("v1", "/s/1.wav", 2.0));

        let refs = resolve_references(&store, "v1", Some("missing")).await.unwrap();
        assert_eq!(refs, paths(&["/s/1.wav"]));

        let building = store
            .create_profile(VoiceProfile::new("v1", "p"))
            .await
            .unwrap();
        let refs = resolve_references(&store, "v1", Some(&building.id)).await.unwrap();
        assert_eq!(refs, paths(&["/s/1.wav"]));
    }

    #[tokio::test]
    async fn test_profile_references_win() {
        let store = MemoryStore::new();
        store.insert_sample(VoiceSample::new("v1", "/s/1.wav", 2.0));
        let profile = store
            .create_profile(VoiceProfile::new("v1", "p"))
            .await
            .unwrap();
        let mut params = Params::new();
        params.insert("references".into(), json!(["/p/x.wav", "/p/y.wav"]));
        store
            .update_profile(
                &profile.id,
                ProfileUpdate {
                    status: Some(ProfileStatus::Ready),
                    params: Some(params),
                    model_path: None,
                },
            )
            .await
            .unwrap();

        let refs = resolve_references(&store, "v1", Some(&profile.id)).await.unwrap();
        assert_eq!(refs, paths(&["/p/x.wav", "/p/y.wav"]));
        let latest = resolve_latest_sample(&store, "v1", Some(&profile.id)).await.unwrap();
        assert_eq!(latest, refs);
    }

    #[tokio::test]
    async fn test_latest_sample_only() {
        let store = MemoryStore::new();
        let old = VoiceSample::new("v1", "/s/old.wav", 2.0);
        let mut new = VoiceSample::new("v1", "/s/new.wav", 2.0);
        new.created_at = old.created_at + chrono::Duration::seconds(1);
        store.insert_sample(new);
        store.insert_sample(old);

        let refs = resolve_latest_sample(&store, "v1", None).await.unwrap();
        assert_eq!(refs, paths(&["/s/new.wav"]));
    }

    #[tokio::test]
    async fn test_no_references() {
        let store = MemoryStore::new();
        let err = resolve_references(&store, "v1", None).await.unwrap_err();
        assert!(matches!(err, Error::NoReferences { .. }));
        let err = resolve_latest_sample(&store, "v1", None).await.unwrap_err();
        assert!(err.to_string().contains("no reference audio"));
    }
}
