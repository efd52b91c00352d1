//! Layered worker settings
//!
//! Precedence, lowest first:
//! 1. Built-in defaults (see [`crate::constants`])
//! 2. Optional config file (`VOICE_RENDER_CONFIG`, default `config/voice-render`)
//! 3. Environment variables `VOICE_RENDER__<SECTION>__<KEY>`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants;

/// Env var naming the config file
pub const CONFIG_PATH_ENV: &str = "VOICE_RENDER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/voice-render";
pub const ENV_PREFIX: &str = "VOICE_RENDER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub store: StoreSettings,
    pub synthesis: SynthesisSettings,
    pub accenter: AccenterSettings,
    pub audio: AudioSettings,
    pub workers: WorkerSettings,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub data_root: PathBuf,
    pub profiles_dir: PathBuf,
    /// Per-job scratch chunks
    pub jobs_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub accent_overrides_path: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_root: constants::paths::DATA_ROOT.into(),
            profiles_dir: constants::paths::PROFILES_DIR.into(),
            jobs_dir: constants::paths::JOBS_DIR.into(),
            outputs_dir: constants::paths::OUTPUTS_DIR.into(),
            accent_overrides_path: constants::paths::ACCENT_OVERRIDES.into(),
        }
    }
}

impl PathSettings {
    /// All paths re-rooted under `root`, keeping the default layout
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_root: root.to_path_buf(),
            profiles_dir: root.join("profiles"),
            jobs_dir: root.join("jobs"),
            outputs_dir: root.join("outputs"),
            accent_overrides_path: root.join("accent_overrides.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local; state is lost on exit
    #[default]
    Memory,
    /// One JSON document per record under `store.dir`
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            dir: constants::paths::STORE_DIR.into(),
        }
    }
}

/// Synthesis engine variant, chosen once at worker startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisEngineKind {
    /// Writes a quiet tone per chunk; development and tests
    #[default]
    Stub,
    /// XTTS-style HTTP sidecar
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    pub engine: SynthesisEngineKind,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub cloning_mode: String,
    pub language: String,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            engine: SynthesisEngineKind::default(),
            endpoint: constants::synthesis::HTTP_ENDPOINT.to_string(),
            timeout_secs: constants::synthesis::TIMEOUT_SECS,
            cloning_mode: constants::synthesis::CLONING_MODE.to_string(),
            language: constants::synthesis::LANGUAGE.to_string(),
        }
    }
}

/// Automatic accenter variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccenterKind {
    /// Identity: text passes through unchanged
    #[default]
    None,
    /// JSON lexicon of word -> accented form
    Dictionary,
    /// HTTP sidecar
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccenterSettings {
    pub kind: AccenterKind,
    pub dictionary_path: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub crossfade_max_ms: u32,
    pub mp3_bitrate: String,
    pub ffmpeg_bin: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: constants::audio::SAMPLE_RATE,
            crossfade_max_ms: constants::audio::CROSSFADE_MAX_MS,
            mp3_bitrate: constants::audio::MP3_BITRATE.to_string(),
            ffmpeg_bin: constants::audio::FFMPEG_BIN.to_string(),
        }
    }
}

/// Workers per queue lane
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub preview: usize,
    pub train: usize,
    pub render: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            preview: constants::workers::PREVIEW,
            train: constants::workers::TRAIN,
            render: constants::workers::RENDER,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Settings {
    /// Load from the file named by `VOICE_RENDER_CONFIG` plus environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from an optional config file plus environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        tracing::debug!(
            config = path,
            engine = ?settings.synthesis.engine,
            accenter = ?settings.accenter.kind,
            store = ?settings.store.kind,
            "Settings loaded"
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::Invalid("audio.sample_rate must be > 0".into()));
        }
        if self.workers.preview == 0 || self.workers.train == 0 || self.workers.render == 0 {
            return Err(ConfigError::Invalid(
                "every worker lane needs at least one worker".into(),
            ));
        }
        if self.synthesis.engine == SynthesisEngineKind::Http
            && self.synthesis.endpoint.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "synthesis.endpoint is required for the http engine".into(),
            ));
        }
        match self.accenter.kind {
            AccenterKind::Dictionary if self.accenter.dictionary_path.is_none() => {
                Err(ConfigError::Invalid(
                    "accenter.dictionary_path is required for the dictionary accenter".into(),
                ))
            }
            AccenterKind::Http
                if self
                    .accenter
                    .endpoint
                    .as_deref()
                    .map_or(true, |e| e.trim().is_empty()) =>
            {
                Err(ConfigError::Invalid(
                    "accenter.endpoint is required for the http accenter".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Create every data directory the workers write into
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for dir in [
            &self.paths.data_root,
            &self.paths.profiles_dir,
            &self.paths.jobs_dir,
            &self.paths.outputs_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if self.store.kind == StoreKind::File {
            std::fs::create_dir_all(&self.store.dir)?;
        }
        if let Some(parent) = self.paths.accent_overrides_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.synthesis.engine, SynthesisEngineKind::Stub);
        assert_eq!(settings.accenter.kind, AccenterKind::None);
        assert_eq!(settings.audio.crossfade_max_ms, 40);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let settings = Settings::load_from("/nonexistent/voice-render").unwrap();
        assert_eq!(settings.audio.sample_rate, constants::audio::SAMPLE_RATE);
        assert_eq!(settings.workers.render, constants::workers::RENDER);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice-render.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
log_format = "json"

[audio]
sample_rate = 48000

[workers]
render = 4

[accenter]
kind = "dictionary"
dictionary_path = "/srv/lexicon.json"
"#
        )
        .unwrap();

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.audio.sample_rate, 48000);
        assert_eq!(settings.audio.crossfade_max_ms, 40);
        assert_eq!(settings.workers.render, 4);
        assert_eq!(settings.workers.preview, constants::workers::PREVIEW);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.accenter.kind, AccenterKind::Dictionary);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.workers.render = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.accenter.kind = AccenterKind::Http;
        assert!(settings.validate().is_err());
        settings.accenter.endpoint = Some("http://localhost:9000".into());
        assert!(settings.validate().is_ok());

        let mut settings = Settings::default();
        settings.synthesis.engine = SynthesisEngineKind::Http;
        settings.synthesis.endpoint = " ".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            paths: PathSettings::under(dir.path()),
            ..Default::default()
        };
        settings.ensure_dirs().unwrap();
        assert!(dir.path().join("profiles").is_dir());
        assert!(dir.path().join("jobs").is_dir());
        assert!(dir.path().join("outputs").is_dir());
    }
}
