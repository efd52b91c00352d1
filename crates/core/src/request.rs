//! Typed views over a job's input parameters
//!
//! Jobs store their parameters as an opaque map. Workers parse that map into
//! one of these structs when they pick the job up; a map that does not parse
//! is an input error and fails the job before any synthesis.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};
use crate::job::Params;

pub const DEFAULT_LANGUAGE: &str = "ru";
pub const DEFAULT_PREVIEW_TEXT: &str = "Привет! Это тест вашего голоса.";
pub const DEFAULT_PROFILE_NAME: &str = "default-profile";
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 1.5;

/// How the submitted text is split into utterances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    /// Sentence chunks
    #[default]
    Story,
    /// One chunk per line, blank lines become stanza breaks
    Poem,
}

/// Deliverable audio container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Mp3,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Mp3 => "mp3",
        }
    }

    /// Uncompressed waveform formats need no transcode
    pub fn is_waveform(&self) -> bool {
        matches!(self, OutputFormat::Wav)
    }

    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "wav" | "wave" => Some(OutputFormat::Wav),
            "mp3" => Some(OutputFormat::Mp3),
            _ => None,
        }
    }
}

/// Accent resolution strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentMode {
    None,
    OverridesOnly,
    #[default]
    AutoPlusOverrides,
}

/// Backend-specific encoding of stress marks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressFormat {
    #[default]
    None,
    Plus,
    PlusAndAcute,
}

fn default_true() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_preview_text() -> String {
    DEFAULT_PREVIEW_TEXT.to_string()
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE_NAME.to_string()
}

/// Voice ids name directories under the data root
pub fn check_voice_id(voice_id: &str) -> Result<()> {
    let safe = !voice_id.is_empty()
        && voice_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        Ok(())
    } else {
        Err(Error::Input(format!("invalid voice id '{}'", voice_id)))
    }
}

fn parse<T: DeserializeOwned>(what: &str, params: &Params) -> Result<T> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| Error::Input(format!("invalid {} parameters: {}", what, e)))
}

/// Full text-to-speech render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub voice_id: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub mode: TextMode,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_true")]
    pub use_accenting: bool,
    #[serde(default = "default_true")]
    pub use_user_overrides: bool,
    #[serde(default)]
    pub accent_mode: AccentMode,
    #[serde(default)]
    pub stress_format: StressFormat,
    #[serde(default = "default_language")]
    pub language: String,
}

impl TtsRequest {
    pub fn from_params(params: &Params) -> Result<Self> {
        let request: Self = parse("tts", params)?;
        check_voice_id(&request.voice_id)?;
        if request.text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        if !(MIN_SPEED..=MAX_SPEED).contains(&request.speed) {
            return Err(Error::Input(format!(
                "speed {} outside {}..={}",
                request.speed, MIN_SPEED, MAX_SPEED
            )));
        }
        Ok(request)
    }
}

/// Short single-chunk preview of a voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub voice_id: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default = "default_preview_text")]
    pub text: String,
    #[serde(default = "default_true")]
    pub use_accenting: bool,
    #[serde(default = "default_true")]
    pub use_user_overrides: bool,
    #[serde(default)]
    pub accent_mode: AccentMode,
    #[serde(default = "default_language")]
    pub language: String,
}

impl PreviewRequest {
    pub fn from_params(params: &Params) -> Result<Self> {
        let request: Self = parse("preview", params)?;
        check_voice_id(&request.voice_id)?;
        if request.text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        Ok(request)
    }
}

/// Build a reference-cache profile from a voice's samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRequest {
    pub voice_id: String,
    #[serde(default = "default_profile_name")]
    pub profile_name: String,
}

impl TrainRequest {
    pub fn from_params(params: &Params) -> Result<Self> {
        let request: Self = parse("train", params)?;
        check_voice_id(&request.voice_id)?;
        Ok(request)
    }
}
