//! XTTS-style HTTP sidecar engine
//!
//! API format:
//! POST {endpoint}/synthesize
//! { "text": "...", "output_path": "...", "speed": 1.0,
//!   "speaker_wav": ["..."], "language": "ru" }
//!
//! The sidecar either writes `output_path` itself or answers with the WAV
//! bytes, which are then written locally.

use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use voice_render_config::constants;
use voice_render_core::SynthesisRequest;

use crate::PipelineError;

#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// Base URL (http://host:port)
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::synthesis::HTTP_ENDPOINT.to_string(),
            timeout: Duration::from_secs(constants::synthesis::TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
    output_path: &'a Path,
    speed: f32,
    speaker_wav: &'a [std::path::PathBuf],
    language: &'a str,
}

pub struct HttpEngine {
    config: HttpEngineConfig,
    client: reqwest::Client,
}

impl HttpEngine {
    pub fn new(config: HttpEngineConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::Synthesis(format!("failed to build client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!("{}/synthesize", self.config.endpoint.trim_end_matches('/'))
    }

    pub(crate) async fn render(&self, request: SynthesisRequest<'_>) -> Result<(), PipelineError> {
        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // a leftover file from an earlier delivery must not pass for fresh output
        match tokio::fs::remove_file(request.output_path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let body = SynthesizeBody {
            text: request.text,
            output_path: request.output_path,
            speed: request.speed,
            speaker_wav: request.references,
            language: request.language,
        };

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Synthesis(format!("synthesis request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Synthesis(format!(
                "synthesis service returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Synthesis(format!("synthesis response failed: {}", e)))?;

        store_response(request.output_path, &bytes).await
    }
}

/// Write the returned audio; an empty body means the sidecar wrote the file itself
async fn store_response(output_path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    if !bytes.is_empty() {
        tokio::fs::write(output_path, bytes).await?;
        return Ok(());
    }
    if tokio::fs::try_exists(output_path).await? {
        return Ok(());
    }
    Err(PipelineError::Synthesis(format!(
        "synthesis service produced no audio for {}",
        output_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_endpoint() {
        let engine = HttpEngine::new(HttpEngineConfig {
            endpoint: "http://tts:8020/".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(engine.url(), "http://tts:8020/synthesize");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chunk_1.wav");
        let engine = HttpEngine::new(HttpEngineConfig {
            endpoint: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        let err = engine
            .render(SynthesisRequest {
                text: "текст",
                output_path: &output,
                speed: 1.0,
                references: &[],
                language: "ru",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_response_bytes_replace_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chunk_1.wav");
        std::fs::write(&output, b"stale").unwrap();

        store_response(&output, b"fresh").await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_empty_body_needs_sidecar_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chunk_1.wav");
        let err = store_response(&output, b"").await.unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));

        std::fs::write(&output, b"written by sidecar").unwrap();
        store_response(&output, b"").await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"written by sidecar");
    }
}
