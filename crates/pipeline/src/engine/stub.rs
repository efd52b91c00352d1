//! Placeholder engine for development and tests

use voice_render_core::SynthesisRequest;

use crate::audio::{write_wav, AudioTrack};
use crate::PipelineError;

/// Audio per input character at speed 1.0
const MS_PER_CHAR: f32 = 60.0;
const MIN_MS: f32 = 200.0;
const TONE_HZ: f32 = 220.0;
const AMPLITUDE: f32 = 0.05;

/// Writes a quiet tone whose length follows the text length and speed
pub struct StubEngine {
    sample_rate: u32,
}

impl StubEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn duration_ms(text: &str, speed: f32) -> u32 {
        let chars = text.chars().count() as f32;
        let speed = if speed > 0.0 { speed } else { 1.0 };
        ((chars * MS_PER_CHAR).max(MIN_MS) / speed) as u32
    }

    pub(crate) async fn render(&self, request: SynthesisRequest<'_>) -> Result<(), PipelineError> {
        let duration_ms = Self::duration_ms(request.text, request.speed);
        let n = (duration_ms as u64 * self.sample_rate as u64 / 1000) as usize;
        let rate = self.sample_rate as f32;
        let samples = (0..n)
            .map(|i| AMPLITUDE * (2.0 * std::f32::consts::PI * TONE_HZ * i as f32 / rate).sin())
            .collect();

        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_wav(&AudioTrack::new(samples, self.sample_rate), request.output_path)?;
        tracing::trace!(
            output = %request.output_path.display(),
            duration_ms,
            references = request.references.len(),
            "Stub chunk written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_duration_scales_with_text_and_speed() {
        let short = StubEngine::duration_ms("да", 1.0);
        let long = StubEngine::duration_ms("это очень длинное предложение", 1.0);
        assert_eq!(short, 200);
        assert!(long > short);
        assert!(StubEngine::duration_ms("это очень длинное предложение", 1.5) < long);
    }

    #[tokio::test]
    async fn test_render_writes_wav() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job").join("chunk_1.wav");
        let references = vec![PathBuf::from("/refs/a.wav")];
        StubEngine::new(24_000)
            .render(SynthesisRequest {
                text: "Привет.",
                output_path: &output,
                speed: 1.0,
                references: &references,
                language: "ru",
            })
            .await
            .unwrap();

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.len(), 24_000 * 420 / 1000);
    }
}
