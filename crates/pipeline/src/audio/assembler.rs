//! Chunk assembly and delivery format conversion

use std::path::{Path, PathBuf};
use tokio::process::Command;
use voice_render_config::{constants, AudioSettings};
use voice_render_core::{OutputFormat, TextMode};

use super::track::{ms_to_samples, AudioTrack};
use super::wav::{load_wav, write_wav};
use crate::PipelineError;

/// One element of the assembly sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyItem {
    /// Synthesized chunk on disk
    Chunk(PathBuf),
    StanzaBreak,
}

/// Silence inserted after each chunk and at stanza breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pauses {
    pub line_ms: u32,
    pub stanza_ms: u32,
}

impl Pauses {
    pub fn for_mode(mode: TextMode) -> Self {
        match mode {
            TextMode::Story => Self {
                line_ms: constants::pauses::STORY_LINE_MS,
                stanza_ms: constants::pauses::STORY_STANZA_MS,
            },
            TextMode::Poem => Self {
                line_ms: constants::pauses::POEM_LINE_MS,
                stanza_ms: constants::pauses::POEM_STANZA_MS,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub sample_rate: u32,
    pub crossfade_max_ms: u32,
    pub seed_silence_ms: u32,
    pub mp3_bitrate: String,
    pub ffmpeg_bin: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::from(&AudioSettings::default())
    }
}

impl From<&AudioSettings> for AssemblerConfig {
    fn from(settings: &AudioSettings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            crossfade_max_ms: settings.crossfade_max_ms,
            seed_silence_ms: constants::audio::SEED_SILENCE_MS,
            mp3_bitrate: settings.mp3_bitrate.clone(),
            ffmpeg_bin: settings.ffmpeg_bin.clone(),
        }
    }
}

/// Crossfade length in samples: never longer than the cap or either side
pub fn crossfade_len(max_samples: usize, chunk_len: usize, accumulated_len: usize) -> usize {
    max_samples.min(chunk_len).min(accumulated_len)
}

/// Merges synthesized chunks into one deliverable file
#[derive(Debug, Clone)]
pub struct AudioAssembler {
    config: AssemblerConfig,
}

impl AudioAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Merge the sequence in memory
    pub fn merge(&self, items: &[AssemblyItem], pauses: Pauses) -> Result<AudioTrack, PipelineError> {
        let rate = self.config.sample_rate;
        let max_crossfade = ms_to_samples(self.config.crossfade_max_ms, rate);
        let mut track = AudioTrack::silence(self.config.seed_silence_ms, rate);

        for item in items {
            match item {
                AssemblyItem::StanzaBreak => track.append_silence(pauses.stanza_ms),
                AssemblyItem::Chunk(path) => {
                    let chunk = load_wav(path, rate)?;
                    let crossfade = crossfade_len(max_crossfade, chunk.len(), track.len());
                    track.append_crossfaded(chunk.samples(), crossfade);
                    track.append_silence(pauses.line_ms);
                }
            }
        }
        Ok(track)
    }

    /// Merge `items` and write the track to `output` as WAV
    ///
    /// Compressed deliverables go through [`transcode_if_needed`](Self::transcode_if_needed)
    /// afterwards; the intermediate WAV stays with the caller.
    pub async fn assemble(
        &self,
        items: &[AssemblyItem],
        output: &Path,
        pauses: Pauses,
    ) -> Result<PathBuf, PipelineError> {
        match OutputFormat::from_path(output) {
            Some(format) if format.is_waveform() => {}
            _ => {
                return Err(PipelineError::Audio(format!(
                    "assembly writes WAV only, got {}",
                    output.display()
                )))
            }
        }
        let wav_path = output.to_path_buf();

        let assembler = self.clone();
        let owned_items = items.to_vec();
        let target = wav_path.clone();
        let duration = tokio::task::spawn_blocking(move || -> Result<f64, PipelineError> {
            let track = assembler.merge(&owned_items, pauses)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_wav(&track, &target)?;
            Ok(track.duration_secs())
        })
        .await
        .map_err(|e| PipelineError::Audio(format!("assembly task failed: {}", e)))??;

        tracing::debug!(
            output = %output.display(),
            items = items.len(),
            duration_secs = duration,
            "Audio assembled"
        );

        Ok(wav_path)
    }

    /// Convert `wav_path` to the format implied by `final_path`
    ///
    /// Waveform targets return `wav_path` unchanged. The caller removes the
    /// intermediate WAV after a successful transcode.
    pub async fn transcode_if_needed(
        &self,
        wav_path: &Path,
        final_path: &Path,
    ) -> Result<PathBuf, PipelineError> {
        match OutputFormat::from_path(final_path) {
            Some(format) if format.is_waveform() => Ok(wav_path.to_path_buf()),
            Some(OutputFormat::Mp3) => {
                self.run_ffmpeg(wav_path, final_path).await?;
                Ok(final_path.to_path_buf())
            }
            _ => Err(PipelineError::Transcode(format!(
                "no transcoder for {}",
                final_path.display()
            ))),
        }
    }

    async fn run_ffmpeg(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let result = Command::new(&self.config.ffmpeg_bin)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-codec:a", "libmp3lame", "-b:a"])
            .arg(&self.config.mp3_bitrate)
            .arg(output)
            .output()
            .await
            .map_err(|e| {
                PipelineError::Transcode(format!("failed to run {}: {}", self.config.ffmpeg_bin, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" | ");
            return Err(PipelineError::Transcode(format!(
                "{} exited with {}: {}",
                self.config.ffmpeg_bin, result.status, tail
            )));
        }

        tracing::debug!(input = %input.display(), output = %output.display(), "Transcoded to mp3");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1_000;

    fn assembler() -> AudioAssembler {
        AudioAssembler::new(AssemblerConfig {
            sample_rate: RATE,
            crossfade_max_ms: 40,
            seed_silence_ms: 1,
            mp3_bitrate: "192k".into(),
            ffmpeg_bin: "ffmpeg-not-installed-here".into(),
        })
    }

    fn chunk(dir: &Path, name: &str, len: usize) -> AssemblyItem {
        let path = dir.join(name);
        write_wav(&AudioTrack::new(vec![0.25; len], RATE), &path).unwrap();
        AssemblyItem::Chunk(path)
    }

    #[test]
    fn test_crossfade_len_bounds() {
        assert_eq!(crossfade_len(960, 10_000, 50_000), 960);
        assert_eq!(crossfade_len(960, 1, 50_000), 1);
        assert_eq!(crossfade_len(960, 10_000, 24), 24);
        assert_eq!(crossfade_len(960, 0, 24), 0);
    }

    #[test]
    fn test_pause_presets() {
        assert_eq!(Pauses::for_mode(TextMode::Story), Pauses { line_ms: 260, stanza_ms: 550 });
        assert_eq!(Pauses::for_mode(TextMode::Poem), Pauses { line_ms: 350, stanza_ms: 900 });
    }

    #[test]
    fn test_merge_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            chunk(dir.path(), "a.wav", 100),
            AssemblyItem::StanzaBreak,
            chunk(dir.path(), "b.wav", 200),
        ];
        let pauses = Pauses { line_ms: 10, stanza_ms: 50 };
        let track = assembler().merge(&items, pauses).unwrap();

        // seed 1, chunk a crossfades 1 sample into the seed, pause 10,
        // stanza 50, chunk b crossfades 40, pause 10
        let expected = 1 + (100 - 1) + 10 + 50 + (200 - 40) + 10;
        assert_eq!(track.len(), expected);
    }

    #[test]
    fn test_one_sample_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![chunk(dir.path(), "tiny.wav", 1), chunk(dir.path(), "tiny2.wav", 1)];
        let track = assembler()
            .merge(&items, Pauses { line_ms: 0, stanza_ms: 0 })
            .unwrap();
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn test_leading_stanza_break() {
        let items = vec![AssemblyItem::StanzaBreak];
        let track = assembler()
            .merge(&items, Pauses { line_ms: 10, stanza_ms: 20 })
            .unwrap();
        assert_eq!(track.len(), 21);
    }

    #[tokio::test]
    async fn test_assemble_wav_output() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![chunk(dir.path(), "a.wav", 100)];
        let output = dir.path().join("out").join("job.wav");
        let path = assembler()
            .assemble(&items, &output, Pauses::for_mode(TextMode::Story))
            .await
            .unwrap();
        assert_eq!(path, output);
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().channels, 1);
    }

    #[tokio::test]
    async fn test_missing_chunk_fails() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![AssemblyItem::Chunk(dir.path().join("missing.wav"))];
        let result = assembler()
            .assemble(&items, &dir.path().join("out.wav"), Pauses::for_mode(TextMode::Story))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_transcode_wav_is_noop() {
        let wav = Path::new("/tmp/a.wav");
        let out = assembler()
            .transcode_if_needed(wav, Path::new("/tmp/final.wav"))
            .await
            .unwrap();
        assert_eq!(out, wav);
    }

    #[tokio::test]
    async fn test_transcode_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("a.wav");
        write_wav(&AudioTrack::silence(10, RATE), &wav).unwrap();
        let err = assembler()
            .transcode_if_needed(&wav, &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Transcode(_)));
    }

    #[tokio::test]
    async fn test_unknown_extension_rejected() {
        let err = assembler()
            .assemble(&[], Path::new("/tmp/out.ogg"), Pauses::for_mode(TextMode::Story))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Audio(_)));
    }

    #[tokio::test]
    async fn test_compressed_target_left_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![chunk(dir.path(), "a.wav", 100)];
        let mp3 = dir.path().join("job.mp3");
        let err = assembler()
            .assemble(&items, &mp3, Pauses::for_mode(TextMode::Story))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Audio(_)));
        assert!(!mp3.exists());

        // the intermediate WAV survives a failed transcode
        let wav = dir.path().join("job.wav");
        assembler()
            .assemble(&items, &wav, Pauses::for_mode(TextMode::Story))
            .await
            .unwrap();
        assert!(assembler().transcode_if_needed(&wav, &mp3).await.is_err());
        assert!(wav.exists());
    }
}
