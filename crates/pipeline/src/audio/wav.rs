//! WAV decoding and 16-bit export

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

use super::resample::resample;
use super::track::AudioTrack;
use crate::PipelineError;

/// Decode a WAV file to a mono track at `target_rate`
///
/// Integer (8/16/24/32-bit) and 32-bit float files are accepted; multichannel
/// audio is averaged down to mono.
pub fn load_wav(path: impl AsRef<Path>, target_rate: u32) -> Result<AudioTrack, PipelineError> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(PipelineError::Audio(format!(
                    "unsupported bit depth {} in {}",
                    spec.bits_per_sample,
                    path.display()
                )));
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = downmix(interleaved, spec.channels);
    let samples = if spec.sample_rate == target_rate {
        mono
    } else {
        tracing::trace!(
            path = %path.display(),
            from = spec.sample_rate,
            to = target_rate,
            "Resampling chunk"
        );
        resample(&mono, spec.sample_rate, target_rate)?
    };
    Ok(AudioTrack::new(samples, target_rate))
}

fn downmix(interleaved: Vec<f32>, channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Write a track as 16-bit mono PCM
pub fn write_wav(track: &AudioTrack, path: impl AsRef<Path>) -> Result<(), PipelineError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: track.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &sample in track.samples() {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
