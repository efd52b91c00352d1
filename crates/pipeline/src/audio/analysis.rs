//! Reference sample analysis
//!
//! Coarse descriptors recorded on voice profiles: mean absolute energy, a
//! dominant-frequency pitch hint and the duration.

use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::track::AudioTrack;
use super::wav::load_wav;
use crate::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleAnalysis {
    /// Mean absolute amplitude (0.0..=1.0)
    pub energy: f32,
    /// Index of the strongest FFT bin over the first second, divided by the
    /// bin count (0.0..1.0)
    pub pitch_hint: f32,
    pub duration_sec: f64,
}

pub fn analyze(track: &AudioTrack) -> Result<SampleAnalysis, PipelineError> {
    let samples = track.samples();
    if samples.is_empty() {
        return Ok(SampleAnalysis::default());
    }

    let energy = samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32;

    let window = samples.len().min(track.sample_rate().max(1) as usize);
    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(window);
    let mut input = fft.make_input_vec();
    input.copy_from_slice(&samples[..window]);
    let mut spectrum = fft.make_output_vec();
    fft.process(&mut input, &mut spectrum)
        .map_err(|e| PipelineError::Audio(format!("fft failed: {}", e)))?;

    let peak = spectrum
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .map_or(0, |(i, _)| i);
    let pitch_hint = peak as f32 / spectrum.len().max(1) as f32;

    Ok(SampleAnalysis {
        energy,
        pitch_hint,
        duration_sec: track.duration_secs(),
    })
}

/// Decode and analyze a sample file at `sample_rate`
pub fn analyze_file(path: impl AsRef<Path>, sample_rate: u32) -> Result<SampleAnalysis, PipelineError> {
    analyze(&load_wav(path, sample_rate)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, secs: f32, amp: f32) -> AudioTrack {
        let n = (rate as f32 * secs) as usize;
        let samples = (0..n)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect();
        AudioTrack::new(samples, rate)
    }

    #[test]
    fn test_empty_track() {
        let analysis = analyze(&AudioTrack::new(Vec::new(), 24_000)).unwrap();
        assert_eq!(analysis, SampleAnalysis::default());
    }

    #[test]
    fn test_pitch_hint_tracks_frequency() {
        let low = analyze(&sine(200.0, 8_000, 1.0, 0.5)).unwrap();
        let high = analyze(&sine(2_000.0, 8_000, 1.0, 0.5)).unwrap();
        assert!(high.pitch_hint > low.pitch_hint);
        // 1 Hz bins over one second: 200 / 4001
        assert!((low.pitch_hint - 200.0 / 4_001.0).abs() < 1e-3);
    }

    #[test]
    fn test_energy_and_duration() {
        let analysis = analyze(&sine(440.0, 8_000, 2.0, 0.5)).unwrap();
        // mean |sin| = 2/pi
        assert!((analysis.energy - 0.5 * 2.0 / std::f32::consts::PI).abs() < 0.01);
        assert!((analysis.duration_sec - 2.0).abs() < 1e-6);
    }
}
