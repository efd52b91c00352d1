//! In-memory mono track

/// Mono PCM samples in [-1.0, 1.0] at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioTrack {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn silence(duration_ms: u32, sample_rate: u32) -> Self {
        Self::new(vec![0.0; ms_to_samples(duration_ms, sample_rate)], sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn append_silence(&mut self, duration_ms: u32) {
        let n = ms_to_samples(duration_ms, self.sample_rate);
        self.samples.resize(self.samples.len() + n, 0.0);
    }

    /// Append `other`, overlapping the last `crossfade` samples
    ///
    /// The overlap is a linear fade-out of this track mixed with a linear
    /// fade-in of `other`. `crossfade` is clamped to both lengths.
    pub fn append_crossfaded(&mut self, other: &[f32], crossfade: usize) {
        let n = crossfade.min(other.len()).min(self.samples.len());
        let start = self.samples.len() - n;
        for (i, incoming) in other[..n].iter().enumerate() {
            let gain = (i + 1) as f32 / (n + 1) as f32;
            let existing = &mut self.samples[start + i];
            *existing = *existing * (1.0 - gain) + incoming * gain;
        }
        self.samples.extend_from_slice(&other[n..]);
    }
}

/// Sample count for a duration, rounded down
pub fn ms_to_samples(duration_ms: u32, sample_rate: u32) -> usize {
    (duration_ms as u64 * sample_rate as u64 / 1000) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length() {
        assert_eq!(AudioTrack::silence(1, 24_000).len(), 24);
        assert_eq!(AudioTrack::silence(260, 24_000).len(), 6_240);
        assert_eq!(ms_to_samples(40, 44_100), 1_764);
    }

    #[test]
    fn test_crossfade_overlaps_tail() {
        let mut track = AudioTrack::new(vec![1.0; 10], 1_000);
        track.append_crossfaded(&[0.0; 6], 4);
        assert_eq!(track.len(), 12);
        // fade-out of the original tail
        assert!(track.samples()[6] < 1.0);
        assert!(track.samples()[6] > track.samples()[9]);
        assert_eq!(track.samples()[5], 1.0);
        assert_eq!(track.samples()[11], 0.0);
    }

    #[test]
    fn test_crossfade_clamped_to_lengths() {
        let mut track = AudioTrack::new(vec![0.5; 2], 1_000);
        track.append_crossfaded(&[0.5], 40);
        assert_eq!(track.len(), 2);

        let mut empty = AudioTrack::new(Vec::new(), 1_000);
        empty.append_crossfaded(&[0.1, 0.2], 40);
        assert_eq!(empty.samples(), &[0.1, 0.2]);
    }

    #[test]
    fn test_append_silence() {
        let mut track = AudioTrack::new(vec![0.3], 8_000);
        track.append_silence(10);
        assert_eq!(track.len(), 81);
        assert!((track.duration_secs() - 81.0 / 8_000.0).abs() < 1e-9);
    }
}
