//! Sample-rate conversion

use rubato::{FftFixedIn, Resampler};

use crate::PipelineError;

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample mono PCM from `from` Hz to `to` Hz
///
/// Output length is `ceil(len * to / from)`; the resampler's delay is
/// trimmed so the output lines up with the input.
pub fn resample(input: &[f32], from: u32, to: u32) -> Result<Vec<f32>, PipelineError> {
    if from == to || input.is_empty() {
        return Ok(input.to_vec());
    }
    if from == 0 || to == 0 {
        return Err(PipelineError::Resample(format!("invalid rates {} -> {}", from, to)));
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, CHUNK, SUB_CHUNKS, 1)
        .map_err(|e| PipelineError::Resample(e.to_string()))?;

    let expected = (input.len() as u64 * to as u64).div_ceil(from as u64) as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + CHUNK);

    // Zero padding past the end flushes the resampler's delay line
    let mut pos = 0;
    while out.len() < expected + delay {
        let mut block = vec![0.0f32; resampler.input_frames_next()];
        if pos < input.len() {
            let end = (pos + block.len()).min(input.len());
            block[..end - pos].copy_from_slice(&input[pos..end]);
        }
        pos += block.len();

        let frames = resampler
            .process(&[block], None)
            .map_err(|e| PipelineError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay);
    out.truncate(expected);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_passthrough() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&input, 24_000, 24_000).unwrap(), input);
    }

    #[test]
    fn test_downsample_length() {
        let input = vec![0.0; 4_410];
        let out = resample(&input, 44_100, 24_000).unwrap();
        assert_eq!(out.len(), 2_400);
    }

    #[test]
    fn test_upsample_preserves_dc_level() {
        let input = vec![0.5; 16_000];
        let out = resample(&input, 16_000, 24_000).unwrap();
        assert_eq!(out.len(), 24_000);
        // away from the edges a constant signal stays constant
        let mid = out[12_000];
        assert!((mid - 0.5).abs() < 0.01, "mid sample {}", mid);
    }

    #[test]
    fn test_tiny_input() {
        let out = resample(&[0.2], 48_000, 24_000).unwrap();
        assert_eq!(out.len(), 1);
    }
}
