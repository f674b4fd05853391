//! PCM helpers shared by the capture backends

/// Mix interleaved multi-channel samples down to mono by summing channels.
///
/// No division, to preserve volume; the sum is clamped to the i16 range.
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        })
        .collect()
}

/// Downsample by decimation (take every Nth sample).
///
/// Only integer ratios are supported; returns the samples unchanged with the
/// source rate when the source is not at least twice the target rate.
pub fn decimate(samples: &[i16], source_rate: u32, target_rate: u32) -> (Vec<i16>, u32) {
    if target_rate == 0 || source_rate <= target_rate {
        return (samples.to_vec(), source_rate);
    }

    let ratio = source_rate / target_rate;
    if ratio <= 1 {
        return (samples.to_vec(), source_rate);
    }

    let decimated = samples.iter().step_by(ratio as usize).copied().collect();
    (decimated, source_rate / ratio)
}

pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Little-endian byte encoding of 16-bit samples
pub fn to_pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Number of samples covering `chunk_ms` at `sample_rate` (at least one)
pub fn samples_per_chunk(sample_rate: u32, chunk_ms: u64) -> usize {
    ((sample_rate as u64 * chunk_ms) / 1000).max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(2.5), i16::MAX);
        assert_eq!(f32_to_i16(-4.0), -i16::MAX);
    }

    #[test]
    fn test_downmix_drops_partial_frame() {
        assert_eq!(downmix_to_mono(&[1, 1, 1, 1, 9], 2), vec![2, 2]);
    }
}
