//! Sample rate conversion for audio streams
//!
//! Wraps a rubato FFT resampler so a stream can be fed in arbitrary pieces.
//! Input that doesn't fill a whole chunk is held until the next push, so
//! filter state carries across poll boundaries.

use rubato::{FftFixedIn, Resampler};

use crate::{Error, Result};

/// Input frames per resampler chunk
const CHUNK_SIZE: usize = 1024;

/// FFT sub-chunks per chunk
const SUB_CHUNKS: usize = 2;

/// Stateful mono resampler; a passthrough when the rates match
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
    from_rate: u32,
    to_rate: u32,
}

impl StreamResampler {
    /// # Errors
    ///
    /// Returns error if rubato rejects the rate pair
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self> {
        let inner = if from_rate == to_rate {
            None
        } else {
            let resampler = FftFixedIn::<f32>::new(
                from_rate as usize,
                to_rate as usize,
                CHUNK_SIZE,
                SUB_CHUNKS,
                1,
            )
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;
            Some(resampler)
        };

        Ok(Self {
            inner,
            pending: Vec::new(),
            from_rate,
            to_rate,
        })
    }

    /// Whether samples pass through unchanged
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        self.inner.is_none()
    }

    /// Feed samples, returning every output frame that is ready
    ///
    /// # Errors
    ///
    /// Returns error if rubato fails on a chunk
    pub fn push(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(samples.to_vec());
        };

        self.pending.extend_from_slice(samples);

        let mut output = Vec::new();
        let mut consumed = 0;
        while self.pending.len() - consumed >= resampler.input_frames_next() {
            let needed = resampler.input_frames_next();
            let chunk = &self.pending[consumed..consumed + needed];
            let result = resampler
                .process(&[chunk], None)
                .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
            output.extend_from_slice(&result[0]);
            consumed += needed;
        }
        self.pending.drain(..consumed);

        Ok(output)
    }

    /// Resample a complete clip in one go
    ///
    /// The filter delay is trimmed and the tail flushed, so the output
    /// lines up with the input and has the converted length.
    ///
    /// # Errors
    ///
    /// Returns error if rubato fails
    pub fn convert(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
        let mut stream = Self::new(from_rate, to_rate)?;
        let Some(delay) = stream.inner.as_ref().map(|r| r.output_delay()) else {
            return Ok(samples.to_vec());
        };

        let mut output = stream.push(samples)?;
        let expected = stream.output_len(samples.len());

        // Zero-pad until the delayed tail has come out
        while output.len() < expected + delay {
            let Some(resampler) = stream.inner.as_mut() else {
                break;
            };
            let tail = std::mem::take(&mut stream.pending);
            let wave_in: &[&[f32]] = &[tail.as_slice()];
            let result = resampler
                .process_partial(Some(wave_in), None)
                .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
            if result[0].is_empty() {
                break;
            }
            output.extend_from_slice(&result[0]);
        }

        output.drain(..delay.min(output.len()));
        output.truncate(expected);
        Ok(output)
    }

    /// Drop held input and filter state (e.g. after a buffer clear)
    pub fn reset(&mut self) {
        self.pending.clear();
        if let Some(resampler) = self.inner.as_mut() {
            resampler.reset();
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn output_len(&self, input_len: usize) -> usize {
        (input_len as f64 * f64::from(self.to_rate) / f64::from(self.from_rate)).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, secs: f32) -> Vec<f32> {
        let n = (rate as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn matching_rates_pass_through() {
        let mut stream = StreamResampler::new(16000, 16000).unwrap();
        assert!(stream.is_passthrough());
        assert_eq!(stream.push(&[0.1, 0.2]).unwrap(), vec![0.1, 0.2]);
    }

    #[test]
    fn uneven_pieces_match_a_single_push() {
        let input = sine(48000, 0.5);

        let mut whole = StreamResampler::new(48000, 16000).unwrap();
        let expected = whole.push(&input).unwrap();

        // Poll-sized pieces that never line up with the chunk size
        let mut pieced = StreamResampler::new(48000, 16000).unwrap();
        let mut actual = Vec::new();
        for piece in input.chunks(4410) {
            actual.extend(pieced.push(piece).unwrap());
        }

        assert_eq!(actual.len(), expected.len());
        assert!(
            actual
                .iter()
                .zip(&expected)
                .all(|(a, b)| (a - b).abs() < 1e-6)
        );
    }

    #[test]
    fn short_push_is_held_for_the_next() {
        let mut stream = StreamResampler::new(44100, 16000).unwrap();
        assert!(stream.push(&[0.0; 100]).unwrap().is_empty());
        assert!(!stream.push(&[0.0; CHUNK_SIZE]).unwrap().is_empty());
    }

    #[test]
    fn clip_conversion_has_converted_length() {
        let input = sine(22050, 0.3);
        let out = StreamResampler::convert(&input, 22050, 48000).unwrap();
        let expected = (input.len() as f64 * 48000.0 / 22050.0).round() as usize;
        assert_eq!(out.len(), expected);

        // Level survives conversion
        let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.4 && peak < 0.6);
    }
}
