//! Audio buffer types
//!
//! All processing works on deinterleaved, channel-major 32-bit float samples.
//! [`Block`] is the non-owning view every effect processes in place;
//! [`AudioBuffer`] is the owning variant produced by file I/O.

use crate::error::{Result, StompboxError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -inf for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Process Spec
// ============================================================================

/// Block configuration an effect is prepared for
///
/// Produced on every `process` call from the incoming block's dimensions;
/// a change in any field triggers re-preparation of the backing effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Samples per channel in one block
    pub block_size: usize,
    /// Number of channels
    pub channels: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f64, block_size: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            block_size,
            channels,
        }
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
            channels: 2,
        }
    }
}

// ============================================================================
// Block (non-owning view)
// ============================================================================

/// Channel-major mutable view over caller-owned sample storage
///
/// Invariant: all channel slices have the same length and do not alias.
/// The view borrows; the caller allocates and frees the storage.
pub struct Block<'a> {
    channels: Vec<&'a mut [f32]>,
}

impl<'a> Block<'a> {
    /// Build a block from per-channel mutable slices
    ///
    /// All channels must have the same length.
    pub fn new(channels: Vec<&'a mut [f32]>) -> Self {
        debug_assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "block channels must have equal length"
        );
        Self { channels }
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// True when there is nothing to process
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0 || self.channels.is_empty()
    }

    /// Immutable access to one channel
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Mutable access to one channel
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut *self.channels[index]
    }

    /// Mutable access to two distinct channels at once
    ///
    /// Needed by stereo-coupled effects (reverb). Panics if `a == b`.
    pub fn channel_pair_mut(&mut self, a: usize, b: usize) -> (&mut [f32], &mut [f32]) {
        assert!(a != b, "channel_pair_mut requires distinct channels");
        if a < b {
            let (lo, hi) = self.channels.split_at_mut(b);
            (&mut *lo[a], &mut *hi[0])
        } else {
            let (lo, hi) = self.channels.split_at_mut(a);
            (&mut *hi[0], &mut *lo[b])
        }
    }
}

// ============================================================================
// Audio Buffer (owning)
// ============================================================================

/// Owning deinterleaved audio storage
///
/// Produced by `engine::io::load_audio_file` and used by the CLI. Effects
/// never process this type directly; call [`AudioBuffer::block_mut`] to get
/// the borrowed view.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl AudioBuffer {
    /// Create a silent buffer with the given dimensions
    pub fn new(channels: usize, num_samples: usize, sample_rate: f64) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; channels],
            sample_rate,
        }
    }

    /// Build a buffer from existing channel data
    ///
    /// Fails if channels have mismatched lengths.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: f64) -> Result<Self> {
        if let Some(first) = samples.first() {
            let len = first.len();
            if samples.iter().any(|ch| ch.len() != len) {
                return Err(StompboxError::InvalidAudio {
                    reason: "channel lengths differ".to_string(),
                    source: None,
                });
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// True when the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate
    }

    /// Immutable access to one channel
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable access to one channel
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Borrow the whole buffer as a processing block
    pub fn block_mut(&mut self) -> Block<'_> {
        Block::new(
            self.samples
                .iter_mut()
                .map(|ch| ch.as_mut_slice())
                .collect(),
        )
    }

    /// Check that all samples are finite (no NaN/Inf)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0206) - 0.5).abs() < 1e-4);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_linear_to_db() {
        assert!((linear_to_db(1.0) - 0.0).abs() < 1e-6);
        assert!((linear_to_db(0.5) - (-6.0206)).abs() < 1e-3);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_process_spec_equality() {
        let a = ProcessSpec::new(48000.0, 512, 2);
        let b = ProcessSpec::new(48000.0, 512, 2);
        assert_eq!(a, b);

        // Any field change makes the spec differ
        assert_ne!(a, ProcessSpec::new(44100.0, 512, 2));
        assert_ne!(a, ProcessSpec::new(48000.0, 256, 2));
        assert_ne!(a, ProcessSpec::new(48000.0, 512, 1));
    }

    #[test]
    fn test_buffer_new() {
        let buffer = AudioBuffer::new(2, 1000, 48000.0);
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.num_samples(), 1000);
        assert!(!buffer.is_empty());
        assert!((buffer.duration_secs() - 1000.0 / 48000.0).abs() < 1e-9);
    }

    #[test]
    fn test_buffer_from_channels_mismatch() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 10], vec![0.0; 20]], 44100.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_block_view() {
        let mut buffer = AudioBuffer::new(2, 100, 44100.0);
        {
            let mut block = buffer.block_mut();
            assert_eq!(block.num_channels(), 2);
            assert_eq!(block.num_samples(), 100);
            block.channel_mut(0)[10] = 0.5;
        }
        assert_eq!(buffer.samples[0][10], 0.5);
    }

    #[test]
    fn test_block_empty() {
        let mut buffer = AudioBuffer::new(1, 0, 44100.0);
        let block = buffer.block_mut();
        assert!(block.is_empty());
        assert_eq!(block.num_samples(), 0);
    }

    #[test]
    fn test_block_channel_pair() {
        let mut buffer = AudioBuffer::new(2, 4, 44100.0);
        let mut block = buffer.block_mut();
        let (left, right) = block.channel_pair_mut(0, 1);
        left[0] = 1.0;
        right[0] = -1.0;
        assert_eq!(block.channel(0)[0], 1.0);
        assert_eq!(block.channel(1)[0], -1.0);
    }

    #[test]
    fn test_buffer_is_finite() {
        let buffer = AudioBuffer::new(1, 100, 44100.0);
        assert!(buffer.is_finite());

        let mut bad = AudioBuffer::new(1, 100, 44100.0);
        bad.samples[0][0] = f32::NAN;
        assert!(!bad.is_finite());
    }
}
