//! Gain Effect
//!
//! Scales every sample by a smoothed gain coefficient. Gain changes glide
//! toward the target over ~50 ms to avoid discontinuities, as an explicit
//! per-sample interpolation step rather than a side effect of the setter.

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Ramp duration for gain changes
const RAMP_MS: f32 = 50.0;

/// Parameter table: 0 = gain, linear [0, 2] (normalized 0.5 is unity)
static PARAMS: &[ParamSpec] = &[ParamSpec::new("gain", ParamRange::linear(0.0, 2.0))];

/// Smoothed gain effect
pub struct Gain {
    values: Vec<f32>,
    /// Gain currently applied to samples
    current: f32,
    /// Gain the ramp is heading toward
    target: f32,
    /// Per-sample ramp increment
    step: f32,
    /// Samples left before `current` reaches `target`
    ramp_remaining: usize,
    sample_rate: f64,
}

impl Gain {
    pub fn new() -> Self {
        Self {
            values: vec![0.5],
            current: 1.0,
            target: 1.0,
            step: 0.0,
            ramp_remaining: 0,
            sample_rate: 44100.0,
        }
    }

    fn apply_param(&mut self, index: usize) {
        if index == 0 {
            self.target = PARAMS[0].range.to_physical(self.values[0]);
            self.restart_ramp();
        }
    }

    fn restart_ramp(&mut self) {
        let ramp_samples = ((RAMP_MS / 1000.0) * self.sample_rate as f32).max(1.0) as usize;
        self.ramp_remaining = ramp_samples;
        self.step = (self.target - self.current) / ramp_samples as f32;
    }

    /// Advance the ramp by one sample and return the gain to apply
    #[inline]
    fn next_gain(&mut self) -> f32 {
        if self.ramp_remaining > 0 {
            self.current += self.step;
            self.ramp_remaining -= 1;
            if self.ramp_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Gain {
    impl_effect_params!("Gain", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        if self.ramp_remaining > 0 {
            self.restart_ramp();
        }
    }

    fn reset(&mut self) {
        // Snap to the target so the next block starts settled
        self.current = self.target;
        self.ramp_remaining = 0;
        self.step = 0.0;
    }

    fn process(&mut self, block: &mut Block) {
        if block.is_empty() {
            return;
        }

        let num_channels = block.num_channels();
        for i in 0..block.num_samples() {
            let gain = self.next_gain();
            for ch in 0..num_channels {
                block.channel_mut(ch)[i] *= gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;

    fn spec() -> ProcessSpec {
        ProcessSpec::new(48000.0, 512, 1)
    }

    #[test]
    fn test_gain_param_contract() {
        let gain = Gain::new();
        assert_eq!(gain.name(), "Gain");
        assert_eq!(gain.param_count(), 1);
        assert_eq!(gain.get_param(0), 0.5);
    }

    #[test]
    fn test_gain_set_get_roundtrip() {
        let mut gain = Gain::new();
        gain.set_param(0, 0.75);
        assert!((gain.get_param(0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_gain_unknown_index() {
        let mut gain = Gain::new();
        gain.set_param(5, 0.9);
        assert_eq!(gain.get_param(5), 0.0);
        assert_eq!(gain.get_param(0), 0.5);
    }

    #[test]
    fn test_gain_unity_identity() {
        let mut gain = Gain::new();
        gain.prepare(&spec());

        // Default (normalized 0.5) maps to unity and starts settled
        let mut buffer = AudioBuffer::new(1, 100, 48000.0);
        buffer.samples[0].fill(0.25);
        gain.process(&mut buffer.block_mut());

        for &s in &buffer.samples[0] {
            assert!((s - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_gain_ramp_settles() {
        let mut gain = Gain::new();
        gain.prepare(&spec());
        gain.set_param(0, 0.0); // target 0.0

        // 50 ms at 48 kHz is 2400 samples; process past that
        let mut buffer = AudioBuffer::new(1, 4800, 48000.0);
        buffer.samples[0].fill(1.0);
        gain.process(&mut buffer.block_mut());

        // Early samples still carry signal, late samples are silent
        assert!(buffer.samples[0][0].abs() > 0.9);
        assert!(buffer.samples[0][4799].abs() < 1e-6);
    }

    #[test]
    fn test_gain_ramp_is_gradual() {
        let mut gain = Gain::new();
        gain.prepare(&spec());
        gain.set_param(0, 1.0); // target 2.0

        let mut buffer = AudioBuffer::new(1, 2400, 48000.0);
        buffer.samples[0].fill(1.0);
        gain.process(&mut buffer.block_mut());

        // Monotonically increasing toward 2.0, no jump on sample 0
        assert!(buffer.samples[0][0] < 1.1);
        assert!(buffer.samples[0][1200] > buffer.samples[0][0]);
        assert!((buffer.samples[0][2399] - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_gain_reset_snaps_to_target() {
        let mut gain = Gain::new();
        gain.prepare(&spec());
        gain.set_param(0, 1.0);
        gain.reset();

        let mut buffer = AudioBuffer::new(1, 10, 48000.0);
        buffer.samples[0].fill(1.0);
        gain.process(&mut buffer.block_mut());
        assert!((buffer.samples[0][0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_gain_empty_block() {
        let mut gain = Gain::new();
        gain.prepare(&spec());
        let mut buffer = AudioBuffer::new(1, 0, 48000.0);
        gain.process(&mut buffer.block_mut());
    }
}
