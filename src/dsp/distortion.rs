//! Distortion Effect
//!
//! Drive-staged `tanh` waveshaping. The input is scaled by the drive amount
//! before the shaper and the output is compensated by `1/sqrt(drive)` so
//! perceived loudness stays roughly constant across the drive range.

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Parameter table: 0 = drive, logarithmic [1, 50]
static PARAMS: &[ParamSpec] = &[ParamSpec::new("drive", ParamRange::logarithmic(1.0, 50.0))];

/// Tanh waveshaper with drive compensation
pub struct Distortion {
    values: Vec<f32>,
    drive: f32,
    /// Output compensation, `1/sqrt(drive)`
    makeup: f32,
}

impl Distortion {
    pub fn new() -> Self {
        Self {
            values: vec![0.0],
            drive: 1.0,
            makeup: 1.0,
        }
    }

    fn apply_param(&mut self, index: usize) {
        if index == 0 {
            self.drive = PARAMS[0].range.to_physical(self.values[0]);
            self.makeup = 1.0 / self.drive.sqrt();
        }
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Distortion {
    impl_effect_params!("Distortion", PARAMS);

    fn prepare(&mut self, _spec: &ProcessSpec) {}

    fn reset(&mut self) {
        // Stateless waveshaper, nothing to clear
    }

    fn process(&mut self, block: &mut Block) {
        let drive = self.drive;
        let makeup = self.makeup;
        for ch in 0..block.num_channels() {
            for sample in block.channel_mut(ch).iter_mut() {
                *sample = (*sample * drive).tanh() * makeup;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;

    #[test]
    fn test_distortion_param_contract() {
        let dist = Distortion::new();
        assert_eq!(dist.name(), "Distortion");
        assert_eq!(dist.param_count(), 1);
    }

    #[test]
    fn test_distortion_default_is_gentle() {
        // Drive 1 on a small signal is nearly transparent
        let mut dist = Distortion::new();
        let mut buffer = AudioBuffer::new(1, 10, 44100.0);
        buffer.samples[0].fill(0.1);
        dist.process(&mut buffer.block_mut());
        assert!((buffer.samples[0][0] - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_distortion_full_drive_saturates() {
        let mut dist = Distortion::new();
        dist.set_param(0, 1.0); // drive 50

        let mut buffer = AudioBuffer::new(1, 10, 44100.0);
        buffer.samples[0].fill(1.0);
        dist.process(&mut buffer.block_mut());

        // tanh(50) ~ 1.0, makeup 1/sqrt(50)
        let expected = 1.0 / 50.0_f32.sqrt();
        assert!((buffer.samples[0][0] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_distortion_output_bounded() {
        let mut dist = Distortion::new();
        dist.set_param(0, 0.5);

        let mut buffer = AudioBuffer::new(2, 64, 44100.0);
        for ch in 0..2 {
            for (i, s) in buffer.samples[ch].iter_mut().enumerate() {
                *s = if i % 2 == 0 { 10.0 } else { -10.0 };
            }
        }
        dist.process(&mut buffer.block_mut());

        // tanh bounds the shaper output to [-1, 1] before makeup
        for ch in 0..2 {
            for &s in &buffer.samples[ch] {
                assert!(s.abs() <= 1.0);
            }
        }
    }

    #[test]
    fn test_distortion_odd_symmetry() {
        let mut dist = Distortion::new();
        dist.set_param(0, 0.7);

        let mut buffer = AudioBuffer::new(1, 2, 44100.0);
        buffer.samples[0][0] = 0.5;
        buffer.samples[0][1] = -0.5;
        dist.process(&mut buffer.block_mut());

        assert!((buffer.samples[0][0] + buffer.samples[0][1]).abs() < 1e-6);
    }
}
