//! Clipping Effect
//!
//! Hard clamp of each sample to `[-threshold, threshold]`.

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Parameter table: 0 = threshold, linear [0.1, 1.0]
static PARAMS: &[ParamSpec] = &[ParamSpec::new("threshold", ParamRange::linear(0.1, 1.0))];

/// Hard clipper
pub struct Clipping {
    values: Vec<f32>,
    threshold: f32,
}

impl Clipping {
    pub fn new() -> Self {
        Self {
            values: vec![1.0],
            threshold: 1.0,
        }
    }

    fn apply_param(&mut self, index: usize) {
        if index == 0 {
            self.threshold = PARAMS[0].range.to_physical(self.values[0]);
        }
    }
}

impl Default for Clipping {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Clipping {
    impl_effect_params!("Clipping", PARAMS);

    fn prepare(&mut self, _spec: &ProcessSpec) {}

    fn reset(&mut self) {}

    fn process(&mut self, block: &mut Block) {
        let threshold = self.threshold;
        for ch in 0..block.num_channels() {
            for sample in block.channel_mut(ch).iter_mut() {
                *sample = sample.clamp(-threshold, threshold);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;

    #[test]
    fn test_clipping_param_contract() {
        let clip = Clipping::new();
        assert_eq!(clip.name(), "Clipping");
        assert_eq!(clip.param_count(), 1);
        assert_eq!(clip.get_param(0), 1.0);
    }

    #[test]
    fn test_clipping_at_unity_is_noop_for_legal_signal() {
        let mut clip = Clipping::new();
        let mut buffer = AudioBuffer::new(1, 4, 44100.0);
        buffer.samples[0].copy_from_slice(&[-1.0, -0.3, 0.3, 1.0]);
        clip.process(&mut buffer.block_mut());
        assert_eq!(buffer.samples[0], vec![-1.0, -0.3, 0.3, 1.0]);
    }

    #[test]
    fn test_clipping_bounds_output() {
        let mut clip = Clipping::new();
        clip.set_param(0, 0.0); // threshold 0.1

        let mut buffer = AudioBuffer::new(2, 32, 44100.0);
        for ch in 0..2 {
            for (i, s) in buffer.samples[ch].iter_mut().enumerate() {
                *s = (i as f32 / 4.0) - 2.0;
            }
        }
        clip.process(&mut buffer.block_mut());

        for ch in 0..2 {
            for &s in &buffer.samples[ch] {
                assert!(s.abs() <= 0.1 + 1e-6);
            }
        }
    }

    #[test]
    fn test_clipping_passes_small_signal() {
        let mut clip = Clipping::new();
        clip.set_param(0, 0.5); // threshold 0.55

        let mut buffer = AudioBuffer::new(1, 3, 44100.0);
        buffer.samples[0].copy_from_slice(&[0.1, -0.2, 0.4]);
        clip.process(&mut buffer.block_mut());
        assert_eq!(buffer.samples[0], vec![0.1, -0.2, 0.4]);
    }
}
