//! Limiter Effect
//!
//! Brickwall limiter. Gain reduction engages with a very fast fixed attack
//! and recovers with the configurable release; a final clamp at the ceiling
//! guarantees no sample escapes above threshold regardless of envelope state.

use crate::dsp::effect::{time_to_coeff, Effect};
use crate::engine::{db_to_linear, Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Fixed attack for brickwall behavior (0.1 ms)
const ATTACK_MS: f32 = 0.1;

/// Parameter table:
/// 0 = threshold, linear [-20, 0] dB
/// 1 = release, linear [10, 500] ms
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("threshold", ParamRange::linear(-20.0, 0.0)),
    ParamSpec::new("release", ParamRange::linear(10.0, 500.0)),
];

/// Brickwall limiter
pub struct Limiter {
    values: Vec<f32>,
    /// Ceiling as linear amplitude
    ceiling: f32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Per-channel gain reduction state (1.0 = no reduction)
    gains: Vec<f32>,
    sample_rate: f64,
}

impl Limiter {
    pub fn new() -> Self {
        let mut limiter = Self {
            // ceiling 0 dB, release 100 ms
            values: vec![1.0, PARAMS[1].range.to_normalized(100.0)],
            ceiling: 1.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            gains: Vec::new(),
            sample_rate: 44100.0,
        };
        limiter.apply_param(0);
        limiter.apply_param(1);
        limiter
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => {
                let threshold_db = PARAMS[0].range.to_physical(self.values[0]);
                self.ceiling = db_to_linear(threshold_db);
            }
            1 => {
                let release_ms = PARAMS[1].range.to_physical(self.values[1]);
                self.release_coeff = time_to_coeff(release_ms, self.sample_rate as f32);
            }
            _ => {}
        }
    }

    fn update_attack(&mut self) {
        self.attack_coeff = time_to_coeff(ATTACK_MS, self.sample_rate as f32);
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Limiter {
    impl_effect_params!("Limiter", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.gains = vec![1.0; spec.channels];
        self.update_attack();
        self.apply_param(1);
    }

    fn reset(&mut self) {
        self.gains.fill(1.0);
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.gains.len() < num_channels {
            self.gains.resize(num_channels, 1.0);
        }
        if self.attack_coeff == 0.0 {
            self.update_attack();
        }

        let ceiling = self.ceiling;
        let attack = self.attack_coeff;
        let release = self.release_coeff;

        for ch in 0..num_channels {
            let mut gain = self.gains[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                let level = sample.abs();
                let target = if level * gain > ceiling && level > 0.0 {
                    ceiling / level
                } else {
                    1.0
                };
                let coeff = if target < gain { attack } else { release };
                gain = target + coeff * (gain - target);
                // Smoothing never lets a peak through the ceiling
                *sample = (*sample * gain).clamp(-ceiling, ceiling);
            }
            self.gains[ch] = gain;
        }
    }
}
