//! Compressor Effect
//!
//! Feed-forward dynamics compressor. A per-channel envelope follower tracks
//! the rectified input with separate attack and release time constants, the
//! gain computer applies the ratio above threshold, and the resulting gain
//! is applied sample by sample.

use crate::dsp::effect::{time_to_coeff, Effect};
use crate::engine::{db_to_linear, linear_to_db, Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Parameter table:
/// 0 = threshold, linear [-60, 0] dB
/// 1 = ratio, linear [1, 20]
/// 2 = attack, linear [1, 200] ms
/// 3 = release, linear [20, 500] ms
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("threshold", ParamRange::linear(-60.0, 0.0)),
    ParamSpec::new("ratio", ParamRange::linear(1.0, 20.0)),
    ParamSpec::new("attack", ParamRange::linear(1.0, 200.0)),
    ParamSpec::new("release", ParamRange::linear(20.0, 500.0)),
];

/// Feed-forward compressor
pub struct Compressor {
    values: Vec<f32>,
    threshold_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Per-channel envelope level (linear amplitude)
    envelopes: Vec<f32>,
    sample_rate: f64,
}

impl Compressor {
    pub fn new() -> Self {
        let mut comp = Self {
            // threshold -20 dB, ratio 4:1, attack 10 ms, release 100 ms
            values: vec![
                PARAMS[0].range.to_normalized(-20.0),
                PARAMS[1].range.to_normalized(4.0),
                PARAMS[2].range.to_normalized(10.0),
                PARAMS[3].range.to_normalized(100.0),
            ],
            threshold_db: -20.0,
            ratio: 4.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelopes: Vec::new(),
            sample_rate: 44100.0,
        };
        for i in 0..comp.values.len() {
            comp.apply_param(i);
        }
        comp
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => self.threshold_db = PARAMS[0].range.to_physical(self.values[0]),
            1 => self.ratio = PARAMS[1].range.to_physical(self.values[1]).max(1.0),
            2 => {
                let attack_ms = PARAMS[2].range.to_physical(self.values[2]);
                self.attack_coeff = time_to_coeff(attack_ms, self.sample_rate as f32);
            }
            3 => {
                let release_ms = PARAMS[3].range.to_physical(self.values[3]);
                self.release_coeff = time_to_coeff(release_ms, self.sample_rate as f32);
            }
            _ => {}
        }
    }

    /// Gain (linear) for the given envelope level
    #[inline]
    fn compute_gain(&self, envelope: f32) -> f32 {
        if envelope <= 0.0 {
            return 1.0;
        }
        let level_db = linear_to_db(envelope);
        if level_db <= self.threshold_db {
            return 1.0;
        }
        let over_db = level_db - self.threshold_db;
        let compressed_db = over_db / self.ratio;
        db_to_linear(compressed_db - over_db)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Compressor {
    impl_effect_params!("Compressor", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.envelopes = vec![0.0; spec.channels];
        // Attack and release coefficients depend on the rate
        self.apply_param(2);
        self.apply_param(3);
    }

    fn reset(&mut self) {
        self.envelopes.fill(0.0);
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.envelopes.len() < num_channels {
            self.envelopes.resize(num_channels, 0.0);
        }

        let attack = self.attack_coeff;
        let release = self.release_coeff;

        for ch in 0..num_channels {
            let mut envelope = self.envelopes[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                let level = sample.abs();
                let coeff = if level > envelope { attack } else { release };
                envelope = level + coeff * (envelope - level);
                *sample *= self.compute_gain(envelope);
            }
            self.envelopes[ch] = envelope;
        }
    }
}
