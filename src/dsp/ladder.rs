//! Ladder Filter Effect
//!
//! Moog-style transistor ladder low-pass: four cascaded one-pole stages with
//! resonance fed back from the last stage to the input, and a tanh drive
//! stage at the front for the characteristic saturation.

use std::f64::consts::PI;

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Parameter table:
/// 0 = cutoff, logarithmic [20, 20000] Hz
/// 1 = resonance, linear [0, 1]
/// 2 = drive, linear [1, 5]
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("cutoff", ParamRange::logarithmic(20.0, 20000.0)),
    ParamSpec::new("resonance", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("drive", ParamRange::linear(1.0, 5.0)),
];

/// State of the four ladder stages for one channel
#[derive(Debug, Clone, Copy, Default)]
struct LadderState {
    stages: [f32; 4],
}

/// Four-pole resonant low-pass with input drive
pub struct LadderFilter {
    values: Vec<f32>,
    cutoff: f32,
    resonance: f32,
    drive: f32,
    /// One-pole coefficient derived from cutoff and rate
    g: f32,
    states: Vec<LadderState>,
    sample_rate: f64,
}

impl LadderFilter {
    pub fn new() -> Self {
        let mut filter = Self {
            // cutoff 1 kHz, no resonance, unity drive
            values: vec![PARAMS[0].range.to_normalized(1000.0), 0.0, 0.0],
            cutoff: 1000.0,
            resonance: 0.0,
            drive: 1.0,
            g: 0.0,
            states: Vec::new(),
            sample_rate: 44100.0,
        };
        for i in 0..filter.values.len() {
            filter.apply_param(i);
        }
        filter
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => {
                self.cutoff = PARAMS[0].range.to_physical(self.values[0]);
                self.update_coeff();
            }
            1 => self.resonance = PARAMS[1].range.to_physical(self.values[1]),
            2 => self.drive = PARAMS[2].range.to_physical(self.values[2]),
            _ => {}
        }
    }

    fn update_coeff(&mut self) {
        let nyquist = (self.sample_rate / 2.0 - 1.0) as f32;
        let cutoff = self.cutoff.min(nyquist);
        // Bilinear-warped one-pole coefficient
        let wc = (PI as f32) * cutoff / self.sample_rate as f32;
        let t = wc.tan();
        self.g = t / (1.0 + t);
    }
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for LadderFilter {
    impl_effect_params!("LadderFilter", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.states = vec![LadderState::default(); spec.channels];
        self.update_coeff();
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            *state = LadderState::default();
        }
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.states.len() < num_channels {
            self.states.resize(num_channels, LadderState::default());
        }

        let g = self.g;
        let k = 4.0 * self.resonance;
        let drive = self.drive;
        // Compensate the drive stage so unity drive stays transparent
        let makeup = 1.0 / drive.sqrt();

        for ch in 0..num_channels {
            let state = &mut self.states[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                let input = (*sample * drive).tanh();
                // tanh at the summing node keeps the feedback loop bounded
                // even at full resonance
                let mut x = (input - k * state.stages[3]).tanh();
                for stage in state.stages.iter_mut() {
                    *stage += g * (x - *stage);
                    x = *stage;
                }
                *sample = state.stages[3] * makeup;
            }
        }
    }
}
