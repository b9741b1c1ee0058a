//! Bitcrush Effect
//!
//! Quantizes each retained sample to `2^(depth-1)` levels and holds the last
//! retained sample for `downsample` consecutive input samples (sample-and-hold
//! decimation, not true resampling).

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Parameter table:
/// 0 = bitDepth, inverted linear [32, 2] bits (normalized 0 is full depth)
/// 1 = downsample, linear [1, 50] hold factor
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("bitDepth", ParamRange::linear(32.0, 2.0)),
    ParamSpec::new("downsample", ParamRange::linear(1.0, 50.0)),
];

/// Per-channel sample-and-hold state
#[derive(Clone, Default)]
struct CrushState {
    held: f32,
    counter: usize,
}

/// Bit-depth and rate reducer
pub struct Bitcrush {
    values: Vec<f32>,
    /// Quantization levels, `2^(depth-1)`
    levels: f32,
    /// Input samples per retained sample
    factor: usize,
    states: Vec<CrushState>,
}

impl Bitcrush {
    pub fn new() -> Self {
        let mut crush = Self {
            values: vec![0.0, 0.0],
            levels: 0.0,
            factor: 1,
            states: Vec::new(),
        };
        crush.apply_param(0);
        crush.apply_param(1);
        crush
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => {
                let depth = PARAMS[0].range.to_physical(self.values[0]);
                self.levels = 2.0_f32.powf(depth - 1.0);
            }
            1 => {
                let downsample = PARAMS[1].range.to_physical(self.values[1]);
                self.factor = downsample.round().max(1.0) as usize;
            }
            _ => {}
        }
    }

}

impl Default for Bitcrush {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Bitcrush {
    impl_effect_params!("Bitcrush", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.states = vec![CrushState::default(); spec.channels];
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            *state = CrushState::default();
        }
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.states.len() < num_channels {
            self.states.resize(num_channels, CrushState::default());
        }

        let factor = self.factor;
        let levels = self.levels;
        for ch in 0..num_channels {
            let state = &mut self.states[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                if state.counter == 0 {
                    state.held = (*sample * levels).round() / levels;
                }
                state.counter = (state.counter + 1) % factor;
                *sample = state.held;
            }
        }
    }
}
