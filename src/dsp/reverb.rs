//! Reverb Effect
//!
//! Freeverb topology: 8 parallel lowpass-feedback comb filters into 4 series
//! allpass filters per channel, with the classic tuning constants. The right
//! channel runs the same network offset by the stereo spread. Mono input is
//! duplicated into the stereo network and the two outputs fold back to the
//! single channel; buffers with more than two channels reverberate the first
//! pair and pass the rest through.

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

// ============================================================================
// Freeverb Constants
// ============================================================================

/// Reference sample rate the delay tunings are given at
const REFERENCE_SAMPLE_RATE: f64 = 44100.0;

/// Comb filter delays at 44100 Hz
const COMB_DELAYS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass filter delays at 44100 Hz
const ALLPASS_DELAYS: [usize; 4] = [556, 441, 341, 225];

/// Right-channel delay offset in samples
const STEREO_SPREAD: usize = 23;

/// Fixed allpass gain
const ALLPASS_GAIN: f32 = 0.5;

/// Input attenuation before the comb bank
const FIXED_GAIN: f32 = 0.015;

/// Room size to comb feedback mapping
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;

/// Damping parameter scale
const DAMP_SCALE: f32 = 0.4;

/// Parameter table:
/// 0 = roomSize, linear [0, 1]
/// 1 = damping, linear [0, 1]
/// 2 = wetLevel, linear [0, 1]
/// 3 = dryLevel, linear [0, 1]
/// 4 = width, linear [0, 1]
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("roomSize", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("damping", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("wetLevel", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("dryLevel", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("width", ParamRange::linear(0.0, 1.0)),
];

// ============================================================================
// Filter Components
// ============================================================================

/// Lowpass-feedback comb filter
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    mask: usize,
    /// One-pole state for the damping lowpass in the feedback path
    filter_state: f32,
    feedback: f32,
    damp1: f32,
    damp2: f32,
}

impl CombFilter {
    fn new(delay_size: usize) -> Self {
        let size = delay_size.next_power_of_two();
        Self {
            buffer: vec![0.0; size],
            write_pos: 0,
            mask: size - 1,
            filter_state: 0.0,
            feedback: 0.5,
            damp1: 0.5,
            damp2: 0.5,
        }
    }

    fn set_coefficients(&mut self, feedback: f32, damp1: f32, damp2: f32) {
        self.feedback = feedback;
        self.damp1 = damp1;
        self.damp2 = damp2;
    }

    #[inline]
    fn process(&mut self, input: f32, delay: usize) -> f32 {
        let read_pos = (self.write_pos + self.mask + 1 - delay) & self.mask;
        let output = self.buffer[read_pos];

        self.filter_state = output * self.damp1 + self.filter_state * self.damp2;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;
        self.write_pos = (self.write_pos + 1) & self.mask;

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// Allpass diffusion filter
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    mask: usize,
}

impl AllpassFilter {
    fn new(delay_size: usize) -> Self {
        let size = delay_size.next_power_of_two();
        Self {
            buffer: vec![0.0; size],
            write_pos: 0,
            mask: size - 1,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, delay: usize) -> f32 {
        let read_pos = (self.write_pos + self.mask + 1 - delay) & self.mask;
        let delayed = self.buffer[read_pos];

        let output = delayed - ALLPASS_GAIN * input;
        self.buffer[self.write_pos] = input + ALLPASS_GAIN * output;
        self.write_pos = (self.write_pos + 1) & self.mask;

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

// ============================================================================
// Main Reverb Effect
// ============================================================================

/// Freeverb reverb
pub struct Reverb {
    values: Vec<f32>,
    sample_rate: f64,

    comb_left: [CombFilter; 8],
    comb_right: [CombFilter; 8],
    allpass_left: [AllpassFilter; 4],
    allpass_right: [AllpassFilter; 4],

    /// Delay tunings scaled to the current sample rate
    comb_delays_left: [usize; 8],
    comb_delays_right: [usize; 8],
    allpass_delays_left: [usize; 4],
    allpass_delays_right: [usize; 4],
}

impl Reverb {
    pub fn new() -> Self {
        let comb_left = std::array::from_fn(|i| CombFilter::new(COMB_DELAYS[i] * 2));
        let comb_right =
            std::array::from_fn(|i| CombFilter::new(COMB_DELAYS[i] * 2 + STEREO_SPREAD));
        let allpass_left = std::array::from_fn(|i| AllpassFilter::new(ALLPASS_DELAYS[i] * 2));
        let allpass_right =
            std::array::from_fn(|i| AllpassFilter::new(ALLPASS_DELAYS[i] * 2 + STEREO_SPREAD));

        let mut reverb = Self {
            // roomSize 0.5, damping 0.5, wet 0.33, dry 0.4, width 1.0
            values: vec![0.5, 0.5, 0.33, 0.4, 1.0],
            sample_rate: REFERENCE_SAMPLE_RATE,
            comb_left,
            comb_right,
            allpass_left,
            allpass_right,
            comb_delays_left: COMB_DELAYS,
            comb_delays_right: std::array::from_fn(|i| COMB_DELAYS[i] + STEREO_SPREAD),
            allpass_delays_left: ALLPASS_DELAYS,
            allpass_delays_right: std::array::from_fn(|i| ALLPASS_DELAYS[i] + STEREO_SPREAD),
        };

        reverb.update_coefficients();
        reverb
    }

    fn apply_param(&mut self, index: usize) {
        // Room size and damping feed the comb coefficients; wet, dry and
        // width are read directly in process()
        if index <= 1 {
            self.update_coefficients();
        }
    }

    fn room_size(&self) -> f32 {
        self.values[0]
    }

    fn update_coefficients(&mut self) {
        let feedback = self.room_size() * ROOM_SCALE + ROOM_OFFSET;
        let damping = self.values[1];
        let damp1 = 1.0 - damping * DAMP_SCALE;
        let damp2 = damping * DAMP_SCALE;

        for comb in self.comb_left.iter_mut().chain(self.comb_right.iter_mut()) {
            comb.set_coefficients(feedback, damp1, damp2);
        }
    }

    /// Rescale delay tunings and resize buffers for the current rate
    fn rebuild_for_rate(&mut self) {
        let scale = self.sample_rate / REFERENCE_SAMPLE_RATE;

        for i in 0..8 {
            self.comb_delays_left[i] = ((COMB_DELAYS[i] as f64 * scale) as usize).max(1);
            self.comb_delays_right[i] =
                (((COMB_DELAYS[i] + STEREO_SPREAD) as f64 * scale) as usize).max(1);
            self.comb_left[i] = CombFilter::new(self.comb_delays_left[i] + 1);
            self.comb_right[i] = CombFilter::new(self.comb_delays_right[i] + 1);
        }
        for i in 0..4 {
            self.allpass_delays_left[i] = ((ALLPASS_DELAYS[i] as f64 * scale) as usize).max(1);
            self.allpass_delays_right[i] =
                (((ALLPASS_DELAYS[i] + STEREO_SPREAD) as f64 * scale) as usize).max(1);
            self.allpass_left[i] = AllpassFilter::new(self.allpass_delays_left[i] + 1);
            self.allpass_right[i] = AllpassFilter::new(self.allpass_delays_right[i] + 1);
        }

        self.update_coefficients();
    }

    /// Run one sample through the left comb bank and allpass chain
    #[inline]
    fn run_left(&mut self, input: f32) -> f32 {
        let mut sum = 0.0;
        for i in 0..8 {
            sum += self.comb_left[i].process(input, self.comb_delays_left[i]);
        }
        for i in 0..4 {
            sum = self.allpass_left[i].process(sum, self.allpass_delays_left[i]);
        }
        sum
    }

    /// Run one sample through the right comb bank and allpass chain
    #[inline]
    fn run_right(&mut self, input: f32) -> f32 {
        let mut sum = 0.0;
        for i in 0..8 {
            sum += self.comb_right[i].process(input, self.comb_delays_right[i]);
        }
        for i in 0..4 {
            sum = self.allpass_right[i].process(sum, self.allpass_delays_right[i]);
        }
        sum
    }

    /// Duplicate a mono signal into both banks and fold the pair back down
    fn process_mono(&mut self, samples: &mut [f32], wet: f32, dry: f32) {
        for sample in samples.iter_mut() {
            let input = *sample;
            let feed = input * FIXED_GAIN;
            let out_left = self.run_left(feed);
            let out_right = self.run_right(feed);
            *sample = input * dry + (out_left + out_right) * 0.5 * wet;
        }
    }

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32], wet: f32, dry: f32) {
        let width = self.values[4];
        // Same-side and cross-side wet contributions
        let wet1 = wet * (1.0 + width) / 2.0;
        let wet2 = wet * (1.0 - width) / 2.0;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input_left = *l;
            let input_right = *r;
            let feed = (input_left + input_right) * 0.5 * FIXED_GAIN;

            let out_left = self.run_left(feed);
            let out_right = self.run_right(feed);

            *l = input_left * dry + out_left * wet1 + out_right * wet2;
            *r = input_right * dry + out_right * wet1 + out_left * wet2;
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Reverb {
    impl_effect_params!("Reverb", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.rebuild_for_rate();
    }

    fn reset(&mut self) {
        for comb in self.comb_left.iter_mut().chain(self.comb_right.iter_mut()) {
            comb.clear();
        }
        for allpass in self
            .allpass_left
            .iter_mut()
            .chain(self.allpass_right.iter_mut())
        {
            allpass.clear();
        }
    }

    fn process(&mut self, block: &mut Block) {
        let wet = self.values[2];
        let dry = self.values[3];

        match block.num_channels() {
            0 => {}
            1 => {
                let samples = block.channel_mut(0);
                self.process_mono(samples, wet, dry);
            }
            _ => {
                // Extra channels beyond the stereo pair pass through
                let (left, right) = block.channel_pair_mut(0, 1);
                self.process_stereo(left, right, wet, dry);
            }
        }
    }
}
