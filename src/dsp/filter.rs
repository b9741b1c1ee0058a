//! Low-Pass and High-Pass Filter Effects
//!
//! Second-order (biquad) filters using the Audio EQ Cookbook coefficient
//! formulas. Both filters share the biquad kernel and differ only in the
//! coefficient calculation.
//! Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html

use std::f64::consts::PI;

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::params::{ParamRange, ParamSpec};

/// Parameter table:
/// 0 = cutoff, logarithmic [20, 20000] Hz
/// 1 = q, linear [0.1, 10]
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("cutoff", ParamRange::logarithmic(20.0, 20000.0)),
    ParamSpec::new("q", ParamRange::linear(0.1, 10.0)),
];

/// Biquad kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    LowPass,
    HighPass,
}

/// Normalized biquad coefficients (a0 divided out)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    fn calculate(kind: FilterKind, sample_rate: f64, cutoff: f64, q: f64) -> Self {
        // Keep the cutoff below Nyquist
        let freq = cutoff.clamp(20.0, sample_rate / 2.0 - 1.0);
        let q = q.clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::LowPass => (
                (1.0 - cos_w0) / 2.0,
                1.0 - cos_w0,
                (1.0 - cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterKind::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Per-channel Direct Form I state
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, coeffs: &BiquadCoeffs, input: f64) -> f64 {
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// Shared filter engine behind the low-pass and high-pass effects
struct BiquadFilter {
    values: Vec<f32>,
    kind: FilterKind,
    cutoff: f64,
    q: f64,
    coeffs: BiquadCoeffs,
    states: Vec<BiquadState>,
    sample_rate: f64,
}

impl BiquadFilter {
    fn new(kind: FilterKind, default_cutoff_normalized: f32) -> Self {
        let mut filter = Self {
            values: vec![default_cutoff_normalized, PARAMS[1].range.to_normalized(0.707)],
            kind,
            cutoff: 1000.0,
            q: 0.707,
            coeffs: BiquadCoeffs::default(),
            states: Vec::new(),
            sample_rate: 44100.0,
        };
        filter.apply_param(0);
        filter.apply_param(1);
        filter
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => self.cutoff = PARAMS[0].range.to_physical(self.values[0]) as f64,
            1 => self.q = PARAMS[1].range.to_physical(self.values[1]) as f64,
            _ => return,
        }
        self.update_coeffs();
    }

    fn update_coeffs(&mut self) {
        self.coeffs = BiquadCoeffs::calculate(self.kind, self.sample_rate, self.cutoff, self.q);
    }

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.states = vec![BiquadState::default(); spec.channels];
        self.update_coeffs();
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            *state = BiquadState::default();
        }
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.states.len() < num_channels {
            self.states.resize(num_channels, BiquadState::default());
        }

        let coeffs = self.coeffs;
        for ch in 0..num_channels {
            let state = &mut self.states[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                *sample = state.process(&coeffs, *sample as f64) as f32;
            }
        }
    }
}

/// Second-order low-pass filter
pub struct LowPassFilter {
    inner: BiquadFilter,
}

impl LowPassFilter {
    pub fn new() -> Self {
        // Default cutoff 1 kHz
        Self {
            inner: BiquadFilter::new(FilterKind::LowPass, LOG_1KHZ),
        }
    }

    fn apply_param(&mut self, index: usize) {
        self.inner.apply_param(index);
    }
}

/// Second-order high-pass filter
pub struct HighPassFilter {
    inner: BiquadFilter,
}

impl HighPassFilter {
    pub fn new() -> Self {
        // Default cutoff 100 Hz
        Self {
            inner: BiquadFilter::new(FilterKind::HighPass, LOG_100HZ),
        }
    }

    fn apply_param(&mut self, index: usize) {
        self.inner.apply_param(index);
    }
}

/// Normalized position of 1 kHz on the log [20, 20000] range
const LOG_1KHZ: f32 = 0.566_287_3;
/// Normalized position of 100 Hz on the log [20, 20000] range
const LOG_100HZ: f32 = 0.232_999_72;

macro_rules! forward_filter_effect {
    ($effect:ty, $name:expr) => {
        impl Default for $effect {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Effect for $effect {
            fn name(&self) -> &'static str {
                $name
            }

            fn params(&self) -> &'static [ParamSpec] {
                PARAMS
            }

            fn get_param(&self, index: usize) -> f32 {
                self.inner.values.get(index).copied().unwrap_or(0.0)
            }

            fn set_param(&mut self, index: usize, normalized: f32) {
                if index < self.inner.values.len() {
                    self.inner.values[index] = normalized.clamp(0.0, 1.0);
                    self.apply_param(index);
                }
            }

            fn prepare(&mut self, spec: &ProcessSpec) {
                self.inner.prepare(spec);
            }

            fn reset(&mut self) {
                self.inner.reset();
            }

            fn process(&mut self, block: &mut Block) {
                self.inner.process(block);
            }
        }
    };
}

forward_filter_effect!(LowPassFilter, "LowPassFilter");
forward_filter_effect!(HighPassFilter, "HighPassFilter");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{generate_test_tone, AudioBuffer};

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    fn spec() -> ProcessSpec {
        ProcessSpec::new(44100.0, 512, 1)
    }

    #[test]
    fn test_filter_param_contracts() {
        let lp = LowPassFilter::new();
        assert_eq!(lp.name(), "LowPassFilter");
        assert_eq!(lp.param_count(), 2);

        let hp = HighPassFilter::new();
        assert_eq!(hp.name(), "HighPassFilter");
        assert_eq!(hp.param_count(), 2);
    }

    #[test]
    fn test_filter_default_cutoffs() {
        let lp = LowPassFilter::new();
        assert!((lp.inner.cutoff - 1000.0).abs() < 5.0);

        let hp = HighPassFilter::new();
        assert!((hp.inner.cutoff - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut lp = LowPassFilter::new();
        lp.prepare(&spec());
        lp.set_param(0, PARAMS[0].range.to_normalized(500.0));

        let mut buffer = generate_test_tone(8000.0, 0.2, 44100.0);
        let input_rms = rms(&buffer.samples[0]);
        lp.process(&mut buffer.block_mut());

        // Skip the settling transient before measuring
        let output_rms = rms(&buffer.samples[0][2000..]);
        assert!(output_rms < input_rms * 0.1);
    }

    #[test]
    fn test_lowpass_passes_low_frequencies() {
        let mut lp = LowPassFilter::new();
        lp.prepare(&spec());
        lp.set_param(0, PARAMS[0].range.to_normalized(5000.0));

        let mut buffer = generate_test_tone(100.0, 0.2, 44100.0);
        let input_rms = rms(&buffer.samples[0]);
        lp.process(&mut buffer.block_mut());

        let output_rms = rms(&buffer.samples[0][2000..]);
        assert!(output_rms > input_rms * 0.9);
    }

    #[test]
    fn test_highpass_attenuates_low_frequencies() {
        let mut hp = HighPassFilter::new();
        hp.prepare(&spec());
        hp.set_param(0, PARAMS[0].range.to_normalized(2000.0));

        let mut buffer = generate_test_tone(100.0, 0.2, 44100.0);
        let input_rms = rms(&buffer.samples[0]);
        hp.process(&mut buffer.block_mut());

        let output_rms = rms(&buffer.samples[0][2000..]);
        assert!(output_rms < input_rms * 0.1);
    }

    #[test]
    fn test_highpass_passes_high_frequencies() {
        let mut hp = HighPassFilter::new();
        hp.prepare(&spec());
        hp.set_param(0, PARAMS[0].range.to_normalized(100.0));

        let mut buffer = generate_test_tone(5000.0, 0.2, 44100.0);
        let input_rms = rms(&buffer.samples[0]);
        hp.process(&mut buffer.block_mut());

        let output_rms = rms(&buffer.samples[0][2000..]);
        assert!(output_rms > input_rms * 0.9);
    }

    #[test]
    fn test_filter_reset_clears_state() {
        let mut lp = LowPassFilter::new();
        lp.prepare(&spec());

        let mut buffer = generate_test_tone(440.0, 0.05, 44100.0);
        lp.process(&mut buffer.block_mut());
        lp.reset();

        let mut silent = AudioBuffer::new(1, 256, 44100.0);
        lp.process(&mut silent.block_mut());
        assert!(silent.samples[0].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_filter_output_finite_at_extreme_q() {
        let mut lp = LowPassFilter::new();
        lp.prepare(&spec());
        lp.set_param(1, 1.0); // q = 10

        let mut buffer = generate_test_tone(1000.0, 0.1, 44100.0);
        lp.process(&mut buffer.block_mut());
        assert!(buffer.is_finite());
    }
}
