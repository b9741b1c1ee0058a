//! Phaser Effect
//!
//! Four cascaded first-order allpass stages per channel. An LFO sweeps the
//! allpass centre frequency around the configured value, the stage output is
//! fed back into the input, and wet/dry mixing produces the moving notches.

use std::f32::consts::{PI, TAU};

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Number of cascaded allpass stages
const NUM_STAGES: usize = 4;
/// LFO sweep span in octaves around the centre frequency
const SWEEP_OCTAVES: f32 = 2.0;

/// Parameter table:
/// 0 = rate, linear [0.1, 10] Hz
/// 1 = depth, linear [0, 1]
/// 2 = frequency, logarithmic [100, 5000] Hz (sweep centre)
/// 3 = feedback, linear [-0.9, 0.9]
/// 4 = mix, linear [0, 1]
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("rate", ParamRange::linear(0.1, 10.0)),
    ParamSpec::new("depth", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("frequency", ParamRange::logarithmic(100.0, 5000.0)),
    ParamSpec::new("feedback", ParamRange::linear(-0.9, 0.9)),
    ParamSpec::new("mix", ParamRange::linear(0.0, 1.0)),
];

/// Per-channel allpass chain state
#[derive(Clone)]
struct PhaserVoice {
    /// One-sample memories of the allpass stages
    z1: [f32; NUM_STAGES],
    /// Last chain output, used for the feedback path
    last_output: f32,
    phase: f32,
}

impl PhaserVoice {
    fn new(phase: f32) -> Self {
        Self {
            z1: [0.0; NUM_STAGES],
            last_output: 0.0,
            phase,
        }
    }

    fn clear(&mut self) {
        self.z1 = [0.0; NUM_STAGES];
        self.last_output = 0.0;
    }
}

/// Allpass-cascade phaser
pub struct Phaser {
    values: Vec<f32>,
    rate_hz: f32,
    depth: f32,
    centre_hz: f32,
    feedback: f32,
    mix: f32,
    voices: Vec<PhaserVoice>,
    sample_rate: f64,
}

impl Phaser {
    pub fn new() -> Self {
        let mut phaser = Self {
            // rate 0.5 Hz, depth 0.5, centre 1 kHz, no feedback, mix 0.5
            values: vec![
                PARAMS[0].range.to_normalized(0.5),
                0.5,
                PARAMS[2].range.to_normalized(1000.0),
                0.5,
                0.5,
            ],
            rate_hz: 0.5,
            depth: 0.5,
            centre_hz: 1000.0,
            feedback: 0.0,
            mix: 0.5,
            voices: Vec::new(),
            sample_rate: 44100.0,
        };
        for i in 0..phaser.values.len() {
            phaser.apply_param(i);
        }
        phaser
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => self.rate_hz = PARAMS[0].range.to_physical(self.values[0]),
            1 => self.depth = PARAMS[1].range.to_physical(self.values[1]),
            2 => self.centre_hz = PARAMS[2].range.to_physical(self.values[2]),
            3 => self.feedback = PARAMS[3].range.to_physical(self.values[3]),
            4 => self.mix = PARAMS[4].range.to_physical(self.values[4]),
            _ => {}
        }
    }

    /// First-order allpass coefficient for the given frequency
    #[inline]
    fn allpass_coeff(freq: f32, sample_rate: f32) -> f32 {
        let freq = freq.clamp(20.0, sample_rate / 2.0 - 1.0);
        let t = (PI * freq / sample_rate).tan();
        (t - 1.0) / (t + 1.0)
    }
}

impl Default for Phaser {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Phaser {
    impl_effect_params!("Phaser", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.voices = (0..spec.channels)
            .map(|ch| PhaserVoice::new((ch as f32) * 0.25 % 1.0))
            .collect();
    }

    fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.clear();
        }
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.voices.len() < num_channels {
            for ch in self.voices.len()..num_channels {
                self.voices.push(PhaserVoice::new((ch as f32) * 0.25 % 1.0));
            }
        }

        let sample_rate = self.sample_rate as f32;
        let phase_inc = self.rate_hz / sample_rate;
        let centre = self.centre_hz;
        let depth = self.depth;
        let feedback = self.feedback;
        let mix = self.mix;

        for ch in 0..num_channels {
            let voice = &mut self.voices[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                let lfo = (voice.phase * TAU).sin();
                voice.phase = (voice.phase + phase_inc) % 1.0;

                // Sweep the allpass centre in octaves around the base
                let swept = centre * 2.0_f32.powf(lfo * depth * SWEEP_OCTAVES * 0.5);
                let a = Self::allpass_coeff(swept, sample_rate);

                let input = *sample;
                let mut x = input + voice.last_output * feedback;
                for z1 in voice.z1.iter_mut() {
                    // First-order allpass: y = a*x + z1; z1 = x - a*y
                    let y = a * x + *z1;
                    *z1 = x - a * y;
                    x = y;
                }
                voice.last_output = x;
                *sample = input * (1.0 - mix) + x * mix;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{generate_test_tone, AudioBuffer};

    fn spec() -> ProcessSpec {
        ProcessSpec::new(44100.0, 512, 1)
    }

    #[test]
    fn test_phaser_param_contract() {
        let phaser = Phaser::new();
        assert_eq!(phaser.name(), "Phaser");
        assert_eq!(phaser.param_count(), 5);
    }

    #[test]
    fn test_phaser_dry_mix_passthrough() {
        let mut phaser = Phaser::new();
        phaser.prepare(&spec());
        phaser.set_param(4, 0.0); // fully dry

        let mut buffer = generate_test_tone(440.0, 0.05, 44100.0);
        let original = buffer.samples[0].clone();
        phaser.process(&mut buffer.block_mut());

        for (orig, got) in original.iter().zip(buffer.samples[0].iter()) {
            assert!((orig - got).abs() < 1e-6);
        }
    }

    #[test]
    fn test_phaser_allpass_preserves_energy_roughly() {
        // Allpass stages shift phase, not magnitude, so a wet-only phaser
        // with no feedback keeps the tone's level in the same ballpark
        let mut phaser = Phaser::new();
        phaser.prepare(&spec());
        phaser.set_param(1, 0.0); // no sweep
        phaser.set_param(3, 0.5); // no feedback
        phaser.set_param(4, 1.0); // fully wet

        let mut buffer = generate_test_tone(440.0, 0.2, 44100.0);
        let input_rms = (buffer.samples[0].iter().map(|s| s * s).sum::<f32>()
            / buffer.samples[0].len() as f32)
            .sqrt();
        phaser.process(&mut buffer.block_mut());
        let output_rms = (buffer.samples[0][2000..].iter().map(|s| s * s).sum::<f32>()
            / (buffer.samples[0].len() - 2000) as f32)
            .sqrt();

        assert!(output_rms > input_rms * 0.8);
        assert!(output_rms < input_rms * 1.2);
    }

    #[test]
    fn test_phaser_mix_creates_interference() {
        // At 50/50 mix the phase-shifted path interferes with the dry path,
        // changing the output away from the input
        let mut phaser = Phaser::new();
        phaser.prepare(&spec());
        phaser.set_param(0, 1.0); // fast sweep
        phaser.set_param(1, 1.0); // full depth

        let mut buffer = generate_test_tone(1000.0, 0.5, 44100.0);
        let original = buffer.samples[0].clone();
        phaser.process(&mut buffer.block_mut());

        let diverged = buffer.samples[0][5000..]
            .iter()
            .zip(original[5000..].iter())
            .any(|(w, d)| (w - d).abs() > 0.05);
        assert!(diverged);
        assert!(buffer.is_finite());
    }

    #[test]
    fn test_phaser_feedback_stays_bounded() {
        let mut phaser = Phaser::new();
        phaser.prepare(&spec());
        phaser.set_param(3, 1.0); // feedback 0.9
        phaser.set_param(4, 1.0);

        let mut buffer = generate_test_tone(440.0, 1.0, 44100.0);
        phaser.process(&mut buffer.block_mut());

        assert!(buffer.is_finite());
        assert!(buffer.samples[0].iter().all(|s| s.abs() < 20.0));
    }

    #[test]
    fn test_phaser_reset_clears_state() {
        let mut phaser = Phaser::new();
        phaser.prepare(&spec());
        phaser.set_param(4, 1.0);

        let mut buffer = AudioBuffer::new(1, 512, 44100.0);
        buffer.samples[0].fill(0.5);
        phaser.process(&mut buffer.block_mut());
        phaser.reset();

        let mut silent = AudioBuffer::new(1, 512, 44100.0);
        phaser.process(&mut silent.block_mut());
        assert!(silent.samples[0].iter().all(|&s| s == 0.0));
    }
}
