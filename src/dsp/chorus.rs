//! Chorus Effect
//!
//! LFO-modulated delay line per channel with linear interpolation between
//! taps. Channel LFOs are phase-offset by 90 degrees for stereo width, and
//! the feedback path allows flanger-like settings at negative values.

use std::f32::consts::TAU;

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Modulation swing around the centre delay, in ms
const MOD_DEPTH_MS: f32 = 5.0;
/// Delay line headroom: centre max 30 ms + swing + margin
const MAX_DELAY_MS: f32 = 40.0;

/// Parameter table:
/// 0 = rate, linear [0.1, 5] Hz
/// 1 = depth, linear [0, 1]
/// 2 = delay, linear [1, 30] ms (centre delay)
/// 3 = feedback, linear [-0.9, 0.9]
/// 4 = mix, linear [0, 1]
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("rate", ParamRange::linear(0.1, 5.0)),
    ParamSpec::new("depth", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("delay", ParamRange::linear(1.0, 30.0)),
    ParamSpec::new("feedback", ParamRange::linear(-0.9, 0.9)),
    ParamSpec::new("mix", ParamRange::linear(0.0, 1.0)),
];

/// Per-channel modulated delay line
#[derive(Clone)]
struct ChorusVoice {
    buffer: Vec<f32>,
    write_pos: usize,
    phase: f32,
}

impl ChorusVoice {
    fn new(capacity: usize, phase: f32) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)],
            write_pos: 0,
            phase,
        }
    }

    /// Fractional-delay read with linear interpolation
    #[inline]
    fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, (len - 1) as f32);
        let index = delay.floor() as usize;
        let frac = delay - index as f32;

        let pos0 = (self.write_pos + len - index) % len;
        let pos1 = (pos0 + len - 1) % len;
        self.buffer[pos0] * (1.0 - frac) + self.buffer[pos1] * frac
    }

    #[inline]
    fn write_and_advance(&mut self, value: f32) {
        self.buffer[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        // Phase offsets are part of the voice identity, keep them
    }
}

/// Modulated-delay chorus
pub struct Chorus {
    values: Vec<f32>,
    rate_hz: f32,
    depth: f32,
    centre_delay_ms: f32,
    feedback: f32,
    mix: f32,
    voices: Vec<ChorusVoice>,
    sample_rate: f64,
}

impl Chorus {
    pub fn new() -> Self {
        let mut chorus = Self {
            // rate 1 Hz, depth 0.25, delay 7 ms, no feedback, mix 0.5
            values: vec![
                PARAMS[0].range.to_normalized(1.0),
                0.25,
                PARAMS[2].range.to_normalized(7.0),
                0.5,
                0.5,
            ],
            rate_hz: 1.0,
            depth: 0.25,
            centre_delay_ms: 7.0,
            feedback: 0.0,
            mix: 0.5,
            voices: Vec::new(),
            sample_rate: 44100.0,
        };
        for i in 0..chorus.values.len() {
            chorus.apply_param(i);
        }
        chorus
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => self.rate_hz = PARAMS[0].range.to_physical(self.values[0]),
            1 => self.depth = PARAMS[1].range.to_physical(self.values[1]),
            2 => self.centre_delay_ms = PARAMS[2].range.to_physical(self.values[2]),
            3 => self.feedback = PARAMS[3].range.to_physical(self.values[3]),
            4 => self.mix = PARAMS[4].range.to_physical(self.values[4]),
            _ => {}
        }
    }

    fn capacity(&self) -> usize {
        ((MAX_DELAY_MS / 1000.0) * self.sample_rate as f32) as usize
    }

    /// 90 degree offset per channel keeps stereo voices decorrelated
    fn voice_phase(channel: usize) -> f32 {
        (channel as f32) * 0.25 % 1.0
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Chorus {
    impl_effect_params!("Chorus", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        let capacity = self.capacity();
        self.voices = (0..spec.channels)
            .map(|ch| ChorusVoice::new(capacity, Self::voice_phase(ch)))
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
            let capacity = self.capacity();
            for ch in self.voices.len()..num_channels {
                self.voices.push(ChorusVoice::new(capacity, Self::voice_phase(ch)));
            }
        }

        let sample_rate = self.sample_rate as f32;
        let phase_inc = self.rate_hz / sample_rate;
        let centre_samples = (self.centre_delay_ms / 1000.0) * sample_rate;
        let swing_samples = self.depth * (MOD_DEPTH_MS / 1000.0) * sample_rate;
        let feedback = self.feedback;
        let mix = self.mix;

        for ch in 0..num_channels {
            let voice = &mut self.voices[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                let lfo = (voice.phase * TAU).sin();
                voice.phase = (voice.phase + phase_inc) % 1.0;

                // Keep the modulated delay at least one sample deep
                let delay = (centre_samples + lfo * swing_samples).max(1.0);
                let delayed = voice.read(delay);

                let input = *sample;
                voice.write_and_advance(input + delayed * feedback);
                *sample = input * (1.0 - mix) + delayed * mix;
            }
        }
    }
}
