//! Delay Effect
//!
//! Per-channel ring buffer read at the configured delay; feedback is added
//! back before the write and the output is `(1-mix)*dry + mix*delayed`.
//! Ring capacity is fixed at 4 seconds of samples at the prepared rate, so
//! any legal delay time fits without reallocation.

use crate::dsp::effect::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::impl_effect_params;
use crate::params::{ParamRange, ParamSpec};

/// Ring capacity in seconds
const MAX_DELAY_SECS: f64 = 4.0;

/// Parameter table:
/// 0 = time, linear [0, 2] s (floored at one sample, so 0 s still delays
///     the wet path by a single sample)
/// 1 = feedback, linear [0, 1]
/// 2 = mix, linear [0, 1]
static PARAMS: &[ParamSpec] = &[
    ParamSpec::new("time", ParamRange::linear(0.0, 2.0)),
    ParamSpec::new("feedback", ParamRange::linear(0.0, 1.0)),
    ParamSpec::new("mix", ParamRange::linear(0.0, 1.0)),
];

/// Per-channel ring buffer
#[derive(Clone)]
struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    #[inline]
    fn read(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - delay_samples % len) % len;
        self.buffer[read_pos]
    }

    #[inline]
    fn write_and_advance(&mut self, value: f32) {
        self.buffer[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Feedback delay with dry/wet mix
pub struct Delay {
    values: Vec<f32>,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
    lines: Vec<DelayLine>,
    sample_rate: f64,
}

impl Delay {
    pub fn new() -> Self {
        let mut delay = Self {
            values: vec![0.25, 0.0, 0.5],
            delay_samples: 0,
            feedback: 0.0,
            mix: 0.5,
            lines: Vec::new(),
            sample_rate: 44100.0,
        };
        for i in 0..delay.values.len() {
            delay.apply_param(i);
        }
        delay
    }

    fn apply_param(&mut self, index: usize) {
        match index {
            0 => {
                let time = PARAMS[0].range.to_physical(self.values[0]);
                self.delay_samples = ((time as f64 * self.sample_rate) as usize).max(1);
            }
            1 => self.feedback = PARAMS[1].range.to_physical(self.values[1]),
            2 => self.mix = PARAMS[2].range.to_physical(self.values[2]),
            _ => {}
        }
    }

    fn capacity(&self) -> usize {
        (MAX_DELAY_SECS * self.sample_rate) as usize
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Delay {
    impl_effect_params!("Delay", PARAMS);

    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        let capacity = self.capacity();
        self.lines = (0..spec.channels).map(|_| DelayLine::new(capacity)).collect();
        // Delay time in samples depends on the rate
        self.apply_param(0);
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    fn process(&mut self, block: &mut Block) {
        let num_channels = block.num_channels();
        if self.lines.len() < num_channels {
            let capacity = self.capacity();
            self.lines.resize(num_channels, DelayLine::new(capacity));
        }

        let delay_samples = self.delay_samples;
        let feedback = self.feedback;
        let mix = self.mix;

        for ch in 0..num_channels {
            let line = &mut self.lines[ch];
            for sample in block.channel_mut(ch).iter_mut() {
                let input = *sample;
                let delayed = line.read(delay_samples);
                line.write_and_advance(input + delayed * feedback);
                *sample = input * (1.0 - mix) + delayed * mix;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;

    fn spec() -> ProcessSpec {
        ProcessSpec::new(48000.0, 512, 1)
    }

    #[test]
    fn test_delay_param_contract() {
        let delay = Delay::new();
        assert_eq!(delay.name(), "Delay");
        assert_eq!(delay.param_count(), 3);
    }

    #[test]
    fn test_delay_cold_start_exact_echo() {
        let mut delay = Delay::new();
        delay.prepare(&spec());
        delay.set_param(0, 0.005); // 10 ms -> 480 samples at 48 kHz
        delay.set_param(1, 0.0); // no feedback
        delay.set_param(2, 1.0); // wet only
        assert_eq!(delay.delay_samples, 480);

        let mut buffer = AudioBuffer::new(1, 1000, 48000.0);
        buffer.samples[0][0] = 1.0;
        delay.process(&mut buffer.block_mut());

        // Cold buffer: zero before the echo, exact impulse at the delay
        for i in 0..480 {
            assert_eq!(buffer.samples[0][i], 0.0, "sample {} should be silent", i);
        }
        assert_eq!(buffer.samples[0][480], 1.0);
        for i in 481..1000 {
            assert_eq!(buffer.samples[0][i], 0.0);
        }
    }

    #[test]
    fn test_delay_zero_time_floors_at_one_sample() {
        let mut delay = Delay::new();
        delay.prepare(&spec());
        delay.set_param(0, 0.0);
        delay.set_param(1, 0.0);
        delay.set_param(2, 1.0);
        assert_eq!(delay.delay_samples, 1);

        let mut buffer = AudioBuffer::new(1, 4, 48000.0);
        buffer.samples[0][0] = 1.0;
        delay.process(&mut buffer.block_mut());

        // Wet path lags by exactly one sample
        assert_eq!(buffer.samples[0][0], 0.0);
        assert_eq!(buffer.samples[0][1], 1.0);
    }

    #[test]
    fn test_delay_feedback_repeats() {
        let mut delay = Delay::new();
        delay.prepare(&spec());
        delay.set_param(0, 0.005); // 480 samples
        delay.set_param(1, 0.5);
        delay.set_param(2, 1.0);

        let mut buffer = AudioBuffer::new(1, 1500, 48000.0);
        buffer.samples[0][0] = 1.0;
        delay.process(&mut buffer.block_mut());

        assert!((buffer.samples[0][480] - 1.0).abs() < 1e-6);
        assert!((buffer.samples[0][960] - 0.5).abs() < 1e-6);
        assert!((buffer.samples[0][1440] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_delay_mix_blends_dry() {
        let mut delay = Delay::new();
        delay.prepare(&spec());
        delay.set_param(0, 0.005);
        delay.set_param(1, 0.0);
        delay.set_param(2, 0.25);

        let mut buffer = AudioBuffer::new(1, 600, 48000.0);
        buffer.samples[0][0] = 1.0;
        delay.process(&mut buffer.block_mut());

        // Dry at 75%, wet echo at 25%
        assert!((buffer.samples[0][0] - 0.75).abs() < 1e-6);
        assert!((buffer.samples[0][480] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_delay_state_continues_across_blocks() {
        let mut delay = Delay::new();
        delay.prepare(&spec());
        delay.set_param(0, 0.005); // 480 samples
        delay.set_param(1, 0.0);
        delay.set_param(2, 1.0);

        let mut first = AudioBuffer::new(1, 300, 48000.0);
        first.samples[0][0] = 1.0;
        delay.process(&mut first.block_mut());

        // The echo lands in the second block at offset 180
        let mut second = AudioBuffer::new(1, 300, 48000.0);
        delay.process(&mut second.block_mut());
        assert_eq!(second.samples[0][180], 1.0);
    }

    #[test]
    fn test_delay_stereo_channels_independent() {
        let mut delay = Delay::new();
        delay.prepare(&ProcessSpec::new(48000.0, 512, 2));
        delay.set_param(0, 0.005);
        delay.set_param(1, 0.0);
        delay.set_param(2, 1.0);

        let mut buffer = AudioBuffer::new(2, 600, 48000.0);
        buffer.samples[0][0] = 1.0; // impulse in left only
        delay.process(&mut buffer.block_mut());

        assert_eq!(buffer.samples[0][480], 1.0);
        assert!(buffer.samples[1].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_delay_reset_clears_lines() {
        let mut delay = Delay::new();
        delay.prepare(&spec());
        delay.set_param(0, 0.005);
        delay.set_param(2, 1.0);

        let mut buffer = AudioBuffer::new(1, 100, 48000.0);
        buffer.samples[0][0] = 1.0;
        delay.process(&mut buffer.block_mut());

        delay.reset();

        let mut silent = AudioBuffer::new(1, 1000, 48000.0);
        delay.process(&mut silent.block_mut());
        assert!(silent.samples[0].iter().all(|&s| s == 0.0));
    }
}
