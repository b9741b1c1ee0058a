//! Audio file I/O
//!
//! Decode/encode is delegated to `hound` (WAV). Loading produces an owning
//! deinterleaved [`AudioBuffer`]; saving encodes at 16-bit by default and
//! dispatches on the file extension, falling back to WAV when the extension
//! is unrecognized. An existing file at the target path is overwritten.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, warn};

use crate::engine::buffer::AudioBuffer;
use crate::error::{Result, StompboxError};

/// Default bit depth for saved files
pub const DEFAULT_BIT_DEPTH: u16 = 16;

/// Load an audio file into a deinterleaved buffer
///
/// # Errors
/// * `FileNotFound` - if the file does not exist
/// * `InvalidAudio` - if the file cannot be decoded
/// * `EmptyAudio` - if the file holds no samples
pub fn load_audio_file(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(StompboxError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| StompboxError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let sample_rate = spec.sample_rate as f64;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() || channels == 0 {
        return Err(StompboxError::EmptyAudio);
    }

    let samples = deinterleave(&interleaved, channels);
    debug!(
        "loaded {}: {} channels, {} samples, {} Hz",
        path.display(),
        channels,
        samples[0].len(),
        sample_rate
    );

    AudioBuffer::from_channels(samples, sample_rate)
}

/// Save a buffer to an audio file
///
/// Encodes with `bit_depth` (16-bit when called through the default paths).
/// Unrecognized extensions fall back to the WAV codec. Overwrites any
/// existing file at `path`.
pub fn save_audio_file(path: &Path, buffer: &AudioBuffer, bit_depth: u16) -> Result<()> {
    if buffer.is_empty() || buffer.num_channels() == 0 {
        return Err(StompboxError::EmptyAudio);
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("wav") => {}
        other => {
            warn!(
                "no codec for extension {:?}, falling back to WAV",
                other.unwrap_or("")
            );
        }
    }

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate as u32,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_io_error)?;

    let interleaved = interleave(&buffer.samples);
    match bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(wav_io_error)?;
            }
        }
        24 => {
            for sample in interleaved {
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(wav_io_error)?;
            }
        }
        32 => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(wav_io_error)?;
            }
        }
        _ => {
            return Err(StompboxError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
            });
        }
    }

    writer.finalize().map_err(wav_io_error)?;
    Ok(())
}

/// Generate a mono test tone (sine wave)
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: f64) -> AudioBuffer {
    let num_samples = (duration_secs as f64 * sample_rate) as usize;
    let mut buffer = AudioBuffer::new(1, num_samples, sample_rate);

    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    for (i, sample) in buffer.samples[0].iter_mut().enumerate() {
        *sample = (angular_freq * i as f32).sin();
    }

    buffer
}

/// Generate a stereo test tone with a different frequency per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f32,
    sample_rate: f64,
) -> AudioBuffer {
    let num_samples = (duration_secs as f64 * sample_rate) as usize;
    let mut buffer = AudioBuffer::new(2, num_samples, sample_rate);

    for (ch, freq) in [freq_left, freq_right].iter().enumerate() {
        let angular_freq = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        for (i, sample) in buffer.samples[ch].iter_mut().enumerate() {
            *sample = (angular_freq * i as f32).sin();
        }
    }

    buffer
}

// ============================================================================
// Internal helpers
// ============================================================================

fn wav_io_error(e: hound::Error) -> StompboxError {
    StompboxError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        e.to_string(),
    ))
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |reason: String, e: hound::Error| StompboxError::InvalidAudio {
        reason,
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid(format!("Failed to read float samples: {}", e), e)),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("Failed to read 8-bit samples: {}", e), e)),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("Failed to read 16-bit samples: {}", e), e)),
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("Failed to read 24-bit samples: {}", e), e)),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid(format!("Failed to read 32-bit int samples: {}", e), e)),
            _ => Err(StompboxError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for (i, sample) in samples.iter().take(frames * channels).enumerate() {
        result[i % channels].push(*sample);
    }

    result
}

/// Interleave channels from [[L,L,...], [R,R,...]] to [L,R,L,R,...]
fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    if channels.is_empty() {
        return Vec::new();
    }

    let frames = channels[0].len();
    let mut result = Vec::with_capacity(frames * channels.len());

    for frame in 0..frames {
        for channel in channels {
            result.push(channel[frame]);
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
