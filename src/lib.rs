//! Stompbox - Audio Effects Processing Core
//!
//! A library of built-in DSP effects behind a uniform processor interface:
//! effects are created by name, controlled through normalized [0, 1]
//! parameters, and process deinterleaved float blocks in place. External
//! plugins slot in behind the same interface through registrable plugin
//! formats, and a flat C ABI exposes the whole surface to other languages.
//!
//! # Quick start
//!
//! ```no_run
//! use stompbox::factory;
//! use stompbox::engine::{load_audio_file, save_audio_file, DEFAULT_BIT_DEPTH};
//! use std::path::Path;
//!
//! # fn main() -> stompbox::Result<()> {
//! let mut buffer = load_audio_file(Path::new("in.wav"))?;
//! let mut reverb = factory::create_builtin_processor("Reverb").unwrap();
//! reverb.set_param(0, 0.8); // roomSize
//! let sample_rate = buffer.sample_rate;
//! reverb.process(&mut buffer.block_mut(), sample_rate);
//! save_audio_file(Path::new("out.wav"), &buffer, DEFAULT_BIT_DEPTH)?;
//! # Ok(())
//! # }
//! ```

pub mod dsp;
pub mod engine;
pub mod error;
pub mod factory;
pub mod ffi;
pub mod host;
pub mod params;
pub mod processor;

pub use error::{Result, StompboxError};
pub use processor::Processor;
