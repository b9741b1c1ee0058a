//! Audio Engine Module
//!
//! Core processing primitives:
//! - Deinterleaved buffer types and the per-block process spec
//! - Audio file I/O

pub mod buffer;
pub mod io;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer, Block, ProcessSpec};
pub use io::{
    generate_stereo_test_tone, generate_test_tone, load_audio_file, save_audio_file,
    DEFAULT_BIT_DEPTH,
};
