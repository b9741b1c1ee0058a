//! DSP Effects Library
//!
//! The built-in effects. All implement the [`Effect`] trait for uniform
//! normalized-parameter control and in-place block processing; construction
//! by name lives in [`crate::factory`].

mod bitcrush;
mod chorus;
mod clipping;
mod compressor;
mod delay;
mod distortion;
pub(crate) mod effect;
mod filter;
mod gain;
mod ladder;
mod limiter;
mod phaser;
mod reverb;

pub use bitcrush::Bitcrush;
pub use chorus::Chorus;
pub use clipping::Clipping;
pub use compressor::Compressor;
pub use delay::Delay;
pub use distortion::Distortion;
pub use effect::Effect;
pub use filter::{HighPassFilter, LowPassFilter};
pub use gain::Gain;
pub use ladder::LadderFilter;
pub use limiter::Limiter;
pub use phaser::Phaser;
pub use reverb::Reverb;
