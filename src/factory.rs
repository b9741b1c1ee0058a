//! Effect factory
//!
//! Creates built-in effects by name and wraps them, or loaded plugins, in
//! [`Processor`] instances. The name strings here are the stable public
//! identifiers; renaming one is a breaking change for every caller.

use std::path::Path;

use log::{debug, warn};

use crate::dsp::{
    Bitcrush, Chorus, Clipping, Compressor, Delay, Distortion, Effect, Gain, HighPassFilter,
    LadderFilter, Limiter, LowPassFilter, Phaser, Reverb,
};
use crate::engine::ProcessSpec;
use crate::error::{Result, StompboxError};
use crate::host;
use crate::processor::Processor;

/// Sample rate plugins are initially prepared at
pub const PLUGIN_INIT_SAMPLE_RATE: f64 = 44100.0;
/// Block size plugins are initially prepared at
pub const PLUGIN_INIT_BLOCK_SIZE: usize = 512;

/// Names of all built-in effects, in registration order
pub const EFFECT_NAMES: &[&str] = &[
    "Gain",
    "Reverb",
    "Delay",
    "Distortion",
    "Clipping",
    "Chorus",
    "Phaser",
    "Compressor",
    "Limiter",
    "LowPassFilter",
    "HighPassFilter",
    "LadderFilter",
    "Bitcrush",
];

/// Create a built-in effect by name
///
/// Returns `None` for unknown names; matching is exact and case-sensitive.
/// `LowPass` and `HighPass` are accepted as shorthand for the filter
/// effects.
pub fn create_builtin(name: &str) -> Option<Box<dyn Effect>> {
    let effect: Box<dyn Effect> = match name {
        "Gain" => Box::new(Gain::new()),
        "Reverb" => Box::new(Reverb::new()),
        "Delay" => Box::new(Delay::new()),
        "Distortion" => Box::new(Distortion::new()),
        "Clipping" => Box::new(Clipping::new()),
        "Chorus" => Box::new(Chorus::new()),
        "Phaser" => Box::new(Phaser::new()),
        "Compressor" => Box::new(Compressor::new()),
        "Limiter" => Box::new(Limiter::new()),
        "LowPassFilter" | "LowPass" => Box::new(LowPassFilter::new()),
        "HighPassFilter" | "HighPass" => Box::new(HighPassFilter::new()),
        "LadderFilter" => Box::new(LadderFilter::new()),
        "Bitcrush" => Box::new(Bitcrush::new()),
        _ => {
            warn!("unknown effect name: {:?}", name);
            return None;
        }
    };
    debug!("created built-in effect {}", name);
    Some(effect)
}

/// Create a processor around a built-in effect
///
/// Returns `None` for unknown names.
pub fn create_builtin_processor(name: &str) -> Option<Processor> {
    create_builtin(name).map(Processor::from_builtin)
}

/// Load the first effect from a plugin file and wrap it in a processor
///
/// The plugin is prepared at 44100 Hz with 512-sample stereo blocks; the
/// processor re-prepares it on the first block that differs.
pub fn load_plugin_processor(path: &Path) -> Result<Processor> {
    let spec = ProcessSpec::new(PLUGIN_INIT_SAMPLE_RATE, PLUGIN_INIT_BLOCK_SIZE, 2);
    let plugin = host::load_plugin(path, &spec)?;
    Ok(Processor::from_hosted(plugin, spec))
}

/// Convenience check used by callers validating user input early
pub fn is_builtin_name(name: &str) -> bool {
    EFFECT_NAMES.contains(&name)
}

/// Error-returning variant of [`create_builtin_processor`] for callers that
/// want a diagnostic instead of an option
pub fn try_create_builtin_processor(name: &str) -> Result<Processor> {
    create_builtin_processor(name).ok_or_else(|| StompboxError::UnknownEffect {
        name: name.to_string(),
    })
}
