//! Effect trait definition
//!
//! Base contract shared by all built-in DSP effects.

use crate::engine::{Block, ProcessSpec};
use crate::params::ParamSpec;

/// Base trait for all built-in DSP effects
///
/// Effects transform blocks in place and expose their parameters as
/// normalized [0, 1] values. Out-of-range indices are silently absorbed:
/// `set_param` is a no-op and `get_param` returns 0.0. Implementations
/// keep all state behind `&mut self`, so shared references are safe to
/// hand across threads.
pub trait Effect: Send + Sync {
    /// Effect kind name, as matched by the factory
    fn name(&self) -> &'static str;

    /// Parameter contract: name, curve, and physical range per index
    fn params(&self) -> &'static [ParamSpec];

    /// Number of parameters
    fn param_count(&self) -> usize {
        self.params().len()
    }

    /// Set a parameter from its normalized [0, 1] value
    fn set_param(&mut self, index: usize, normalized: f32);

    /// Get a parameter's normalized value (0.0 for unknown indices)
    fn get_param(&self, index: usize) -> f32;

    /// (Re)initialize internal state for a block configuration
    ///
    /// Called by the processor only when the spec actually changes.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Clear internal state without changing configuration
    fn reset(&mut self);

    /// Transform a block in place
    ///
    /// Assumes the block dimensions match the last `prepare`.
    fn process(&mut self, block: &mut Block);
}

/// Helper macro implementing the parameter half of [`Effect`]
///
/// Expects the effect struct to hold normalized values in `self.values`
/// and to define `fn apply_param(&mut self, index: usize)` that pushes the
/// mapped physical value into its run-time state.
#[macro_export]
macro_rules! impl_effect_params {
    ($name:expr, $specs:expr) => {
        fn name(&self) -> &'static str {
            $name
        }

        fn params(&self) -> &'static [$crate::params::ParamSpec] {
            $specs
        }

        fn get_param(&self, index: usize) -> f32 {
            self.values.get(index).copied().unwrap_or(0.0)
        }

        fn set_param(&mut self, index: usize, normalized: f32) {
            if index < self.values.len() {
                self.values[index] = normalized.clamp(0.0, 1.0);
                self.apply_param(index);
            }
        }
    };
}

/// Envelope coefficient from a time constant in milliseconds
#[inline]
pub(crate) fn time_to_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = (time_ms * sample_rate / 1000.0).max(1.0);
    (-1.0 / samples).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_coeff_monotonic() {
        // Longer time constants decay slower (coefficient closer to 1)
        let fast = time_to_coeff(1.0, 48000.0);
        let slow = time_to_coeff(100.0, 48000.0);
        assert!(fast < slow);
        assert!(slow < 1.0);
    }
}
