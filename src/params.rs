//! Parameter mapping
//!
//! Every built-in effect exposes its parameters as normalized [0, 1] control
//! values. The mapping from a normalized value onto the effect's physical
//! range is declared per parameter with a [`ParamRange`], either linear or
//! logarithmic (the latter for frequency and drive-like quantities, so the
//! perceptual range spreads evenly across the control).

/// Mapping curve from normalized [0, 1] to a physical range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// `min + n * (max - min)`
    Linear,
    /// `min * (max / min)^n`; requires `min > 0`
    Logarithmic,
}

/// Physical range and curve for one parameter
#[derive(Debug, Clone, Copy)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub curve: Curve,
}

impl ParamRange {
    /// Linear range from `min` to `max`
    pub const fn linear(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            curve: Curve::Linear,
        }
    }

    /// Logarithmic range from `min` to `max` (`min` must be positive)
    pub const fn logarithmic(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            curve: Curve::Logarithmic,
        }
    }

    /// Map a normalized [0, 1] value onto this range
    pub fn to_physical(&self, normalized: f32) -> f32 {
        let n = normalized.clamp(0.0, 1.0);
        match self.curve {
            Curve::Linear => self.min + n * (self.max - self.min),
            Curve::Logarithmic => {
                debug_assert!(self.min > 0.0, "logarithmic range requires min > 0");
                self.min * (self.max / self.min).powf(n)
            }
        }
    }

    /// Map a physical value back to its normalized position on this range
    ///
    /// Used by effects whose defaults are stated in physical units.
    pub fn to_normalized(&self, physical: f32) -> f32 {
        match self.curve {
            Curve::Linear => {
                if (self.max - self.min).abs() < f32::EPSILON {
                    0.0
                } else {
                    ((physical - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
                }
            }
            Curve::Logarithmic => {
                let clamped = physical.clamp(self.min.min(self.max), self.min.max(self.max));
                ((clamped / self.min).ln() / (self.max / self.min).ln()).clamp(0.0, 1.0)
            }
        }
    }
}

/// Public contract for one parameter of a built-in effect
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Human-readable parameter name
    pub name: &'static str,
    /// Mapping from the normalized control to the physical unit
    pub range: ParamRange,
}

impl ParamSpec {
    pub const fn new(name: &'static str, range: ParamRange) -> Self {
        Self { name, range }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_mapping() {
        let range = ParamRange::linear(-60.0, 0.0);
        assert_relative_eq!(range.to_physical(0.0), -60.0);
        assert_relative_eq!(range.to_physical(1.0), 0.0);
        assert_relative_eq!(range.to_physical(0.5), -30.0);
    }

    #[test]
    fn test_logarithmic_mapping() {
        let range = ParamRange::logarithmic(20.0, 20000.0);
        assert_relative_eq!(range.to_physical(0.0), 20.0, max_relative = 1e-5);
        assert_relative_eq!(range.to_physical(1.0), 20000.0, max_relative = 1e-5);
        // Halfway on a log scale spanning three decades
        assert_relative_eq!(range.to_physical(0.5), 632.4555, max_relative = 1e-4);
    }

    #[test]
    fn test_mapping_clamps_input() {
        let range = ParamRange::linear(0.0, 10.0);
        assert_relative_eq!(range.to_physical(-0.5), 0.0);
        assert_relative_eq!(range.to_physical(1.5), 10.0);
    }

    #[test]
    fn test_normalized_roundtrip() {
        let ranges = [
            ParamRange::linear(-0.9, 0.9),
            ParamRange::linear(1.0, 50.0),
            ParamRange::logarithmic(1.0, 50.0),
            ParamRange::logarithmic(100.0, 5000.0),
        ];
        for range in ranges {
            for n in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let physical = range.to_physical(n);
                assert_relative_eq!(range.to_normalized(physical), n, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_inverted_linear_range() {
        // Bit depth style: normalized 0 maps to the high end
        let range = ParamRange::linear(32.0, 2.0);
        assert_relative_eq!(range.to_physical(0.0), 32.0);
        assert_relative_eq!(range.to_physical(1.0), 2.0);
        assert_relative_eq!(range.to_physical(0.5), 17.0);
    }
}
