//! Processor
//!
//! [`Processor`] wraps one effect instance, built-in or hosted, behind a
//! uniform control surface. Parameter setters from any thread enqueue
//! commands and update a shadow value table; the audio thread drains the
//! queue at the top of each `process` call, so the backing effect is only
//! ever touched from one thread at a time.
//!
//! The processor also owns re-preparation: each incoming block's dimensions
//! are compared against the spec the effect was last prepared for, and on
//! any change the effect is re-prepared and its state reset before
//! processing.

use std::sync::Mutex;

use log::debug;

use crate::dsp::Effect;
use crate::engine::{Block, ProcessSpec};
use crate::host::HostedPlugin;

/// The effect implementation behind a processor
enum Backend {
    Builtin(Box<dyn Effect>),
    Hosted(Box<dyn HostedPlugin>),
}

impl Backend {
    fn param_count(&self) -> usize {
        match self {
            Backend::Builtin(effect) => effect.param_count(),
            Backend::Hosted(plugin) => plugin.param_count(),
        }
    }

    fn set_param(&mut self, index: usize, normalized: f32) {
        match self {
            Backend::Builtin(effect) => effect.set_param(index, normalized),
            Backend::Hosted(plugin) => {
                plugin.set_param(index, normalized);
                plugin.notify_host_param(index, normalized);
            }
        }
    }

    fn prepare(&mut self, spec: &ProcessSpec) {
        match self {
            Backend::Builtin(effect) => effect.prepare(spec),
            Backend::Hosted(plugin) => plugin.prepare(spec),
        }
    }

    fn reset(&mut self) {
        match self {
            Backend::Builtin(effect) => effect.reset(),
            Backend::Hosted(plugin) => plugin.reset(),
        }
    }

    fn process(&mut self, block: &mut Block) {
        match self {
            Backend::Builtin(effect) => effect.process(block),
            Backend::Hosted(plugin) => plugin.process(block),
        }
    }

    fn name(&self) -> String {
        match self {
            Backend::Builtin(effect) => effect.name().to_string(),
            Backend::Hosted(plugin) => plugin.name().to_string(),
        }
    }
}

/// Parameter state shared between control and audio threads
struct ParamState {
    /// Last value set per index; getters read this, never the backend
    shadow: Vec<f32>,
    /// Sets not yet applied to the backend, in arrival order
    pending: Vec<(usize, f32)>,
}

/// One effect instance with thread-safe parameter control
pub struct Processor {
    backend: Backend,
    params: Mutex<ParamState>,
    /// Spec the backend was last prepared for
    last_spec: Option<ProcessSpec>,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("name", &self.backend.name())
            .field("last_spec", &self.last_spec)
            .finish_non_exhaustive()
    }
}

impl Processor {
    /// Wrap a built-in effect
    pub fn from_builtin(effect: Box<dyn Effect>) -> Self {
        let shadow = (0..effect.param_count())
            .map(|i| effect.get_param(i))
            .collect();
        Self {
            backend: Backend::Builtin(effect),
            params: Mutex::new(ParamState {
                shadow,
                pending: Vec::new(),
            }),
            last_spec: None,
        }
    }

    /// Wrap a hosted plugin
    pub fn from_hosted(plugin: Box<dyn HostedPlugin>, prepared_spec: ProcessSpec) -> Self {
        let shadow = (0..plugin.param_count())
            .map(|i| plugin.get_param(i))
            .collect();
        Self {
            backend: Backend::Hosted(plugin),
            params: Mutex::new(ParamState {
                shadow,
                pending: Vec::new(),
            }),
            last_spec: Some(prepared_spec),
        }
    }

    /// Effect or plugin name
    pub fn name(&self) -> String {
        self.backend.name()
    }

    /// Number of parameters
    pub fn num_params(&self) -> usize {
        self.backend.param_count()
    }

    /// Set a parameter from its normalized [0, 1] value
    ///
    /// Unknown indices are silently ignored. The value is clamped, recorded
    /// in the shadow table, and applied to the backend at the start of the
    /// next `process` call. Takes `&self` so control threads can share the
    /// processor with the audio thread; only the mutex-guarded state is
    /// touched here.
    pub fn set_param(&self, index: usize, normalized: f32) {
        let clamped = normalized.clamp(0.0, 1.0);
        if let Ok(mut state) = self.params.lock() {
            if index < state.shadow.len() {
                state.shadow[index] = clamped;
                state.pending.push((index, clamped));
            }
        }
    }

    /// Get a parameter's normalized value
    ///
    /// Reads the shadow table, so a value set moments ago is returned even
    /// if no block has been processed since. Unknown indices return 0.0.
    pub fn get_param(&self, index: usize) -> f32 {
        self.params
            .lock()
            .ok()
            .and_then(|state| state.shadow.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Process a block in place at the given sample rate
    ///
    /// Re-prepares and resets the backend when the sample rate, block size,
    /// or channel count differs from the previous call, then drains pending
    /// parameter changes before touching samples.
    pub fn process(&mut self, block: &mut Block, sample_rate: f64) {
        let spec = ProcessSpec::new(sample_rate, block.num_samples(), block.num_channels());

        if self.last_spec != Some(spec) {
            debug!(
                "re-preparing {}: {} Hz, {} samples, {} channels",
                self.backend.name(),
                spec.sample_rate,
                spec.block_size,
                spec.channels
            );
            self.backend.prepare(&spec);
            self.backend.reset();
            self.last_spec = Some(spec);
        }

        self.drain_pending();

        if !block.is_empty() {
            self.backend.process(block);
        }
    }

    /// Clear effect state without changing configuration
    pub fn reset(&mut self) {
        self.drain_pending();
        self.backend.reset();
    }

    fn drain_pending(&mut self) {
        let pending = match self.params.lock() {
            Ok(mut state) => std::mem::take(&mut state.pending),
            Err(_) => return,
        };
        for (index, value) in pending {
            self.backend.set_param(index, value);
        }
    }
}
