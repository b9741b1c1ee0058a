//! Plugin hosting
//!
//! External effects are reached through the [`HostedPlugin`] trait, and
//! plugin files are opened by [`PluginFormat`] implementations looked up in
//! a process-wide registry. The library ships no formats of its own; hosts
//! register their loaders with [`register_format`] after calling [`init`].

use std::path::Path;
use std::sync::{OnceLock, RwLock};

use log::{debug, info};

use crate::engine::{Block, ProcessSpec};
use crate::error::{Result, StompboxError};

/// A loaded external effect instance
///
/// Mirrors the built-in effect contract: normalized [0, 1] parameters,
/// prepare/reset lifecycle, in-place block processing. The extra
/// `notify_host_param` hook lets formats forward setter traffic to the
/// plugin's own automation listeners.
pub trait HostedPlugin: Send + Sync {
    /// Display name reported by the plugin
    fn name(&self) -> &str;

    /// Number of exposed parameters
    fn param_count(&self) -> usize;

    /// Set a parameter from its normalized value; unknown indices are no-ops
    fn set_param(&mut self, index: usize, normalized: f32);

    /// Get a parameter's normalized value (0.0 for unknown indices)
    fn get_param(&self, index: usize) -> f32;

    /// Tell the plugin's automation listeners a value changed
    ///
    /// Called by the processor after each applied `set_param` so host-side
    /// UIs observe the same edits the audio thread does.
    fn notify_host_param(&mut self, _index: usize, _normalized: f32) {}

    /// (Re)initialize for a block configuration
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Clear internal state
    fn reset(&mut self);

    /// Transform a block in place
    fn process(&mut self, block: &mut Block);
}

/// A loader that can open plugin files of one format
pub trait PluginFormat: Send + Sync {
    /// Format name for diagnostics
    fn name(&self) -> &str;

    /// Whether the file looks like this format (extension or magic check)
    fn can_load(&self, path: &Path) -> bool;

    /// Open the file and instantiate its first effect
    fn load(&self, path: &Path, spec: &ProcessSpec) -> Result<Box<dyn HostedPlugin>>;
}

/// Registered formats, in registration order
static FORMATS: OnceLock<RwLock<Vec<Box<dyn PluginFormat>>>> = OnceLock::new();

fn formats() -> &'static RwLock<Vec<Box<dyn PluginFormat>>> {
    FORMATS.get_or_init(|| RwLock::new(Vec::new()))
}

/// Initialize the hosting subsystem
///
/// Idempotent: safe to call any number of times, from any thread. Later
/// calls are no-ops.
pub fn init() {
    static STARTED: OnceLock<()> = OnceLock::new();
    STARTED.get_or_init(|| {
        formats();
        debug!("plugin host initialized");
    });
}

/// Register a plugin format loader
///
/// Formats are consulted in registration order by [`load_plugin`].
pub fn register_format(format: Box<dyn PluginFormat>) {
    init();
    info!("registering plugin format: {}", format.name());
    if let Ok(mut registry) = formats().write() {
        registry.push(format);
    }
}

/// Load the first effect from a plugin file
///
/// Tries each registered format that claims the file. Fails if the file does
/// not exist, no format claims it, or every claiming format fails to open it.
pub fn load_plugin(path: &Path, spec: &ProcessSpec) -> Result<Box<dyn HostedPlugin>> {
    init();

    if !path.exists() {
        return Err(StompboxError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let registry = formats().read().map_err(|_| StompboxError::PluginLoad {
        path: path.display().to_string(),
        reason: "plugin format registry poisoned".to_string(),
    })?;

    let mut last_error = None;
    for format in registry.iter() {
        if !format.can_load(path) {
            continue;
        }
        debug!(
            "trying format {} for {}",
            format.name(),
            path.display()
        );
        match format.load(path, spec) {
            Ok(plugin) => {
                info!("loaded plugin {} from {}", plugin.name(), path.display());
                return Ok(plugin);
            }
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.unwrap_or_else(|| StompboxError::PluginLoad {
        path: path.display().to_string(),
        reason: "no registered format recognizes this file".to_string(),
    }))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Mock format used by processor and factory tests

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Minimal hosted effect: one gain parameter, counts host notifications
    pub struct MockPlugin {
        values: Vec<f32>,
        pub notifications: Arc<AtomicUsize>,
        prepared: Option<ProcessSpec>,
    }

    impl MockPlugin {
        pub fn new(notifications: Arc<AtomicUsize>) -> Self {
            Self {
                values: vec![0.5],
                notifications,
                prepared: None,
            }
        }
    }

    impl HostedPlugin for MockPlugin {
        fn name(&self) -> &str {
            "MockGain"
        }

        fn param_count(&self) -> usize {
            self.values.len()
        }

        fn set_param(&mut self, index: usize, normalized: f32) {
            if let Some(value) = self.values.get_mut(index) {
                *value = normalized.clamp(0.0, 1.0);
            }
        }

        fn get_param(&self, index: usize) -> f32 {
            self.values.get(index).copied().unwrap_or(0.0)
        }

        fn notify_host_param(&mut self, _index: usize, _normalized: f32) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
        }

        fn prepare(&mut self, spec: &ProcessSpec) {
            self.prepared = Some(*spec);
        }

        fn reset(&mut self) {}

        fn process(&mut self, block: &mut Block) {
            // Parameter 0 maps linearly to gain [0, 2]
            let gain = self.values[0] * 2.0;
            for ch in 0..block.num_channels() {
                for sample in block.channel_mut(ch).iter_mut() {
                    *sample *= gain;
                }
            }
        }
    }

    /// Format that claims `.mock` files
    pub struct MockFormat {
        pub notifications: Arc<AtomicUsize>,
    }

    impl PluginFormat for MockFormat {
        fn name(&self) -> &str {
            "mock"
        }

        fn can_load(&self, path: &Path) -> bool {
            path.extension().map(|e| e == "mock").unwrap_or(false)
        }

        fn load(&self, _path: &Path, spec: &ProcessSpec) -> Result<Box<dyn HostedPlugin>> {
            let mut plugin = MockPlugin::new(self.notifications.clone());
            plugin.prepare(spec);
            Ok(Box::new(plugin))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        init();
    }

    #[test]
    fn test_load_plugin_missing_file() {
        let result = load_plugin(
            &PathBuf::from("/nonexistent/effect.so"),
            &ProcessSpec::default(),
        );
        assert!(matches!(result, Err(StompboxError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_plugin_unrecognized_file() {
        // A real file no format claims
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = load_plugin(file.path(), &ProcessSpec::default());
        assert!(matches!(result, Err(StompboxError::PluginLoad { .. })));
    }
}
