//! Error handling for Stompbox
//!
//! Internal APIs return `Result<T>`; the C boundary in `ffi` flattens every
//! error to a null handle or zero value, so nothing here crosses the ABI.

use thiserror::Error;

/// Result type alias for Stompbox operations
pub type Result<T> = std::result::Result<T, StompboxError>;

/// Main error type for Stompbox operations
#[derive(Error, Debug)]
pub enum StompboxError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("Unknown effect: {name}")]
    UnknownEffect { name: String },

    #[error("Plugin load failed: {path}: {reason}")]
    PluginLoad { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StompboxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StompboxError::FileNotFound { .. } => "FILE_NOT_FOUND",
            StompboxError::InvalidAudio { .. } => "INVALID_AUDIO",
            StompboxError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            StompboxError::EmptyAudio => "EMPTY_AUDIO",
            StompboxError::UnknownEffect { .. } => "UNKNOWN_EFFECT",
            StompboxError::PluginLoad { .. } => "PLUGIN_LOAD",
            StompboxError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StompboxError::FileNotFound {
            path: "test.wav".to_string(),
        };
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");

        let err = StompboxError::UnknownEffect {
            name: "NotAnEffect".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_EFFECT");
    }

    #[test]
    fn test_error_display() {
        let err = StompboxError::UnknownEffect {
            name: "Flanger".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown effect: Flanger");
    }
}
