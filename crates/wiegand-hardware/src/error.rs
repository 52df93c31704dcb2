//! Error types for input lines and the reader runtime.
//!
//! Configuration problems (missing line names, missing callback, a line that
//! cannot be resolved or configured) surface from reader construction.
//! Runtime line failures end the task that hit them and are logged.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while configuring or reading input lines.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader configuration is incomplete or inconsistent.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// No line with this name exists on the provider.
    #[error("Line not found: {line}")]
    LineNotFound { line: String },

    /// Line is already claimed by another consumer.
    #[error("Line busy: {line}")]
    LineBusy { line: String },

    /// Line exists but could not be configured as requested.
    #[error("Failed to configure line {line}: {message}")]
    ConfigurationError { line: String, message: String },

    /// Line has been disconnected or its event source closed.
    #[error("Line disconnected: {line}")]
    Disconnected { line: String },

    /// Error reported by the GPIO backend.
    #[error("GPIO error: {message}")]
    Gpio { message: String },

    /// Frame decoding contract violation.
    #[error("Decode error: {0}")]
    Decode(#[from] wiegand_core::Error),
}

impl HardwareError {
    /// Create a new invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new line not found error.
    pub fn line_not_found(line: impl Into<String>) -> Self {
        Self::LineNotFound { line: line.into() }
    }

    /// Create a new line busy error.
    pub fn line_busy(line: impl Into<String>) -> Self {
        Self::LineBusy { line: line.into() }
    }

    /// Create a new line configuration error.
    pub fn configuration(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(line: impl Into<String>) -> Self {
        Self::Disconnected { line: line.into() }
    }

    /// Create a new GPIO backend error.
    pub fn gpio(message: impl Into<String>) -> Self {
        Self::Gpio {
            message: message.into(),
        }
    }

    /// Returns true for errors that can only occur during construction.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::LineNotFound { .. }
                | Self::LineBusy { .. }
                | Self::ConfigurationError { .. }
        )
    }
}
