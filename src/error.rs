//! Error types for polywire.

use thiserror::Error;

/// Main error type for all encode/decode operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// Malformed or inconsistent input bytes.
    #[error("Data corrupted: {0}")]
    DataCorrupted(String),

    /// A value does not fit the width negotiated for it.
    #[error("Value does not fit in {width} bytes")]
    ValueOverflow { width: usize },

    /// A type was reached under flags that forbid its encoding strategy.
    #[error("Type is not supported under the current settings")]
    UnsupportedSettingsForType,

    /// Allocation failed while reconstructing a value.
    #[error("Out of memory")]
    NoMemory,

    /// A variable-width integer is wider than 8 bytes.
    #[error("Type size {0} exceeds the 8-byte limit")]
    TypeSizeTooBig(usize),

    /// Library or type contract violation.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A conversion between two historical layouts is not declared.
    #[error("No conversion declared from version {from} to version {to}")]
    NoSuchHandler { from: u32, to: u32 },

    /// Protocol version newer than this build supports.
    #[error("Protocol version {requested} is not supported (max {supported})")]
    UnsupportedProtocol { requested: u16, supported: u16 },

    /// Invalid message header.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON configuration error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WireError {
    /// Shorthand for [`WireError::DataCorrupted`].
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        Self::DataCorrupted(msg.into())
    }

    /// Shorthand for [`WireError::Internal`].
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error is a contract violation rather than a data problem.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TypeSizeTooBig(_) | Self::Internal(_) | Self::NoSuchHandler { .. }
        )
    }
}

/// Result type alias using WireError.
pub type Result<T> = std::result::Result<T, WireError>;
