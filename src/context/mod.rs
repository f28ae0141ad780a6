//! Wire context - configuration threaded through every codec call.
//!
//! A [`WireContext`] is a small `Copy` value describing the negotiated
//! protocol, the target interface version and the peer's platform contract.
//! The mutable parts of an operation (buffer, reference tracker, owned
//! allocations) live in [`Encoder`](crate::Encoder) and
//! [`Decoder`](crate::Decoder), which each own one context.
//!
//! # Example
//!
//! ```
//! use polywire::context::{CommonFlags, DataFlags, WireContext};
//!
//! let ctx = WireContext::new(3)
//!     .with_common_flags(CommonFlags::for_wire(true, true))
//!     .with_data_flags(DataFlags::empty().with(DataFlags::INTEGER_WIDTH_MAY_DIFFER));
//!
//! assert_eq!(ctx.word_width(), 4);
//! assert!(ctx.validate().is_ok());
//! ```

mod config;
mod flags;

pub use config::WireConfig;
pub use flags::{CommonFlags, DataFlags, NATIVE_BIG_ENDIAN, NATIVE_BITNESS_32};

use crate::error::{Result, WireError};

/// Highest wire protocol version this build understands.
pub const MAX_PROTOCOL_VERSION: u16 = 1;

/// Per-operation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireContext {
    /// Negotiated wire protocol version.
    pub protocol_version: u16,
    /// Target schema version for versioned types.
    pub interface_version: u32,
    /// Platform contract of the wire format.
    pub common_flags: CommonFlags,
    /// Codec behaviour switches.
    pub data_flags: DataFlags,
}

impl WireContext {
    /// Context for the host's own format with no data flags.
    pub fn new(interface_version: u32) -> Self {
        Self {
            protocol_version: MAX_PROTOCOL_VERSION,
            interface_version,
            common_flags: CommonFlags::native(),
            data_flags: DataFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_protocol_version(mut self, protocol_version: u16) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    #[must_use]
    pub fn with_interface_version(mut self, interface_version: u32) -> Self {
        self.interface_version = interface_version;
        self
    }

    #[must_use]
    pub fn with_common_flags(mut self, common_flags: CommonFlags) -> Self {
        self.common_flags = common_flags;
        self
    }

    #[must_use]
    pub fn with_data_flags(mut self, data_flags: DataFlags) -> Self {
        self.data_flags = data_flags;
        self
    }

    /// Check the protocol version against this build.
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version > MAX_PROTOCOL_VERSION {
            return Err(WireError::UnsupportedProtocol {
                requested: self.protocol_version,
                supported: MAX_PROTOCOL_VERSION,
            });
        }
        Ok(())
    }

    /// Width in bytes of word-sized integers on the wire.
    #[inline]
    pub fn word_width(&self) -> usize {
        if self.common_flags.bitness32() {
            4
        } else {
            8
        }
    }

    /// Whether multi-byte values on the wire are big-endian.
    #[inline]
    pub fn wire_big_endian(&self) -> bool {
        NATIVE_BIG_ENDIAN != self.common_flags.endianness_different()
    }
}

impl Default for WireContext {
    fn default() -> Self {
        Self::new(0)
    }
}
