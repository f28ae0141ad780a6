//! JSON configuration for building a [`WireContext`].
//!
//! # Example
//!
//! ```
//! use polywire::context::WireConfig;
//!
//! let config = WireConfig::from_json(r#"{
//!     "interface_version": 2,
//!     "bitness32": true,
//!     "integer_width_may_differ": true
//! }"#).unwrap();
//!
//! let ctx = config.to_context().unwrap();
//! assert_eq!(ctx.interface_version, 2);
//! assert_eq!(ctx.word_width(), 4);
//! ```

use serde::{Deserialize, Serialize};

use super::{
    CommonFlags, DataFlags, WireContext, MAX_PROTOCOL_VERSION, NATIVE_BIG_ENDIAN, NATIVE_BITNESS_32,
};
use crate::error::Result;

/// Serializable form of a [`WireContext`].
///
/// Every field is optional in JSON. Peer endianness and bitness default to
/// the host's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    pub protocol_version: u16,
    pub interface_version: u32,
    /// Wire byte order; `None` means native.
    pub big_endian: Option<bool>,
    /// 32-bit word size on the wire; `None` means native.
    pub bitness32: Option<bool>,
    pub alignment_may_differ: bool,
    pub integer_width_may_differ: bool,
    pub allow_reference_fields: bool,
    pub check_cyclic_references: bool,
    pub disable_bulk_optimization: bool,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            protocol_version: MAX_PROTOCOL_VERSION,
            interface_version: 0,
            big_endian: None,
            bitness32: None,
            alignment_may_differ: false,
            integer_width_may_differ: false,
            allow_reference_fields: false,
            check_cyclic_references: false,
            disable_bulk_optimization: false,
        }
    }
}

impl WireConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or has wrongly typed fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build and validate the context.
    pub fn to_context(&self) -> Result<WireContext> {
        let common = CommonFlags::for_wire(
            self.big_endian.unwrap_or(NATIVE_BIG_ENDIAN),
            self.bitness32.unwrap_or(NATIVE_BITNESS_32),
        );

        let switches = [
            (self.alignment_may_differ, DataFlags::ALIGNMENT_MAY_DIFFER),
            (self.integer_width_may_differ, DataFlags::INTEGER_WIDTH_MAY_DIFFER),
            (self.allow_reference_fields, DataFlags::ALLOW_REFERENCE_FIELDS),
            (self.check_cyclic_references, DataFlags::CHECK_CYCLIC_REFERENCES),
            (self.disable_bulk_optimization, DataFlags::DISABLE_BULK_OPTIMIZATION),
        ];
        let data = switches
            .iter()
            .filter(|(on, _)| *on)
            .fold(DataFlags::empty(), |flags, (_, flag)| flags.with(*flag));

        let ctx = WireContext {
            protocol_version: self.protocol_version,
            interface_version: self.interface_version,
            common_flags: common,
            data_flags: data,
        };
        ctx.validate()?;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;

    #[test]
    fn test_empty_json_is_native_context() {
        let config = WireConfig::from_json("{}").unwrap();
        assert_eq!(config, WireConfig::default());
        assert_eq!(config.to_context().unwrap(), WireContext::new(0));
    }

    #[test]
    fn test_all_flags() {
        let config = WireConfig::from_json(
            r#"{
                "interface_version": 7,
                "alignment_may_differ": true,
                "integer_width_may_differ": true,
                "allow_reference_fields": true,
                "check_cyclic_references": true,
                "disable_bulk_optimization": true
            }"#,
        )
        .unwrap();

        let ctx = config.to_context().unwrap();
        assert_eq!(ctx.interface_version, 7);
        assert_eq!(ctx.data_flags.bits(), 0x1F);
    }

    #[test]
    fn test_foreign_endianness() {
        let config = WireConfig {
            big_endian: Some(!NATIVE_BIG_ENDIAN),
            ..WireConfig::default()
        };
        let ctx = config.to_context().unwrap();
        assert!(ctx.common_flags.endianness_different());
    }

    #[test]
    fn test_invalid_json() {
        let err = WireConfig::from_json(r#"{"interface_version": "two"}"#).unwrap_err();
        assert!(matches!(err, WireError::Json(_)));
    }

    #[test]
    fn test_unsupported_protocol() {
        let config = WireConfig {
            protocol_version: MAX_PROTOCOL_VERSION + 1,
            ..WireConfig::default()
        };
        assert!(config.to_context().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = WireConfig {
            interface_version: 4,
            bitness32: Some(true),
            allow_reference_fields: true,
            ..WireConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(WireConfig::from_json(&json).unwrap(), config);
    }
}
