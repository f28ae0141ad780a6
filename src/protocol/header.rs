//! Message header encoding and decoding.
//!
//! The body codec emits no framing; each message carries this fixed
//! 25-byte header once, describing how the body was written:
//!
//! ```text
//! ┌──────────┬──────┬────────┬──────┬──────────────┬───────────┐
//! │ Protocol │ Kind │ Common │ Data │ Interface ID │ Interface │
//! │ version  │      │ flags  │ flags│              │ version   │
//! │ 2 bytes  │ 1    │ 1      │ 1    │ 16 bytes     │ 4 bytes   │
//! │ u16 BE   │      │        │      │ u128 BE      │ u32 BE    │
//! └──────────┴──────┴────────┴──────┴──────────────┴───────────┘
//! ```
//!
//! All multi-byte integers are big-endian regardless of the body format.
//! Common flags carry only the writer's word size and byte order; whether
//! that differs from the reader is derived on decode.

use crate::context::{CommonFlags, DataFlags, WireContext, MAX_PROTOCOL_VERSION};
use crate::error::{Result, WireError};
use crate::version::InterfaceId;

/// Encoded size of a [`MessageHeader`].
pub const HEADER_SIZE: usize = 25;

/// Decoded message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub protocol_version: u16,
    /// Caller-defined message kind.
    pub kind: u8,
    /// Wire bits of [`CommonFlags`].
    pub common_flags: u8,
    /// Bits of [`DataFlags`].
    pub data_flags: u8,
    /// Interface of the body, `InterfaceId(0)` when unversioned.
    pub interface_id: InterfaceId,
    pub interface_version: u32,
}

impl MessageHeader {
    /// Header describing a body written under `ctx`.
    pub fn from_context(ctx: &WireContext, kind: u8, interface_id: InterfaceId) -> Self {
        Self {
            protocol_version: ctx.protocol_version,
            kind,
            common_flags: ctx.common_flags.wire_bits(),
            data_flags: ctx.data_flags.bits(),
            interface_id,
            interface_version: ctx.interface_version,
        }
    }

    /// Serialize into a fresh 25-byte array.
    ///
    /// # Example
    ///
    /// ```
    /// use polywire::protocol::{MessageHeader, HEADER_SIZE};
    /// use polywire::{InterfaceId, WireContext};
    ///
    /// let header = MessageHeader::from_context(&WireContext::new(3), 1, InterfaceId(9));
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), HEADER_SIZE);
    /// assert_eq!(MessageHeader::decode(&bytes), Some(header));
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Write the header into the first `HEADER_SIZE` bytes of `buf`.
    ///
    /// # Panics
    ///
    /// Panics when `buf` cannot hold a full header.
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0..2].copy_from_slice(&self.protocol_version.to_be_bytes());
        buf[2] = self.kind;
        buf[3] = self.common_flags;
        buf[4] = self.data_flags;
        buf[5..21].copy_from_slice(&self.interface_id.0.to_be_bytes());
        buf[21..25].copy_from_slice(&self.interface_version.to_be_bytes());
    }

    /// Parse the leading header of `buf`; trailing bytes are ignored.
    ///
    /// `None` when fewer than `HEADER_SIZE` bytes are available.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let buf: &[u8; HEADER_SIZE] = buf.get(..HEADER_SIZE)?.try_into().ok()?;
        let (id, version) = (&buf[5..21], &buf[21..25]);
        Some(Self {
            protocol_version: u16::from_be_bytes([buf[0], buf[1]]),
            kind: buf[2],
            common_flags: buf[3],
            data_flags: buf[4],
            interface_id: InterfaceId(u128::from_be_bytes(id.try_into().ok()?)),
            interface_version: u32::from_be_bytes(version.try_into().ok()?),
        })
    }

    /// Reject headers this build cannot decode a body for: a protocol
    /// newer than `MAX_PROTOCOL_VERSION`, or reserved bits in either
    /// flag byte.
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version > MAX_PROTOCOL_VERSION {
            return Err(WireError::UnsupportedProtocol {
                requested: self.protocol_version,
                supported: MAX_PROTOCOL_VERSION,
            });
        }
        if CommonFlags::from_wire_bits(self.common_flags).is_none() {
            return Err(WireError::Protocol(format!(
                "reserved common flag bits set: {:#04x}",
                self.common_flags
            )));
        }
        if DataFlags::from_bits(self.data_flags).is_none() {
            return Err(WireError::Protocol(format!(
                "reserved data flag bits set: {:#04x}",
                self.data_flags
            )));
        }
        Ok(())
    }

    /// Context for decoding the body this header describes.
    pub fn to_context(&self) -> Result<WireContext> {
        self.validate()?;
        let common = CommonFlags::from_wire_bits(self.common_flags)
            .ok_or_else(|| WireError::Protocol("invalid common flags".to_string()))?;
        let data = DataFlags::from_bits(self.data_flags)
            .ok_or_else(|| WireError::Protocol("invalid data flags".to_string()))?;
        Ok(WireContext::new(self.interface_version)
            .with_protocol_version(self.protocol_version)
            .with_common_flags(common)
            .with_data_flags(data))
    }
}
