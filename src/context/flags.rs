//! Common and data flags carried by every [`WireContext`](super::WireContext).
//!
//! Both sets are single bytes so they can travel in the message header:
//! ```text
//! common: ┌─────────┬───────────┬───────────────┬──────────┐
//!         │ bit 0   │ bit 1     │ bit 2         │ bits 3-7 │
//!         │ 32-bit  │ BE format │ endian differs│ reserved │
//!         └─────────┴───────────┴───────────────┴──────────┘
//! data:   alignment | int width | refs | cycles | no bulk | reserved (bits 5-7)
//! ```

/// Whether the host stores multi-byte values big-endian.
pub const NATIVE_BIG_ENDIAN: bool = cfg!(target_endian = "big");

/// Whether the host has 32-bit pointers.
pub const NATIVE_BITNESS_32: bool = cfg!(target_pointer_width = "32");

/// Peer platform contract, fixed for a whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommonFlags(u8);

impl CommonFlags {
    /// Word-sized values travel as 4 bytes.
    pub const BITNESS_32: u8 = 0b0000_0001;
    /// Multi-byte values on the wire are big-endian.
    pub const BIG_ENDIAN_FORMAT: u8 = 0b0000_0010;
    /// Wire byte order differs from the host's.
    pub const ENDIANNESS_DIFFERENT: u8 = 0b0000_0100;
    /// Reserved bits mask.
    pub const RESERVED_MASK: u8 = 0b1111_1000;

    /// Flags describing this host's own format.
    pub const fn native() -> Self {
        Self::for_wire(NATIVE_BIG_ENDIAN, NATIVE_BITNESS_32)
    }

    /// Flags for a wire format with the given byte order and word size.
    ///
    /// `ENDIANNESS_DIFFERENT` is derived from the host, never supplied.
    pub const fn for_wire(big_endian: bool, bitness32: bool) -> Self {
        let mut bits = 0;
        if bitness32 {
            bits |= Self::BITNESS_32;
        }
        if big_endian {
            bits |= Self::BIG_ENDIAN_FORMAT;
        }
        if big_endian != NATIVE_BIG_ENDIAN {
            bits |= Self::ENDIANNESS_DIFFERENT;
        }
        Self(bits)
    }

    /// Rebuild flags from header bits written by a peer.
    ///
    /// Returns `None` if reserved bits are set.
    pub const fn from_wire_bits(bits: u8) -> Option<Self> {
        if bits & Self::RESERVED_MASK != 0 {
            return None;
        }
        Some(Self::for_wire(
            bits & Self::BIG_ENDIAN_FORMAT != 0,
            bits & Self::BITNESS_32 != 0,
        ))
    }

    /// Bits to place in a message header (host-relative bit stripped).
    #[inline]
    pub const fn wire_bits(self) -> u8 {
        self.0 & (Self::BITNESS_32 | Self::BIG_ENDIAN_FORMAT)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn bitness32(self) -> bool {
        self.0 & Self::BITNESS_32 != 0
    }

    #[inline]
    pub const fn big_endian_format(self) -> bool {
        self.0 & Self::BIG_ENDIAN_FORMAT != 0
    }

    #[inline]
    pub const fn endianness_different(self) -> bool {
        self.0 & Self::ENDIANNESS_DIFFERENT != 0
    }
}

impl Default for CommonFlags {
    fn default() -> Self {
        Self::native()
    }
}

/// Codec behaviour switches, inherited by every nested value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DataFlags(u8);

impl DataFlags {
    /// Struct alignment may differ between peers.
    pub const ALIGNMENT_MAY_DIFFER: u8 = 0b0000_0001;
    /// Word-sized integers may differ in width; they carry a width tag.
    pub const INTEGER_WIDTH_MAY_DIFFER: u8 = 0b0000_0010;
    /// Reference fields may be encoded.
    pub const ALLOW_REFERENCE_FIELDS: u8 = 0b0000_0100;
    /// Reference identity is tracked (shared and cyclic graphs).
    pub const CHECK_CYCLIC_REFERENCES: u8 = 0b0000_1000;
    /// Never use the bulk copy path.
    pub const DISABLE_BULK_OPTIMIZATION: u8 = 0b0001_0000;
    /// Reserved bits mask.
    pub const RESERVED_MASK: u8 = 0b1110_0000;

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build from raw bits. Returns `None` if reserved bits are set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & Self::RESERVED_MASK != 0 {
            return None;
        }
        Some(Self(bits))
    }

    /// Copy with `flag` added.
    #[inline]
    #[must_use]
    pub const fn with(self, flag: u8) -> Self {
        Self((self.0 | flag) & !Self::RESERVED_MASK)
    }

    /// Copy with `flag` cleared.
    #[inline]
    #[must_use]
    pub const fn without(self, flag: u8) -> Self {
        Self(self.0 & !flag)
    }

    /// Check if a specific flag is set.
    #[inline]
    pub const fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn alignment_may_differ(self) -> bool {
        self.has(Self::ALIGNMENT_MAY_DIFFER)
    }

    #[inline]
    pub const fn integer_width_may_differ(self) -> bool {
        self.has(Self::INTEGER_WIDTH_MAY_DIFFER)
    }

    #[inline]
    pub const fn allow_reference_fields(self) -> bool {
        self.has(Self::ALLOW_REFERENCE_FIELDS)
    }

    #[inline]
    pub const fn check_cyclic_references(self) -> bool {
        self.has(Self::CHECK_CYCLIC_REFERENCES)
    }

    #[inline]
    pub const fn disable_bulk_optimization(self) -> bool {
        self.has(Self::DISABLE_BULK_OPTIMIZATION)
    }
}
