//! # polywire
//!
//! Binary wire codec for typed values exchanged between heterogeneous
//! peers: different byte orders, word sizes and schema versions.
//!
//! ## Architecture
//!
//! - **Context** ([`WireContext`]): negotiated protocol/interface version and
//!   the peer's platform flags, fixed for one encode/decode call
//! - **Primitive codec**: scalars with byte swapping and width tags
//! - **Body codec** ([`Wire`]): per-type strategy (bulk copy, fields,
//!   references, version conversion)
//! - **Reference tracking**: shared and cyclic graphs through an
//!   [`ObjectArena`]
//! - **Version converter** ([`Versioned`]): walks historical layouts
//!
//! ## Example
//!
//! ```
//! use polywire::context::{CommonFlags, NATIVE_BIG_ENDIAN};
//! use polywire::{from_bytes, to_bytes, wire_record, WireContext};
//!
//! #[derive(Debug, PartialEq)]
//! struct Sample {
//!     channel: u8,
//!     value: u32,
//! }
//!
//! wire_record!(Sample { channel, value });
//!
//! // A peer with the opposite byte order.
//! let ctx = WireContext::new(0)
//!     .with_common_flags(CommonFlags::for_wire(!NATIVE_BIG_ENDIAN, false));
//!
//! let bytes = to_bytes(&Sample { channel: 1, value: 2 }, ctx).unwrap();
//! let sample = from_bytes::<Sample>(&bytes, ctx).unwrap().value;
//! assert_eq!(sample, Sample { channel: 1, value: 2 });
//! ```

pub mod codec;
pub mod context;
pub mod error;
pub mod graph;
pub mod protocol;
pub mod version;

#[doc(hidden)]
pub mod __private {
    pub use zerocopy;
}

pub use codec::{
    from_bytes, to_bytes, to_bytes_in, BulkSafety, Decoded, Decoder, Encoder, Shape, Strategy,
    Var, Wire,
};
pub use context::{WireConfig, WireContext};
pub use error::{Result, WireError};
pub use graph::{Handle, ObjectArena};
pub use version::{InterfaceId, VersionDescriptor, Versioned};
