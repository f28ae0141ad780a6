//! Version converter - transcoding through historical layouts.
//!
//! A versioned type declares a [`VersionDescriptor`]: its interface id, the
//! latest version this build knows, and the versions at which its *own*
//! layout last changed, newest first. Each historical layout is a separate
//! snapshot type, linked to the next-older one through [`Versioned`]:
//!
//! ```text
//! private_versions = [2, 1, 0]
//!
//!   RecordV2 ──to_older──▶ RecordV1 ──to_older──▶ RecordV0    (encode)
//!   RecordV2 ◀─from_older─ RecordV1 ◀─from_older─ RecordV0    (decode)
//! ```
//!
//! A negotiated version `t` selects the first entry `<= t`. Index 0 means the
//! compiled layout is still valid (only nested types may have changed);
//! anything further walks one hop and lets the older snapshot's own
//! dispatch continue the walk.
//!
//! # Example
//!
//! ```
//! use polywire::{
//!     from_bytes, to_bytes, wire_record, InterfaceId, VersionDescriptor, Versioned, WireContext,
//! };
//!
//! const ID: InterfaceId = InterfaceId(0x10);
//! const V0: VersionDescriptor = VersionDescriptor::new(ID, 0, &[0]);
//! const V1: VersionDescriptor = VersionDescriptor::new(ID, 1, &[1, 0]);
//!
//! #[derive(Debug, PartialEq)]
//! struct JobV0 { id: u32 }
//! wire_record!(JobV0 { id }, version = V0);
//!
//! #[derive(Debug, PartialEq)]
//! struct Job { id: u32, priority: u8 }
//! wire_record!(Job { id, priority }, version = V1, convert);
//!
//! impl Versioned for Job {
//!     type Older = JobV0;
//!
//!     fn to_older(&self) -> Option<JobV0> {
//!         Some(JobV0 { id: self.id })
//!     }
//!
//!     fn from_older(older: JobV0) -> Option<Self> {
//!         Some(Job { id: older.id, priority: 5 })
//!     }
//! }
//!
//! let old_peer = WireContext::new(0);
//! let bytes = to_bytes(&Job { id: 1, priority: 9 }, old_peer).unwrap();
//! assert_eq!(bytes.len(), 4);
//!
//! let job = from_bytes::<Job>(&bytes, old_peer).unwrap().value;
//! assert_eq!(job, Job { id: 1, priority: 5 });
//! ```

use std::any::type_name;
use std::fmt;

use crate::codec::{self, Decoder, Encoder, Wire};
use crate::error::{Result, WireError};

/// Stable 128-bit identity of a serializable interface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub u128);

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceId({self})")
    }
}

/// Static version metadata of a serializable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub id: InterfaceId,
    /// Highest version known to this build, including nested types.
    pub latest: u32,
    /// Versions at which the type's own layout changed, strictly descending.
    /// The last entry is the origin.
    pub private_versions: &'static [u32],
}

impl VersionDescriptor {
    pub const fn new(id: InterfaceId, latest: u32, private_versions: &'static [u32]) -> Self {
        Self {
            id,
            latest,
            private_versions,
        }
    }

    /// Check the descriptor's internal invariants.
    pub fn validate(&self) -> Result<()> {
        let Some(&newest) = self.private_versions.first() else {
            return Err(WireError::internal(format!("{}: no private versions", self.id)));
        };
        if self.private_versions.windows(2).any(|w| w[0] <= w[1]) {
            return Err(WireError::internal(format!(
                "{}: private versions {:?} are not strictly descending",
                self.id, self.private_versions
            )));
        }
        if self.latest < newest {
            return Err(WireError::internal(format!(
                "{}: latest version {} precedes own layout version {newest}",
                self.id, self.latest
            )));
        }
        Ok(())
    }

    /// Oldest layout version.
    pub fn origin(&self) -> Option<u32> {
        self.private_versions.last().copied()
    }

    /// Index of the layout to use for a peer at version `target`.
    ///
    /// `None` if `target` predates the origin.
    pub fn layout_index(&self, target: u32) -> Option<usize> {
        self.private_versions.iter().position(|&v| v <= target)
    }
}

/// Largest of a set of versions; computes `latest` from a type's own
/// version and its nested types' in const context.
pub const fn latest_of(versions: &[u32]) -> u32 {
    let mut max = 0;
    let mut i = 0;
    while i < versions.len() {
        if versions[i] > max {
            max = versions[i];
        }
        i += 1;
    }
    max
}

/// Link from a layout to the snapshot type of its previous layout.
///
/// Missing conversions surface as [`WireError::NoSuchHandler`].
pub trait Versioned: Wire {
    /// Snapshot of the next-older layout.
    type Older: Wire;

    fn to_older(&self) -> Option<Self::Older> {
        None
    }

    fn from_older(older: Self::Older) -> Option<Self> {
        let _ = older;
        None
    }
}

fn descriptor<T: Wire>() -> Result<&'static VersionDescriptor> {
    T::VERSION.ok_or_else(|| {
        WireError::internal(format!("{} has no version descriptor", type_name::<T>()))
    })
}

/// Pick the layout for `target`. `Ok(None)` means the compiled layout.
fn select_hop(desc: &VersionDescriptor, target: u32) -> Result<Option<(u32, u32)>> {
    match desc.layout_index(target) {
        None => Err(WireError::internal(format!(
            "{}: version {target} predates origin {:?}",
            desc.id,
            desc.origin()
        ))),
        Some(0) => Ok(None),
        Some(_) => Ok(Some((desc.private_versions[0], desc.private_versions[1]))),
    }
}

/// The older snapshot must pick up exactly where this layout's chain continues.
fn check_hop<T: Versioned>(from: u32, to: u32) -> Result<()> {
    let continues = <T::Older as Wire>::VERSION
        .and_then(|older| older.private_versions.first())
        .is_some_and(|&first| first == to);
    if continues {
        Ok(())
    } else {
        Err(WireError::NoSuchHandler { from, to })
    }
}

/// Encode for a target version, converting down the chain as needed.
pub fn encode_converted<T: Versioned>(value: &T, enc: &mut Encoder<'_>) -> Result<()> {
    let desc = descriptor::<T>()?;
    let target = enc.context().interface_version;
    let Some((from, to)) = select_hop(desc, target)? else {
        return codec::encode_layout(value, enc);
    };

    check_hop::<T>(from, to)?;
    let older = value.to_older().ok_or(WireError::NoSuchHandler { from, to })?;
    tracing::trace!(interface = %desc.id, from, to, target, "encoding older layout");
    codec::encode(&older, enc)
}

/// Decode a value written for an older version and lift it to `T`.
pub fn decode_converted<T: Versioned>(dec: &mut Decoder<'_>) -> Result<T> {
    let desc = descriptor::<T>()?;
    let target = dec.context().interface_version;
    let Some((from, to)) = select_hop(desc, target)? else {
        return codec::decode_layout(dec);
    };

    check_hop::<T>(from, to)?;
    let older: T::Older = codec::decode(dec)?;
    tracing::trace!(interface = %desc.id, from = to, to = from, target, "lifting older layout");
    T::from_older(older).ok_or(WireError::NoSuchHandler { from: to, to: from })
}

/// Encoding for types with a single compiled layout and no conversions.
pub fn encode_single_layout<T: Wire>(value: &T, enc: &mut Encoder<'_>) -> Result<()> {
    let desc = descriptor::<T>()?;
    match select_hop(desc, enc.context().interface_version)? {
        None => codec::encode_layout(value, enc),
        Some((from, to)) => Err(WireError::NoSuchHandler { from, to }),
    }
}

/// Decoding counterpart of [`encode_single_layout`].
pub fn decode_single_layout<T: Wire>(dec: &mut Decoder<'_>) -> Result<T> {
    let desc = descriptor::<T>()?;
    match select_hop(desc, dec.context().interface_version)? {
        None => codec::decode_layout(dec),
        Some((from, to)) => Err(WireError::NoSuchHandler { from: to, to: from }),
    }
}
