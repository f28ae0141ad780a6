//! Body codec - recursive encode/decode of typed values.
//!
//! Every serializable type implements [`Wire`]: one function pair producing
//! and consuming its fields, plus compile-time constants describing its
//! shape, fast-path eligibility and version metadata. From those constants
//! and the [`WireContext`] flags a [`Strategy`] is chosen once per value:
//!
//! | Strategy | When | Wire image |
//! |---|---|---|
//! | `Skip` | zero-sized marker types | nothing |
//! | `Convert` | `VERSION.latest != interface_version` | nearest compatible historical layout |
//! | `Scalar` | integers, floats, `bool`, `char` | fixed or width-tagged bytes |
//! | `Reference` | `Option<Handle<T>>`, `Option<Box<T>>` | null flag or graph sentinel |
//! | `Bulk` | layout-compatible aggregates | raw native bytes, one copy |
//! | `Fields` | everything else | fields in declared order |
//!
//! # Example
//!
//! ```
//! use polywire::{from_bytes, to_bytes, wire_record, WireContext};
//!
//! #[derive(Debug, PartialEq)]
//! struct Reading {
//!     sensor: u16,
//!     values: Vec<i32>,
//!     label: String,
//! }
//!
//! wire_record!(Reading { sensor, values, label });
//!
//! let ctx = WireContext::new(0);
//! let reading = Reading { sensor: 3, values: vec![-1, 2], label: "t0".into() };
//!
//! let bytes = to_bytes(&reading, ctx).unwrap();
//! let decoded = from_bytes::<Reading>(&bytes, ctx).unwrap();
//! assert_eq!(decoded.value, reading);
//! ```

mod bulk;
mod decoder;
mod encoder;
mod macros;
mod primitive;
mod reference;
mod std_impls;

pub use bulk::read_bulk;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use primitive::{read_fixed, read_var, write_fixed, write_var, Scalar, Var, VarWidth};

use std::any::type_name;

use bytes::Bytes;

use crate::context::{WireContext, NATIVE_BITNESS_32};
use crate::error::{Result, WireError};
use crate::graph::ObjectArena;
use crate::version::{self, VersionDescriptor};

/// Structural category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Zero-sized marker; nothing on the wire.
    Empty,
    /// Arithmetic value handled by the primitive codec.
    Scalar,
    /// Nullable pointer to another value.
    Reference,
    /// Record or sequence of other values.
    Aggregate,
}

/// Conditions under which a type's native memory image may be copied as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkSafety {
    Never,
    Always,
    /// Layout only depends on alignment rules.
    WhenAlignmentFixed,
    /// Layout only depends on integer widths.
    WhenBytePacked,
    WhenAlignmentFixedAndBytePacked,
}

impl BulkSafety {
    /// Whether the tag allows bulk copy given the peer's tolerances.
    pub fn allows(self, alignment_may_differ: bool, width_may_differ: bool) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::WhenAlignmentFixed => !alignment_may_differ,
            Self::WhenBytePacked => !width_may_differ,
            Self::WhenAlignmentFixedAndBytePacked => !alignment_may_differ && !width_may_differ,
        }
    }
}

/// A serializable type.
///
/// `encode_body` and `decode_body` describe the type's own layout; the
/// dispatcher in [`encode`]/[`decode`] decides when they are called.
/// Aggregates usually write them with [`wire_record!`](crate::wire_record).
pub trait Wire: Sized + 'static {
    const SHAPE: Shape = Shape::Aggregate;
    const BULK: BulkSafety = BulkSafety::Never;
    /// Bulk images stay valid when byte order differs (single bytes only).
    const ENDIANNESS_TOLERANT: bool = false;
    const VERSION: Option<&'static VersionDescriptor> = None;

    /// Write this value's fields in declared order.
    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()>;

    /// Read a value laid out by [`encode_body`](Self::encode_body).
    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self>;

    /// Native byte image of a contiguous run, if the type supports bulk copy.
    fn bulk_bytes(items: &[Self]) -> Option<&[u8]> {
        let _ = items;
        None
    }

    /// Rebuild a run from its native byte image.
    fn from_bulk_bytes(bytes: &[u8]) -> Option<Vec<Self>> {
        let _ = bytes;
        None
    }

    /// Encode when the negotiated version differs from `VERSION.latest`.
    fn encode_converted(&self, enc: &mut Encoder<'_>) -> Result<()> {
        version::encode_single_layout(self, enc)
    }

    /// Decode when the negotiated version differs from `VERSION.latest`.
    fn decode_converted(dec: &mut Decoder<'_>) -> Result<Self> {
        version::decode_single_layout(dec)
    }
}

/// Encoding path selected for one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Skip,
    Convert,
    Scalar,
    Reference,
    Bulk,
    Fields,
}

impl Strategy {
    /// Full dispatch, including the version check.
    pub fn select<T: Wire>(ctx: &WireContext) -> Self {
        if matches!(T::SHAPE, Shape::Empty) {
            return Self::Skip;
        }
        match T::VERSION {
            Some(desc) if desc.latest != ctx.interface_version => Self::Convert,
            _ => Self::for_layout::<T>(ctx),
        }
    }

    /// Dispatch for `T`'s compiled layout, ignoring version metadata.
    pub fn for_layout<T: Wire>(ctx: &WireContext) -> Self {
        match T::SHAPE {
            Shape::Empty => Self::Skip,
            Shape::Scalar => Self::Scalar,
            Shape::Reference => Self::Reference,
            Shape::Aggregate if bulk_eligible::<T>(ctx) => Self::Bulk,
            Shape::Aggregate => Self::Fields,
        }
    }
}

/// Whether values of `T` may be copied as raw memory under `ctx`.
pub fn bulk_eligible<T: Wire>(ctx: &WireContext) -> bool {
    let flags = ctx.data_flags;
    if flags.disable_bulk_optimization() {
        return false;
    }
    if ctx.common_flags.endianness_different() && !T::ENDIANNESS_TOLERANT {
        return false;
    }
    let width_may_differ =
        flags.integer_width_may_differ() || ctx.common_flags.bitness32() != NATIVE_BITNESS_32;
    if !T::BULK.allows(flags.alignment_may_differ(), width_may_differ) {
        return false;
    }
    T::VERSION.map_or(true, |desc| desc.latest <= ctx.interface_version)
}

/// Encode a value with full dispatch.
pub fn encode<T: Wire>(value: &T, enc: &mut Encoder<'_>) -> Result<()> {
    match Strategy::select::<T>(enc.context()) {
        Strategy::Convert => value.encode_converted(enc),
        strategy => encode_as(value, strategy, enc),
    }
}

/// Encode with `T`'s compiled layout, skipping version conversion.
pub fn encode_layout<T: Wire>(value: &T, enc: &mut Encoder<'_>) -> Result<()> {
    let strategy = Strategy::for_layout::<T>(enc.context());
    encode_as(value, strategy, enc)
}

fn encode_as<T: Wire>(value: &T, strategy: Strategy, enc: &mut Encoder<'_>) -> Result<()> {
    match strategy {
        Strategy::Skip => Ok(()),
        Strategy::Bulk => match bulk::encode_run(std::slice::from_ref(value), enc) {
            Err(WireError::UnsupportedSettingsForType) => {
                tracing::trace!(value_type = type_name::<T>(), "bulk copy unavailable, encoding fields");
                value.encode_body(enc)
            }
            other => other,
        },
        Strategy::Reference if !enc.context().data_flags.allow_reference_fields() => {
            Err(WireError::UnsupportedSettingsForType)
        }
        Strategy::Convert | Strategy::Scalar | Strategy::Reference | Strategy::Fields => {
            value.encode_body(enc)
        }
    }
}

/// Decode a value with full dispatch.
pub fn decode<T: Wire>(dec: &mut Decoder<'_>) -> Result<T> {
    match Strategy::select::<T>(dec.context()) {
        Strategy::Convert => T::decode_converted(dec),
        strategy => decode_as(strategy, dec),
    }
}

/// Decode with `T`'s compiled layout, skipping version conversion.
pub fn decode_layout<T: Wire>(dec: &mut Decoder<'_>) -> Result<T> {
    let strategy = Strategy::for_layout::<T>(dec.context());
    decode_as(strategy, dec)
}

fn decode_as<T: Wire>(strategy: Strategy, dec: &mut Decoder<'_>) -> Result<T> {
    match strategy {
        Strategy::Bulk => match bulk::decode_run::<T>(1, dec) {
            Ok(mut run) => run
                .pop()
                .ok_or_else(|| WireError::internal("bulk run returned no value")),
            Err(WireError::UnsupportedSettingsForType) => {
                tracing::trace!(value_type = type_name::<T>(), "bulk copy unavailable, decoding fields");
                T::decode_body(dec)
            }
            Err(e) => Err(e),
        },
        Strategy::Reference if !dec.context().data_flags.allow_reference_fields() => {
            Err(WireError::UnsupportedSettingsForType)
        }
        // Narrowing failures are a property of the input, not of the caller.
        Strategy::Scalar => T::decode_body(dec).map_err(|e| match e {
            WireError::ValueOverflow { width } => WireError::DataCorrupted(format!(
                "{} does not fit in {width} bytes",
                type_name::<T>()
            )),
            other => other,
        }),
        Strategy::Skip | Strategy::Convert | Strategy::Reference | Strategy::Fields => {
            T::decode_body(dec)
        }
    }
}

/// Encode a contiguous run, as one bulk copy when the element type allows it.
pub fn encode_seq<T: Wire>(items: &[T], enc: &mut Encoder<'_>) -> Result<()> {
    if !items.is_empty() && runs_in_bulk::<T>(enc.context()) {
        match bulk::encode_run(items, enc) {
            Err(WireError::UnsupportedSettingsForType) => {}
            other => return other,
        }
    }
    items.iter().try_for_each(|item| encode(item, enc))
}

/// Decode `count` values written by [`encode_seq`].
pub fn decode_seq<T: Wire>(count: usize, dec: &mut Decoder<'_>) -> Result<Vec<T>> {
    if count > 0 && runs_in_bulk::<T>(dec.context()) {
        match bulk::decode_run::<T>(count, dec) {
            Err(WireError::UnsupportedSettingsForType) => {}
            other => return other,
        }
    }
    if zero_sized::<T>() {
        if count > MAX_ZERO_SIZED_RUN {
            return Err(WireError::corrupted(format!(
                "sequence of {count} zero-sized elements exceeds {MAX_ZERO_SIZED_RUN}"
            )));
        }
    } else if count > dec.remaining() {
        return Err(WireError::corrupted(format!(
            "sequence of {count} elements exceeds the {} remaining bytes",
            dec.remaining()
        )));
    }

    let mut out = Vec::new();
    out.try_reserve_exact(count).map_err(|_| WireError::NoMemory)?;
    for _ in 0..count {
        out.push(decode(dec)?);
    }
    Ok(out)
}

/// Longest run of elements that may occupy no input bytes.
pub const MAX_ZERO_SIZED_RUN: usize = 1 << 20;

/// Elements that can decode without consuming input, so the remaining
/// length does not bound their count.
fn zero_sized<T: Wire>() -> bool {
    std::mem::size_of::<T>() == 0 || matches!(T::SHAPE, Shape::Empty)
}

fn runs_in_bulk<T: Wire>(ctx: &WireContext) -> bool {
    matches!(T::SHAPE, Shape::Scalar | Shape::Aggregate) && bulk_eligible::<T>(ctx)
}

/// Result of a top-level decode.
#[derive(Debug)]
pub struct Decoded<T> {
    pub value: T,
    /// Objects allocated for reference fields; owned by the caller.
    pub arena: ObjectArena,
    /// Bytes consumed from the input.
    pub consumed: usize,
}

/// Encode a value that holds no arena handles.
pub fn to_bytes<T: Wire>(value: &T, ctx: WireContext) -> Result<Bytes> {
    let mut enc = Encoder::new(ctx)?;
    enc.field(value)?;
    Ok(enc.finish())
}

/// Encode a value whose handles point into `arena`.
pub fn to_bytes_in<T: Wire>(value: &T, arena: &ObjectArena, ctx: WireContext) -> Result<Bytes> {
    let mut enc = Encoder::new(ctx)?.with_arena(arena);
    enc.field(value)?;
    Ok(enc.finish())
}

/// Decode one value from the start of `input`.
pub fn from_bytes<T: Wire>(input: &[u8], ctx: WireContext) -> Result<Decoded<T>> {
    let mut dec = Decoder::new(input, ctx)?;
    let value = dec.field()?;
    let consumed = dec.position();
    Ok(Decoded {
        value,
        arena: dec.finish(),
        consumed,
    })
}
