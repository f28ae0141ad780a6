//! Primitive codec - scalars with byte-order and width adaptation.
//!
//! Fixed-width scalars are written as their native bytes, reversed when the
//! wire byte order differs from the host's. Variable-width integers
//! (word-sized counters, [`Var`]) are written at their wire width, preceded
//! by a one-byte width tag when the integer width may differ:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────┐
//! │ width tag        │ payload                      │
//! │ 1 byte (1/2/4/8) │ width bytes, wire byte order │
//! │ INTEGER_WIDTH_   │                              │
//! │ MAY_DIFFER only  │                              │
//! └──────────────────┴──────────────────────────────┘
//! ```
//!
//! A reader whose destination is narrower than the tagged width narrows the
//! value and fails with `ValueOverflow` if it does not fit.

use std::mem::size_of;

use super::{Decoder, Encoder};
use crate::context::WireContext;
use crate::error::{Result, WireError};

/// Largest fixed-width scalar.
const MAX_SCALAR_SIZE: usize = 16;

/// Largest variable-width integer.
pub const MAX_VAR_WIDTH: usize = 8;

/// A fixed-width arithmetic value.
pub trait Scalar: Copy + 'static {
    /// Size in bytes, identical on every platform.
    const SIZE: usize;
    /// Byte order does not apply.
    const ENDIANNESS_TOLERANT: bool = Self::SIZE == 1;

    /// Write native-order bytes into `out` (exactly `SIZE` long).
    fn store(self, out: &mut [u8]);

    /// Read from native-order bytes (exactly `SIZE` long).
    fn load(bytes: &[u8]) -> Result<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = size_of::<$ty>();

                #[inline]
                fn store(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }

                #[inline]
                fn load(bytes: &[u8]) -> Result<Self> {
                    let raw = bytes
                        .try_into()
                        .map_err(|_| WireError::internal("scalar slice has the wrong size"))?;
                    Ok(<$ty>::from_ne_bytes(raw))
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn store(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    fn load(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            _ => Err(WireError::corrupted(format!("invalid bool {bytes:?}"))),
        }
    }
}

impl Scalar for char {
    const SIZE: usize = 4;

    #[inline]
    fn store(self, out: &mut [u8]) {
        u32::from(self).store(out);
    }

    fn load(bytes: &[u8]) -> Result<Self> {
        let code = u32::load(bytes)?;
        char::from_u32(code).ok_or_else(|| WireError::corrupted(format!("invalid char {code:#x}")))
    }
}

#[inline]
fn swaps<T: Scalar>(ctx: &WireContext) -> bool {
    ctx.common_flags.endianness_different() && !T::ENDIANNESS_TOLERANT
}

/// Write a fixed-width scalar.
pub fn write_fixed<T: Scalar>(value: T, enc: &mut Encoder<'_>) -> Result<()> {
    if T::SIZE > MAX_SCALAR_SIZE {
        return Err(WireError::TypeSizeTooBig(T::SIZE));
    }
    let mut raw = [0u8; MAX_SCALAR_SIZE];
    let raw = &mut raw[..T::SIZE];
    value.store(raw);
    if swaps::<T>(enc.context()) {
        raw.reverse();
    }
    enc.put_slice(raw);
    Ok(())
}

/// Read a fixed-width scalar.
pub fn read_fixed<T: Scalar>(dec: &mut Decoder<'_>) -> Result<T> {
    if T::SIZE > MAX_SCALAR_SIZE {
        return Err(WireError::TypeSizeTooBig(T::SIZE));
    }
    let swap = swaps::<T>(dec.context());
    let mut raw = [0u8; MAX_SCALAR_SIZE];
    let raw = &mut raw[..T::SIZE];
    raw.copy_from_slice(dec.take(T::SIZE)?);
    if swap {
        raw.reverse();
    }
    T::load(raw)
}

/// An integer whose width may differ between peers.
pub trait VarWidth: Copy + 'static {
    /// Width of the local representation.
    const NATIVE_WIDTH: usize;
    const SIGNED: bool;

    /// Width written on the wire under `ctx`.
    fn wire_width(ctx: &WireContext) -> usize {
        let _ = ctx;
        Self::NATIVE_WIDTH
    }

    fn widen(self) -> i128;

    /// `None` if `value` is out of range.
    fn narrow(value: i128) -> Option<Self>;
}

macro_rules! impl_var_width {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl VarWidth for $ty {
                const NATIVE_WIDTH: usize = size_of::<$ty>();
                const SIGNED: bool = $signed;

                #[inline]
                fn widen(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn narrow(value: i128) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_var_width!(
    u8 => false, u16 => false, u32 => false, u64 => false, u128 => false,
    i8 => true, i16 => true, i32 => true, i64 => true, i128 => true,
);

macro_rules! impl_word_width {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl VarWidth for $ty {
                const NATIVE_WIDTH: usize = size_of::<$ty>();
                const SIGNED: bool = $signed;

                /// Word-sized values follow the wire's bitness.
                #[inline]
                fn wire_width(ctx: &WireContext) -> usize {
                    ctx.word_width()
                }

                #[inline]
                fn widen(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn narrow(value: i128) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_word_width!(usize => false, isize => true);

/// Explicitly variable-width integer.
///
/// Models a platform-dependent integer (like a C `long`) whose native width
/// is `size_of::<T>()` on this side of the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var<T>(pub T);

/// Fit `value` into `width` bytes as a little-endian image; callers apply
/// the wire byte order.
fn fit(value: i128, width: usize, signed: bool) -> Option<[u8; MAX_VAR_WIDTH]> {
    let bits = (width * 8) as u32;
    let (min, max) = if signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    };
    if value < min || value > max {
        return None;
    }
    let mut out = [0u8; MAX_VAR_WIDTH];
    out.copy_from_slice(&value.to_le_bytes()[..MAX_VAR_WIDTH]);
    Some(out)
}

fn check_width(width: usize) -> Result<()> {
    if width > MAX_VAR_WIDTH {
        return Err(WireError::TypeSizeTooBig(width));
    }
    Ok(())
}

/// Write a variable-width integer.
///
/// Nothing is written if the value does not fit the wire width.
pub fn write_var<T: VarWidth>(value: T, enc: &mut Encoder<'_>) -> Result<()> {
    check_width(T::NATIVE_WIDTH)?;
    let ctx = *enc.context();
    let width = T::wire_width(&ctx);
    check_width(width)?;

    let le = fit(value.widen(), width, T::SIGNED).ok_or(WireError::ValueOverflow { width })?;
    if ctx.data_flags.integer_width_may_differ() {
        enc.put_u8(width as u8);
    }

    let mut payload = [0u8; MAX_VAR_WIDTH];
    let payload = &mut payload[..width];
    payload.copy_from_slice(&le[..width]);
    if ctx.wire_big_endian() {
        payload.reverse();
    }
    enc.put_slice(payload);
    Ok(())
}

/// Read a variable-width integer, widening or narrowing to `T`.
pub fn read_var<T: VarWidth>(dec: &mut Decoder<'_>) -> Result<T> {
    check_width(T::NATIVE_WIDTH)?;
    let ctx = *dec.context();

    let width = if ctx.data_flags.integer_width_may_differ() {
        match dec.get_u8()? {
            tag @ (1 | 2 | 4 | 8) => usize::from(tag),
            tag => return Err(WireError::corrupted(format!("invalid width tag {tag}"))),
        }
    } else {
        T::wire_width(&ctx)
    };
    check_width(width)?;

    let mut le = [0u8; 16];
    le[..width].copy_from_slice(dec.take(width)?);
    if ctx.wire_big_endian() {
        le[..width].reverse();
    }
    if T::SIGNED && le[width - 1] & 0x80 != 0 {
        le[width..].fill(0xFF);
    }

    T::narrow(i128::from_le_bytes(le)).ok_or(WireError::ValueOverflow {
        width: T::NATIVE_WIDTH,
    })
}
