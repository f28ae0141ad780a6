//! [`Wire`] implementations for standard types.

use std::marker::PhantomData;

use super::primitive::{read_fixed, read_var, write_fixed, write_var, Var, VarWidth};
use super::{decode_seq, encode_seq, BulkSafety, Decoder, Encoder, Shape, Wire};
use crate::error::{Result, WireError};

macro_rules! impl_wire_fixed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Wire for $ty {
                const SHAPE: Shape = Shape::Scalar;
                const BULK: BulkSafety = BulkSafety::Always;
                const ENDIANNESS_TOLERANT: bool = std::mem::size_of::<$ty>() == 1;

                #[inline]
                fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
                    write_fixed(*self, enc)
                }

                #[inline]
                fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
                    read_fixed(dec)
                }

                crate::bulk_hooks!();
            }
        )*
    };
}

impl_wire_fixed!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// Validated on load, so never copied in bulk.
macro_rules! impl_wire_checked {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Wire for $ty {
                const SHAPE: Shape = Shape::Scalar;

                #[inline]
                fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
                    write_fixed(*self, enc)
                }

                #[inline]
                fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
                    read_fixed(dec)
                }
            }
        )*
    };
}

impl_wire_checked!(bool, char);

macro_rules! impl_wire_word {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Wire for $ty {
                const SHAPE: Shape = Shape::Scalar;

                #[inline]
                fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
                    write_var(*self, enc)
                }

                #[inline]
                fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
                    read_var(dec)
                }
            }
        )*
    };
}

impl_wire_word!(usize, isize);

impl<T: VarWidth> Wire for Var<T> {
    const SHAPE: Shape = Shape::Scalar;

    #[inline]
    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        write_var(self.0, enc)
    }

    #[inline]
    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        read_var(dec).map(Var)
    }
}

impl Wire for () {
    const SHAPE: Shape = Shape::Empty;

    fn encode_body(&self, _enc: &mut Encoder<'_>) -> Result<()> {
        Ok(())
    }

    fn decode_body(_dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(())
    }
}

impl<T: 'static> Wire for PhantomData<T> {
    const SHAPE: Shape = Shape::Empty;

    fn encode_body(&self, _enc: &mut Encoder<'_>) -> Result<()> {
        Ok(())
    }

    fn decode_body(_dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(PhantomData)
    }
}

impl<T: Wire, const N: usize> Wire for [T; N] {
    const SHAPE: Shape = if N == 0 || matches!(T::SHAPE, Shape::Empty) {
        Shape::Empty
    } else {
        Shape::Aggregate
    };

    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        encode_seq(self.as_slice(), enc)
    }

    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        decode_seq::<T>(N, dec)?
            .try_into()
            .map_err(|_| WireError::internal(format!("expected {N} array elements")))
    }
}

/// Element count, then the elements.
impl<T: Wire> Wire for Vec<T> {
    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.field(&self.len())?;
        encode_seq(self, enc)
    }

    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        let count: usize = dec.field()?;
        decode_seq(count, dec)
    }
}

/// Byte length, then UTF-8 bytes.
impl Wire for String {
    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.field(&self.len())?;
        encode_seq(self.as_bytes(), enc)
    }

    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        let len: usize = dec.field()?;
        let bytes = decode_seq::<u8>(len, dec)?;
        String::from_utf8(bytes).map_err(|e| WireError::corrupted(format!("invalid UTF-8: {e}")))
    }
}
