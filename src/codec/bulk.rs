//! Bulk copy of native memory images.
//!
//! Types opt in through [`Wire::bulk_bytes`]/[`Wire::from_bulk_bytes`],
//! usually via [`bulk_hooks!`](crate::bulk_hooks) on a `zerocopy` type.
//! A type whose hooks decline signals `UnsupportedSettingsForType`, which
//! the dispatcher answers by falling back to field-by-field encoding.

use std::mem::size_of;

use zerocopy::{FromBytes, IntoBytes};

use super::{Decoder, Encoder, Wire};
use crate::error::{Result, WireError};

/// Rebuild a run of `T` from its native byte image.
///
/// Returns `None` if `bytes` is not a whole number of `T`s.
pub fn read_bulk<T: FromBytes + IntoBytes>(bytes: &[u8]) -> Option<Vec<T>> {
    let size = size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return None;
    }
    let mut out = T::new_vec_zeroed(bytes.len() / size).ok()?;
    out.as_mut_slice().as_mut_bytes().copy_from_slice(bytes);
    Some(out)
}

pub(super) fn encode_run<T: Wire>(items: &[T], enc: &mut Encoder<'_>) -> Result<()> {
    let bytes = T::bulk_bytes(items).ok_or(WireError::UnsupportedSettingsForType)?;
    if bytes.len() != items.len() * size_of::<T>() {
        return Err(WireError::internal(format!(
            "bulk image of {} bytes for {} values of {} bytes",
            bytes.len(),
            items.len(),
            size_of::<T>()
        )));
    }
    enc.put_slice(bytes);
    Ok(())
}

/// Decode `count` values in one copy. Consumes nothing unless it succeeds.
pub(super) fn decode_run<T: Wire>(count: usize, dec: &mut Decoder<'_>) -> Result<Vec<T>> {
    // Decline before touching the input; the field image may be shorter
    // than the memory image.
    if T::bulk_bytes(&[]).is_none() {
        return Err(WireError::UnsupportedSettingsForType);
    }
    let total = count
        .checked_mul(size_of::<T>())
        .ok_or_else(|| WireError::corrupted(format!("run of {count} values overflows")))?;
    let bytes = dec.peek(total)?;
    let run = T::from_bulk_bytes(bytes).ok_or(WireError::UnsupportedSettingsForType)?;
    if run.len() != count {
        return Err(WireError::internal(format!(
            "bulk image decoded {} of {count} values",
            run.len()
        )));
    }
    dec.advance(total)?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bulk_u16() {
        let values: Vec<u16> = read_bulk(&[1u8, 0, 2, 0]).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values, vec![u16::from_ne_bytes([1, 0]), u16::from_ne_bytes([2, 0])]);
    }

    #[test]
    fn test_read_bulk_rejects_partial_value() {
        assert!(read_bulk::<u32>(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_read_bulk_empty() {
        assert_eq!(read_bulk::<u64>(&[]), Some(Vec::new()));
    }

    #[test]
    fn test_zero_sized_values_never_bulk() {
        assert!(read_bulk::<()>(&[]).is_none());
    }
}
