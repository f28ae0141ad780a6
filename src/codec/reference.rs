//! Reference fields - nullable pointers to other values.
//!
//! Two wire forms, selected by `CHECK_CYCLIC_REFERENCES`:
//!
//! ```text
//! plain:   [u8: 0 = null | 1 = present][payload if present]
//! tracked: [word: 0 = null | 1 = new][payload if new]
//!          [word: N]  back-reference to the payload starting at offset N
//! ```
//!
//! The tracked form records the offset directly after a `1` sentinel, on
//! both sides, so shared and cyclic graphs are written once and rebuilt with
//! the same identity. Words are width-adapted like any `usize`.

use super::{decode, encode, Decoder, Encoder, Shape, Wire};
use crate::context::WireContext;
use crate::error::{Result, WireError};
use crate::graph::{Handle, SlotId};

const NULL_FLAG: u8 = 0;
const PRESENT_FLAG: u8 = 1;

const NULL_REF: usize = 0;
const NEW_REF: usize = 1;

fn tracked(ctx: &WireContext) -> bool {
    ctx.data_flags.check_cyclic_references()
}

/// Shared or cyclic reference into an [`ObjectArena`](crate::graph::ObjectArena).
impl<T: Wire + Send> Wire for Option<Handle<T>> {
    const SHAPE: Shape = Shape::Reference;

    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        if !tracked(enc.context()) {
            let Some(handle) = *self else {
                enc.put_u8(NULL_FLAG);
                return Ok(());
            };
            let value = pointee(enc, handle)?;
            enc.put_u8(PRESENT_FLAG);
            return encode(value, enc);
        }

        let Some(handle) = *self else {
            return encode(&NULL_REF, enc);
        };
        if let Some(offset) = enc.tracker_mut()?.offset_of(handle.slot()) {
            return encode(&offset, enc);
        }

        let value = pointee(enc, handle)?;
        encode(&NEW_REF, enc)?;
        let offset = enc.position();
        enc.tracker_mut()?.register(handle.slot(), offset)?;
        encode(value, enc)
    }

    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        if !tracked(dec.context()) {
            return match dec.get_u8()? {
                NULL_FLAG => Ok(None),
                PRESENT_FLAG => allocate(dec, None).map(Some),
                flag => Err(WireError::corrupted(format!("invalid reference flag {flag}"))),
            };
        }

        match decode::<usize>(dec)? {
            NULL_REF => Ok(None),
            NEW_REF => {
                let offset = dec.position();
                allocate(dec, Some(offset)).map(Some)
            }
            offset => {
                let slot = back_reference(dec, offset)?;
                dec.arena()
                    .typed::<T>(slot)
                    .map(Some)
                    .ok_or_else(|| {
                        WireError::corrupted(format!(
                            "object at offset {offset} is not a {}",
                            std::any::type_name::<T>()
                        ))
                    })
            }
        }
    }
}

fn pointee<'a, T: 'static>(enc: &Encoder<'a>, handle: Handle<T>) -> Result<&'a T> {
    enc.arena()?
        .get(handle)
        .ok_or_else(|| WireError::internal(format!("dangling handle {handle:?}")))
}

/// Reserve a slot, register it, then decode the pointee into it.
fn allocate<T: Wire + Send>(dec: &mut Decoder<'_>, offset: Option<usize>) -> Result<Handle<T>> {
    let handle = dec.arena_mut().reserve::<T>()?;
    if let Some(offset) = offset {
        dec.tracker_mut()?.register(offset, handle.slot())?;
    }
    let value = decode::<T>(dec)?;
    dec.arena_mut().fill(handle, value)?;
    Ok(handle)
}

fn back_reference(dec: &Decoder<'_>, offset: usize) -> Result<SlotId> {
    if offset >= dec.position() {
        return Err(WireError::internal(format!(
            "forward reference to offset {offset} at offset {}",
            dec.position()
        )));
    }
    dec.tracker()?
        .resolve(offset)
        .ok_or_else(|| WireError::corrupted(format!("no object starts at offset {offset}")))
}

/// Uniquely owned reference. Never the target of a back-reference.
impl<T: Wire> Wire for Option<Box<T>> {
    const SHAPE: Shape = Shape::Reference;

    fn encode_body(&self, enc: &mut Encoder<'_>) -> Result<()> {
        let graph = tracked(enc.context());
        match self {
            None if graph => encode(&NULL_REF, enc),
            None => {
                enc.put_u8(NULL_FLAG);
                Ok(())
            }
            Some(value) => {
                if graph {
                    encode(&NEW_REF, enc)?;
                } else {
                    enc.put_u8(PRESENT_FLAG);
                }
                encode(value.as_ref(), enc)
            }
        }
    }

    fn decode_body(dec: &mut Decoder<'_>) -> Result<Self> {
        if !tracked(dec.context()) {
            return match dec.get_u8()? {
                NULL_FLAG => Ok(None),
                PRESENT_FLAG => Ok(Some(Box::new(decode(dec)?))),
                flag => Err(WireError::corrupted(format!("invalid reference flag {flag}"))),
            };
        }

        match decode::<usize>(dec)? {
            NULL_REF => Ok(None),
            NEW_REF => Ok(Some(Box::new(decode(dec)?))),
            offset => {
                back_reference(dec, offset)?;
                Err(WireError::corrupted(format!(
                    "back-reference to offset {offset} in a uniquely owned field"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes, to_bytes, to_bytes_in};
    use crate::context::{CommonFlags, DataFlags, WireContext};
    use crate::graph::ObjectArena;

    fn plain() -> WireContext {
        WireContext::new(0)
            .with_common_flags(CommonFlags::for_wire(false, false))
            .with_data_flags(DataFlags::empty().with(DataFlags::ALLOW_REFERENCE_FIELDS))
    }

    fn tracked_ctx() -> WireContext {
        plain().with_data_flags(
            DataFlags::empty()
                .with(DataFlags::ALLOW_REFERENCE_FIELDS)
                .with(DataFlags::CHECK_CYCLIC_REFERENCES),
        )
    }

    #[test]
    fn test_plain_null_is_one_byte() {
        let bytes = to_bytes(&None::<Box<u32>>, plain()).unwrap();
        assert_eq!(&bytes[..], &[0]);

        let decoded = from_bytes::<Option<Box<u32>>>(&bytes, plain()).unwrap();
        assert!(decoded.value.is_none());
        assert_eq!(decoded.consumed, 1);
    }

    #[test]
    fn test_plain_box_roundtrip() {
        let value = Some(Box::new(0x0A0Bu16));
        let bytes = to_bytes(&value, plain()).unwrap();
        assert_eq!(bytes[0], PRESENT_FLAG);
        assert_eq!(bytes.len(), 3);

        let decoded = from_bytes::<Option<Box<u16>>>(&bytes, plain()).unwrap();
        assert_eq!(decoded.value, value);
    }

    #[test]
    fn test_plain_invalid_flag() {
        let err = from_bytes::<Option<Box<u8>>>(&[2, 0], plain()).unwrap_err();
        assert!(matches!(err, WireError::DataCorrupted(_)));
    }

    #[test]
    fn test_tracked_null_is_a_word() {
        let bytes = to_bytes(&None::<Handle<u8>>, tracked_ctx()).unwrap();
        assert_eq!(&bytes[..], &[0; 8]);
    }

    #[test]
    fn test_handle_roundtrip_allocates_into_arena() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(String::from("pointee"));

        for ctx in [plain(), tracked_ctx()] {
            let bytes = to_bytes_in(&Some(h), &arena, ctx).unwrap();
            let decoded = from_bytes::<Option<Handle<String>>>(&bytes, ctx).unwrap();
            let handle = decoded.value.unwrap();
            assert_eq!(decoded.arena.get(handle).unwrap(), "pointee");
            assert_eq!(decoded.arena.len(), 1);
        }
    }

    #[test]
    fn test_shared_pointee_written_once() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(0xDEAD_BEEFu32);
        let pair = vec![Some(h), Some(h)];

        let bytes = to_bytes_in(&pair, &arena, tracked_ctx()).unwrap();
        // count, new sentinel, payload, back-reference
        assert_eq!(bytes.len(), 8 + 8 + 4 + 8);

        let decoded = from_bytes::<Vec<Option<Handle<u32>>>>(&bytes, tracked_ctx()).unwrap();
        assert_eq!(decoded.value[0], decoded.value[1]);
        assert_eq!(decoded.arena.len(), 1);
    }

    #[test]
    fn test_plain_mode_duplicates_shared_pointee() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(7u8);

        let bytes = to_bytes_in(&vec![Some(h), Some(h)], &arena, plain()).unwrap();
        let decoded = from_bytes::<Vec<Option<Handle<u8>>>>(&bytes, plain()).unwrap();
        assert_ne!(decoded.value[0], decoded.value[1]);
        assert_eq!(decoded.arena.len(), 2);
    }

    #[test]
    fn test_forward_reference_is_internal() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u64.to_le_bytes());
        let err = from_bytes::<Option<Handle<u8>>>(&bytes, tracked_ctx()).unwrap_err();
        assert!(matches!(err, WireError::Internal(_)));
    }

    #[test]
    fn test_unknown_back_reference_is_corruption() {
        // [count 2][new][9][ref 3]: offset 3 lies inside the count word
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.push(9);
        bytes.extend_from_slice(&3u64.to_le_bytes());

        let err = from_bytes::<Vec<Option<Handle<u8>>>>(&bytes, tracked_ctx()).unwrap_err();
        assert!(matches!(err, WireError::DataCorrupted(_)));
    }

    #[test]
    fn test_back_reference_type_mismatch() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(4u8);
        let mut enc = Encoder::new(tracked_ctx()).unwrap().with_arena(&arena);
        enc.field(&Some(h)).unwrap();
        enc.field(&Some(h)).unwrap();
        let bytes = enc.finish();

        let mut dec = Decoder::new(&bytes, tracked_ctx()).unwrap();
        let _: Option<Handle<u8>> = dec.field().unwrap();
        let err = dec.field::<Option<Handle<u16>>>().unwrap_err();
        assert!(matches!(err, WireError::DataCorrupted(_)));
    }

    #[test]
    fn test_missing_arena_is_internal() {
        let mut arena = ObjectArena::new();
        let h = arena.insert(1u8);
        let err = to_bytes(&Some(h), plain()).unwrap_err();
        assert!(matches!(err, WireError::Internal(_)));
    }

    #[test]
    fn test_box_rejects_back_reference() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.push(5);
        bytes.extend_from_slice(&8u64.to_le_bytes());

        let ctx = tracked_ctx();
        let mut dec = Decoder::new(&bytes, ctx).unwrap();
        let first: Option<Box<u8>> = dec.field().unwrap();
        assert_eq!(first, Some(Box::new(5)));
        let err = dec.field::<Option<Box<u8>>>().unwrap_err();
        assert!(matches!(err, WireError::DataCorrupted(_)));
    }
}
