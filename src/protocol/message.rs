//! Whole messages: one header followed by one encoded value.

use bytes::{BufMut, Bytes, BytesMut};

use super::header::{MessageHeader, HEADER_SIZE};
use crate::codec::{Decoder, Encoder, Wire};
use crate::context::WireContext;
use crate::error::{Result, WireError};
use crate::graph::ObjectArena;
use crate::version::InterfaceId;

/// Interface id written for bodies without version metadata.
pub const UNVERSIONED: InterfaceId = InterfaceId(0);

/// A decoded message.
#[derive(Debug)]
pub struct Message<T> {
    pub header: MessageHeader,
    pub value: T,
    /// Objects allocated for reference fields in `value`.
    pub arena: ObjectArena,
}

fn interface_of<T: Wire>() -> InterfaceId {
    T::VERSION.map_or(UNVERSIONED, |desc| desc.id)
}

/// Encode `value` under `ctx`, prefixed by its header.
pub fn encode_message<T: Wire>(value: &T, kind: u8, ctx: WireContext) -> Result<Bytes> {
    encode_with(value, kind, ctx, None)
}

/// Like [`encode_message`], for values holding handles into `arena`.
pub fn encode_message_in<T: Wire>(
    value: &T,
    arena: &ObjectArena,
    kind: u8,
    ctx: WireContext,
) -> Result<Bytes> {
    encode_with(value, kind, ctx, Some(arena))
}

fn encode_with<T: Wire>(
    value: &T,
    kind: u8,
    ctx: WireContext,
    arena: Option<&ObjectArena>,
) -> Result<Bytes> {
    let header = MessageHeader::from_context(&ctx, kind, interface_of::<T>());

    let mut enc = Encoder::new(ctx)?;
    if let Some(arena) = arena {
        enc = enc.with_arena(arena);
    }
    enc.field(value)?;
    let body = enc.finish();

    let mut out = BytesMut::with_capacity(HEADER_SIZE + body.len());
    out.put_slice(&header.encode());
    out.put_slice(&body);
    Ok(out.freeze())
}

/// Decode a message written by [`encode_message`].
///
/// The body is decoded under the context the header describes. A versioned
/// body type must match the header's interface id, and the body must
/// consume the rest of the input.
pub fn decode_message<T: Wire>(input: &[u8]) -> Result<Message<T>> {
    let header = MessageHeader::decode(input).ok_or_else(|| {
        WireError::corrupted(format!(
            "message of {} bytes is shorter than its header",
            input.len()
        ))
    })?;
    let ctx = header.to_context()?;

    let expected = interface_of::<T>();
    if expected != UNVERSIONED && header.interface_id != expected {
        tracing::warn!(
            expected = %expected,
            received = %header.interface_id,
            "interface mismatch"
        );
        return Err(WireError::Protocol(format!(
            "message carries interface {}, expected {expected}",
            header.interface_id
        )));
    }

    let mut dec = Decoder::new(&input[HEADER_SIZE..], ctx)?;
    let value = dec.field()?;
    if !dec.is_empty() {
        return Err(WireError::corrupted(format!(
            "{} trailing bytes after message body",
            dec.remaining()
        )));
    }
    tracing::debug!(kind = header.kind, interface_version = header.interface_version, "decoded message");
    Ok(Message {
        header,
        value,
        arena: dec.finish(),
    })
}
