//! Decoder - cursor over an immutable input.

use super::Wire;
use crate::context::WireContext;
use crate::error::{Result, WireError};
use crate::graph::{DecodeTracker, ObjectArena};

/// Read cursor plus the state of one top-level decode.
///
/// Objects allocated for reference fields are collected in an
/// [`ObjectArena`] that [`finish`](Self::finish) hands to the caller.
pub struct Decoder<'a> {
    ctx: WireContext,
    input: &'a [u8],
    pos: usize,
    /// Present only when cyclic reference checking is enabled.
    tracker: Option<DecodeTracker>,
    arena: ObjectArena,
}

impl<'a> Decoder<'a> {
    /// Create a decoder reading `input` under `ctx`.
    ///
    /// # Errors
    ///
    /// Returns error if the context names an unsupported protocol version.
    pub fn new(input: &'a [u8], ctx: WireContext) -> Result<Self> {
        ctx.validate()?;
        Ok(Self {
            ctx,
            input,
            pos: 0,
            tracker: ctx
                .data_flags
                .check_cyclic_references()
                .then(DecodeTracker::new),
            arena: ObjectArena::new(),
        })
    }

    #[inline]
    pub fn context(&self) -> &WireContext {
        &self.ctx
    }

    /// Current read offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode one field with full dispatch.
    #[inline]
    pub fn field<T: Wire>(&mut self) -> Result<T> {
        super::decode(self)
    }

    /// Decode `count` fields written with [`Encoder::run`](super::Encoder::run).
    #[inline]
    pub fn run<T: Wire>(&mut self, count: usize) -> Result<Vec<T>> {
        super::decode_seq(count, self)
    }

    /// Objects allocated so far.
    #[inline]
    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    /// Finish decoding and take ownership of the allocated objects.
    pub fn finish(self) -> ObjectArena {
        tracing::debug!(
            consumed = self.pos,
            remaining = self.remaining(),
            objects = self.arena.len(),
            "decode finished"
        );
        self.arena
    }

    /// Borrow the next `len` bytes without consuming them.
    pub(crate) fn peek(&self, len: usize) -> Result<&'a [u8]> {
        let input = self.input;
        self.pos
            .checked_add(len)
            .and_then(|end| input.get(self.pos..end))
            .ok_or_else(|| {
                WireError::corrupted(format!(
                    "need {len} bytes at offset {}, {} remaining",
                    self.pos,
                    self.remaining()
                ))
            })
    }

    pub(crate) fn advance(&mut self, len: usize) -> Result<()> {
        self.peek(len)?;
        self.pos += len;
        Ok(())
    }

    /// Consume the next `len` bytes.
    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.peek(len)?;
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn arena_mut(&mut self) -> &mut ObjectArena {
        &mut self.arena
    }

    pub(crate) fn tracker(&self) -> Result<&DecodeTracker> {
        self.tracker
            .as_ref()
            .ok_or_else(|| WireError::internal("reference tracker is not enabled"))
    }

    pub(crate) fn tracker_mut(&mut self) -> Result<&mut DecodeTracker> {
        self.tracker
            .as_mut()
            .ok_or_else(|| WireError::internal("reference tracker is not enabled"))
    }
}
