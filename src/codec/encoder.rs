//! Encoder - append-only output side of an operation.

use bytes::{BufMut, Bytes, BytesMut};

use super::Wire;
use crate::context::WireContext;
use crate::error::{Result, WireError};
use crate::graph::{EncodeTracker, ObjectArena};

/// Default initial output capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Output buffer plus the state of one top-level encode.
///
/// Offsets recorded for reference identity are relative to the start of
/// this encoder's buffer.
pub struct Encoder<'a> {
    ctx: WireContext,
    buf: BytesMut,
    arena: Option<&'a ObjectArena>,
    /// Present only when cyclic reference checking is enabled.
    tracker: Option<EncodeTracker>,
}

impl<'a> Encoder<'a> {
    /// Create an encoder for `ctx`.
    ///
    /// # Errors
    ///
    /// Returns error if the context names an unsupported protocol version.
    pub fn new(ctx: WireContext) -> Result<Self> {
        Self::with_capacity(ctx, DEFAULT_CAPACITY)
    }

    /// Create an encoder with a pre-sized output buffer.
    pub fn with_capacity(ctx: WireContext, capacity: usize) -> Result<Self> {
        ctx.validate()?;
        Ok(Self {
            ctx,
            buf: BytesMut::with_capacity(capacity),
            arena: None,
            tracker: ctx
                .data_flags
                .check_cyclic_references()
                .then(EncodeTracker::new),
        })
    }

    /// Resolve handles in reference fields against `arena`.
    #[must_use]
    pub fn with_arena(mut self, arena: &'a ObjectArena) -> Self {
        self.arena = Some(arena);
        self
    }

    #[inline]
    pub fn context(&self) -> &WireContext {
        &self.ctx
    }

    /// Current write offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Encode one field with full dispatch.
    #[inline]
    pub fn field<T: Wire>(&mut self, value: &T) -> Result<()> {
        super::encode(value, self)
    }

    /// Encode a contiguous run of fields without a length prefix.
    #[inline]
    pub fn run<T: Wire>(&mut self, items: &[T]) -> Result<()> {
        super::encode_seq(items, self)
    }

    /// Finish encoding and return the output.
    pub fn finish(self) -> Bytes {
        tracing::debug!(
            bytes = self.buf.len(),
            objects = self.tracker.as_ref().map_or(0, EncodeTracker::len),
            "encode finished"
        );
        self.buf.freeze()
    }

    #[inline]
    pub(crate) fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    #[inline]
    pub(crate) fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub(crate) fn arena(&self) -> Result<&'a ObjectArena> {
        self.arena
            .ok_or_else(|| WireError::internal("reference field encoded without an object arena"))
    }

    pub(crate) fn tracker_mut(&mut self) -> Result<&mut EncodeTracker> {
        self.tracker
            .as_mut()
            .ok_or_else(|| WireError::internal("reference tracker is not enabled"))
    }
}
