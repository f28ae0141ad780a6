//! Reference identity trackers.
//!
//! The encode side remembers where each slot's payload was first written;
//! later sightings emit that offset instead of the value. The decode side
//! maps those offsets back to the slots allocated for them.

use std::collections::HashMap;

use super::SlotId;
use crate::error::{Result, WireError};

/// Slot → first-seen payload offset.
#[derive(Debug, Default)]
pub struct EncodeTracker {
    offsets: HashMap<SlotId, usize>,
}

impl EncodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of a slot already written, if any.
    #[inline]
    pub fn offset_of(&self, slot: SlotId) -> Option<usize> {
        self.offsets.get(&slot).copied()
    }

    /// Record the payload offset for a slot seen for the first time.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the slot was already registered.
    pub fn register(&mut self, slot: SlotId, offset: usize) -> Result<()> {
        if self.offsets.insert(slot, offset).is_some() {
            return Err(WireError::internal(format!(
                "slot {} registered twice",
                slot.index()
            )));
        }
        Ok(())
    }

    /// Number of distinct objects written.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Payload offset → slot allocated for it.
#[derive(Debug, Default)]
pub struct DecodeTracker {
    slots: HashMap<usize, SlotId>,
}

impl DecodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the slot allocated for the payload starting at `offset`.
    ///
    /// Must happen before the payload is decoded so self-references resolve.
    pub fn register(&mut self, offset: usize, slot: SlotId) -> Result<()> {
        if self.slots.insert(offset, slot).is_some() {
            return Err(WireError::internal(format!(
                "offset {offset} registered twice"
            )));
        }
        Ok(())
    }

    /// Slot for a previously seen payload offset.
    #[inline]
    pub fn resolve(&self, offset: usize) -> Option<SlotId> {
        self.slots.get(&offset).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ObjectArena;

    #[test]
    fn test_encode_tracker_first_sighting() {
        let mut arena = ObjectArena::new();
        let a = arena.insert(1u8).slot();
        let mut tracker = EncodeTracker::new();

        assert!(tracker.offset_of(a).is_none());
        tracker.register(a, 12).unwrap();
        assert_eq!(tracker.offset_of(a), Some(12));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_encode_tracker_rejects_duplicates() {
        let mut arena = ObjectArena::new();
        let a = arena.insert(1u8).slot();
        let mut tracker = EncodeTracker::new();

        tracker.register(a, 12).unwrap();
        let err = tracker.register(a, 40).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_decode_tracker_resolve() {
        let mut arena = ObjectArena::new();
        let a = arena.insert(1u8).slot();
        let mut tracker = DecodeTracker::new();

        assert!(tracker.is_empty());
        tracker.register(9, a).unwrap();
        assert_eq!(tracker.resolve(9), Some(a));
        assert!(tracker.resolve(10).is_none());
        assert!(tracker.register(9, a).is_err());
    }
}
