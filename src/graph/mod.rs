//! Object graphs - arena storage and reference identity tracking.
//!
//! Reference fields that may be shared or cyclic point into an
//! [`ObjectArena`] through typed [`Handle`]s. Identity is slot identity:
//! two fields referring to the same slot refer to the same object.
//!
//! - [`ObjectArena`] - slots holding the pointees; on decode it is the set of
//!   allocations handed to the caller
//! - [`EncodeTracker`] / [`DecodeTracker`] - slot ↔ byte offset maps, used
//!   only when cyclic reference checking is enabled

mod arena;
mod tracker;

pub use arena::{Handle, ObjectArena, SlotId};
pub use tracker::{DecodeTracker, EncodeTracker};
