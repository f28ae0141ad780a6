//! Typed slot arena.
//!
//! # Example
//!
//! ```
//! use polywire::graph::{Handle, ObjectArena};
//!
//! struct Node {
//!     value: u32,
//!     next: Option<Handle<Node>>,
//! }
//!
//! let mut arena = ObjectArena::new();
//! let a = arena.insert(Node { value: 1, next: None });
//! arena.get_mut(a).unwrap().next = Some(a);
//!
//! assert_eq!(arena.get(a).unwrap().next, Some(a));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{Result, WireError};

/// Untyped slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Position of the slot in its arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Typed reference to a slot in an [`ObjectArena`].
pub struct Handle<T> {
    slot: SlotId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            slot: SlotId(index),
            _marker: PhantomData,
        }
    }

    /// The untyped slot this handle points to.
    #[inline]
    pub fn slot(self) -> SlotId {
        self.slot
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.slot.0)
    }
}

enum Slot {
    /// Allocated for a value that is still being decoded.
    Reserved(TypeId),
    Filled(Box<dyn Any + Send>),
    Released,
}

/// Owner of every object reachable through [`Handle`]s.
#[derive(Default)]
pub struct ObjectArena {
    slots: Vec<Slot>,
}

impl ObjectArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with room for `capacity` objects.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Move a value into the arena.
    pub fn insert<T: Send + 'static>(&mut self, value: T) -> Handle<T> {
        let handle = Handle::new(self.slots.len());
        self.slots.push(Slot::Filled(Box::new(value)));
        handle
    }

    /// Get a shared reference to a live object.
    pub fn get<T: 'static>(&self, handle: Handle<T>) -> Option<&T> {
        match self.slots.get(handle.slot.0)? {
            Slot::Filled(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Get a mutable reference to a live object.
    pub fn get_mut<T: 'static>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slots.get_mut(handle.slot.0)? {
            Slot::Filled(value) => value.downcast_mut(),
            _ => None,
        }
    }

    /// Release an object, returning it to the caller.
    ///
    /// Handles to a released slot no longer resolve.
    pub fn take<T: 'static>(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.slot.0)?;
        match slot {
            Slot::Filled(value) if value.is::<T>() => {}
            _ => return None,
        }
        match std::mem::replace(slot, Slot::Released) {
            Slot::Filled(value) => value.downcast().ok().map(|boxed| *boxed),
            _ => None,
        }
    }

    /// Handles of every live object of type `T`, in allocation order.
    pub fn handles<T: 'static>(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Filled(value) if value.is::<T>()))
            .map(|(index, _)| Handle::new(index))
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !matches!(slot, Slot::Released))
            .count()
    }

    /// Check if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate a slot for a value of type `T` that will be filled later.
    pub(crate) fn reserve<T: 'static>(&mut self) -> Result<Handle<T>> {
        self.slots.try_reserve(1).map_err(|_| WireError::NoMemory)?;
        let handle = Handle::new(self.slots.len());
        self.slots.push(Slot::Reserved(TypeId::of::<T>()));
        Ok(handle)
    }

    /// Store the value for a slot created by [`reserve`](Self::reserve).
    pub(crate) fn fill<T: Send + 'static>(&mut self, handle: Handle<T>, value: T) -> Result<()> {
        match self.slots.get_mut(handle.slot.0) {
            Some(slot @ Slot::Reserved(_)) => {
                *slot = Slot::Filled(Box::new(value));
                Ok(())
            }
            _ => Err(WireError::internal(format!(
                "slot {} was not reserved",
                handle.slot.0
            ))),
        }
    }

    /// Typed handle for `slot` if it holds, or is reserved for, a `T`.
    pub(crate) fn typed<T: 'static>(&self, slot: SlotId) -> Option<Handle<T>> {
        let matches = match self.slots.get(slot.0)? {
            Slot::Reserved(type_id) => *type_id == TypeId::of::<T>(),
            Slot::Filled(value) => value.is::<T>(),
            Slot::Released => false,
        };
        matches.then(|| Handle::new(slot.0))
    }
}

impl fmt::Debug for ObjectArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectArena")
            .field("slots", &self.slots.len())
            .field("live", &self.len())
            .finish()
    }
}
