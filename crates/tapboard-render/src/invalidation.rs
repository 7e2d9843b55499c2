#![forbid(unsafe_code)]

//! Dirty tracking: a few keys or the whole keyboard.
//!
//! Marking a key while already [`Invalidation::Full`] is a no-op; marking
//! more than [`MAX_DIRTY_KEYS`] distinct keys promotes to `Full`, since a
//! full repaint is then cheaper than clearing each key separately.

use smallvec::SmallVec;

/// Distinct dirty keys tracked before promoting to a full repaint.
pub const MAX_DIRTY_KEYS: usize = 8;

/// What needs repainting before the next frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Invalidation {
    #[default]
    Clean,
    /// Only these keys changed.
    Keys(SmallVec<[usize; MAX_DIRTY_KEYS]>),
    /// Geometry or global state changed.
    Full,
}

impl Invalidation {
    /// Mark one key dirty.
    pub fn mark_key(&mut self, index: usize) {
        match self {
            Self::Full => {}
            Self::Clean => *self = Self::Keys(SmallVec::from_elem(index, 1)),
            Self::Keys(keys) => {
                if keys.contains(&index) {
                    return;
                }
                if keys.len() >= MAX_DIRTY_KEYS {
                    *self = Self::Full;
                } else {
                    keys.push(index);
                }
            }
        }
    }

    /// Mark the whole keyboard dirty.
    pub fn mark_all(&mut self) {
        *self = Self::Full;
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Take the pending invalidation, leaving `Clean`.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}
