#![forbid(unsafe_code)]

//! Transient per-key visual flags.

use bitflags::bitflags;

bitflags! {
    /// Visual flags of one key for the current render pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyVisualState: u8 {
        /// A finger is on the key.
        const PRESSED = 1 << 0;
        /// Accessibility or keyboard focus.
        const FOCUSED = 1 << 1;
        /// A sticky key that is engaged (e.g. shift while shifted).
        const ON = 1 << 2;
    }
}

/// Visual flags indexed by key position in the installed keyboard.
///
/// The table is sized to one keyboard; [`KeyStateTable::reset`] must be
/// called whenever the keyboard is replaced. Out-of-range indices are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStateTable {
    states: Vec<KeyVisualState>,
}

impl KeyStateTable {
    #[must_use]
    pub fn new(keys: usize) -> Self {
        Self {
            states: vec![KeyVisualState::empty(); keys],
        }
    }

    /// Clear every flag and resize to `keys` entries.
    pub fn reset(&mut self, keys: usize) {
        self.states.clear();
        self.states.resize(keys, KeyVisualState::empty());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> KeyVisualState {
        self.states.get(index).copied().unwrap_or_default()
    }

    /// Set or clear `flags` on one key, returning whether anything changed.
    pub fn set(&mut self, index: usize, flags: KeyVisualState, on: bool) -> bool {
        let Some(state) = self.states.get_mut(index) else {
            return false;
        };
        let before = *state;
        state.set(flags, on);
        before != *state
    }

    /// Clear `flags` on every key, returning the indices that changed.
    pub fn clear_all(&mut self, flags: KeyVisualState) -> Vec<usize> {
        self.states
            .iter_mut()
            .enumerate()
            .filter(|(_, state)| state.intersects(flags))
            .map(|(index, state)| {
                state.remove(flags);
                index
            })
            .collect()
    }

    /// Indices of keys carrying any of `flags`.
    pub fn with(&self, flags: KeyVisualState) -> impl Iterator<Item = usize> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(move |(_, state)| state.intersects(flags))
            .map(|(index, _)| index)
    }
}
