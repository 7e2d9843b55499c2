#![forbid(unsafe_code)]

//! Discrete keyboard actions emitted by the touch engine.
//!
//! Every gesture the engine recognizes reduces to a sequence of
//! [`KeyboardAction`] values delivered through a single channel, so a host
//! (or a test harness) only needs to match one enum.
//!
//! # Ordering guarantees
//! 1. `Press(code)` precedes the `Key`/`Text` it belongs to.
//! 2. `Release(code)` follows it.
//! 3. Repeating keys emit `Press`/`Key` pairs on every repeat without an
//!    intervening `Release`; exactly one `Release` ends the gesture.
//! 4. A cancelled gesture emits no `Key`, `Text`, or `Swipe`.

use smallvec::SmallVec;

use crate::codes::KeyCode;

/// Capacity of the proximity alternative buffer.
pub const MAX_ALTERNATIVES: usize = 12;

/// A candidate code near the touch point together with its squared distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alternative {
    pub code: KeyCode,
    pub distance: i64,
}

/// Codes of keys near a touch, ordered by increasing squared distance.
///
/// Holds at most [`MAX_ALTERNATIVES`] entries. Entries with equal distance
/// keep insertion order, so keys visited first stay first. The host uses the
/// list for soft correction; the engine never selects among them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alternatives {
    entries: SmallVec<[Alternative; MAX_ALTERNATIVES]>,
}

impl Alternatives {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert all `codes` of one key at `distance`.
    ///
    /// The codes land before the first entry that is strictly farther away.
    /// Entries pushed past the capacity are dropped.
    pub fn insert_key(&mut self, codes: &[KeyCode], distance: i64) {
        let Some(at) = self.insertion_point(distance) else {
            return;
        };
        for (offset, &code) in codes.iter().enumerate() {
            let index = at + offset;
            if index >= MAX_ALTERNATIVES {
                break;
            }
            self.entries.insert(index, Alternative { code, distance });
        }
        self.entries.truncate(MAX_ALTERNATIVES);
    }

    fn insertion_point(&self, distance: i64) -> Option<usize> {
        match self.entries.iter().position(|e| e.distance > distance) {
            Some(index) => Some(index),
            None if self.entries.len() < MAX_ALTERNATIVES => Some(self.entries.len()),
            None => None,
        }
    }

    /// Codes in distance order.
    pub fn codes(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.entries.iter().map(|e| e.code)
    }

    /// Entries in distance order.
    #[must_use]
    pub fn as_slice(&self) -> &[Alternative] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no alternative was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Cardinal direction of a swipe across the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SwipeDirection {
    /// Returns true for vertical directions.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// An action raised by the touch engine for the host to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardAction {
    /// A key went down (or re-fired during auto-repeat).
    Press { code: KeyCode },
    /// The finger left the key that was last pressed.
    Release { code: KeyCode },
    /// A key was delivered, with nearby codes for soft correction.
    Key {
        code: KeyCode,
        alternatives: Alternatives,
    },
    /// A key carrying multi-character output text was delivered.
    Text { text: String },
    /// A cardinal fling across the keyboard.
    Swipe { direction: SwipeDirection },
}

impl KeyboardAction {
    /// Key action without alternatives.
    #[must_use]
    pub fn key(code: KeyCode) -> Self {
        Self::Key {
            code,
            alternatives: Alternatives::new(),
        }
    }

    /// The code carried by a `Key` action.
    #[must_use]
    pub fn key_code(&self) -> Option<KeyCode> {
        match self {
            Self::Key { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this action delivers output (key, text, or swipe).
    #[must_use]
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Key { .. } | Self::Text { .. } | Self::Swipe { .. })
    }
}
