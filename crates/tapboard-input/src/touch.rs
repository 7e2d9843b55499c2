#![forbid(unsafe_code)]

//! Raw touch samples and single-pointer normalization.
//!
//! The engine tracks one logical pointer. [`PointerNormalizer`] turns
//! multi-pointer input into that single stream:
//!
//! - pointer count changes to 1: a `Down` is synthesized at the surviving
//!   pointer, followed by the sample itself when it is an `Up`;
//! - pointer count changes to N > 1: an `Up` is synthesized at the last
//!   single-pointer position;
//! - N > 1 pointers with no count change: consumed, nothing is emitted.

use std::time::Instant;

use smallvec::SmallVec;

/// Phase of a touch sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One sample from the host, in keyboard coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchInput {
    pub phase: TouchPhase,
    pub x: i32,
    pub y: i32,
    /// Fingers on the surface, including the one this sample is about.
    pub pointer_count: u8,
    pub time: Instant,
}

impl TouchInput {
    #[must_use]
    pub fn new(phase: TouchPhase, x: i32, y: i32, time: Instant) -> Self {
        Self {
            phase,
            x,
            y,
            pointer_count: 1,
            time,
        }
    }

    #[must_use]
    pub fn down(x: i32, y: i32, time: Instant) -> Self {
        Self::new(TouchPhase::Down, x, y, time)
    }

    #[must_use]
    pub fn moved(x: i32, y: i32, time: Instant) -> Self {
        Self::new(TouchPhase::Move, x, y, time)
    }

    #[must_use]
    pub fn up(x: i32, y: i32, time: Instant) -> Self {
        Self::new(TouchPhase::Up, x, y, time)
    }

    #[must_use]
    pub fn cancel(x: i32, y: i32, time: Instant) -> Self {
        Self::new(TouchPhase::Cancel, x, y, time)
    }

    #[must_use]
    pub fn with_pointers(mut self, pointer_count: u8) -> Self {
        self.pointer_count = pointer_count;
        self
    }
}

/// A single-pointer event after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub x: i32,
    pub y: i32,
    pub time: Instant,
    /// Part of a multi-pointer transition; not fed to swipe detection.
    pub poly: bool,
}

impl TouchEvent {
    #[must_use]
    pub fn new(phase: TouchPhase, x: i32, y: i32, time: Instant) -> Self {
        Self {
            phase,
            x,
            y,
            time,
            poly: false,
        }
    }

    /// Same event shifted into another coordinate space.
    #[must_use]
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Collapses multi-pointer input into one logical pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerNormalizer {
    old_pointer_count: u8,
    old_x: i32,
    old_y: i32,
}

impl Default for PointerNormalizer {
    fn default() -> Self {
        Self {
            old_pointer_count: 1,
            old_x: 0,
            old_y: 0,
        }
    }
}

impl PointerNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events to feed the state machine for one raw sample.
    pub fn normalize(&mut self, input: &TouchInput) -> SmallVec<[TouchEvent; 2]> {
        let mut out = SmallVec::new();
        let count = input.pointer_count.max(1);

        if count != self.old_pointer_count {
            if count == 1 {
                out.push(TouchEvent::new(TouchPhase::Down, input.x, input.y, input.time));
                if input.phase == TouchPhase::Up {
                    out.push(TouchEvent {
                        poly: true,
                        ..TouchEvent::new(TouchPhase::Up, input.x, input.y, input.time)
                    });
                }
                self.old_x = input.x;
                self.old_y = input.y;
            } else {
                out.push(TouchEvent {
                    poly: true,
                    ..TouchEvent::new(TouchPhase::Up, self.old_x, self.old_y, input.time)
                });
            }
            tracing::trace!(
                from = self.old_pointer_count,
                to = count,
                synthesized = out.len(),
                "pointer count changed"
            );
        } else if count == 1 {
            out.push(TouchEvent::new(input.phase, input.x, input.y, input.time));
            self.old_x = input.x;
            self.old_y = input.y;
        }

        self.old_pointer_count = count;
        out
    }

    /// Forget pointer history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
