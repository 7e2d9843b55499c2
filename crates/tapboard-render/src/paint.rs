#![forbid(unsafe_code)]

//! Paint adapter.
//!
//! [`Renderer`] pairs the [`KeyStateTable`] with the pending
//! [`Invalidation`] for one installed keyboard. On [`Renderer::paint`] it
//! replays exactly what changed into a [`KeyPainter`]:
//!
//! - `Keys`: each dirty key's bounds are cleared and the key repainted;
//! - `Full`: the keyboard bounds are cleared once and every key repainted;
//! - `Clean`: nothing is painted.

use tapboard_core::geometry::Rect;
use tapboard_layout::{Key, Keyboard};

use crate::invalidation::Invalidation;
use crate::label::DisplayLabel;
use crate::state::{KeyStateTable, KeyVisualState};

/// Host drawing surface.
pub trait KeyPainter {
    /// Erase an area before keys are drawn over it.
    fn clear(&mut self, area: Rect);

    /// Draw one key face.
    fn paint_key(&mut self, key: &Key, label: &DisplayLabel, state: KeyVisualState);
}

/// Summary of one paint pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintReport {
    pub keys_painted: usize,
    pub full: bool,
}

/// Visual state and dirty tracking for the installed keyboard.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    states: KeyStateTable,
    invalidation: Invalidation,
}

impl Renderer {
    /// Renderer for `keyboard`, with a full repaint pending.
    #[must_use]
    pub fn new(keyboard: &Keyboard) -> Self {
        let mut renderer = Self::default();
        renderer.attach(keyboard);
        renderer
    }

    /// Switch to a new keyboard: all flags drop and a full repaint is queued.
    pub fn attach(&mut self, keyboard: &Keyboard) {
        self.states.reset(keyboard.keys().len());
        self.invalidation.mark_all();
    }

    #[must_use]
    pub fn states(&self) -> &KeyStateTable {
        &self.states
    }

    #[must_use]
    pub fn pending(&self) -> &Invalidation {
        &self.invalidation
    }

    pub fn set_pressed(&mut self, index: usize, pressed: bool) {
        if self.states.set(index, KeyVisualState::PRESSED, pressed) {
            self.invalidation.mark_key(index);
        }
    }

    /// Clear the pressed flag everywhere.
    pub fn release_all(&mut self) {
        for index in self.states.clear_all(KeyVisualState::PRESSED) {
            self.invalidation.mark_key(index);
        }
    }

    /// Make `index` the only pressed key (or none).
    pub fn press_only(&mut self, index: Option<usize>) {
        if let Some(index) = index
            && self.states.get(index).contains(KeyVisualState::PRESSED)
            && self.states.with(KeyVisualState::PRESSED).count() == 1
        {
            return;
        }
        self.release_all();
        if let Some(index) = index {
            self.set_pressed(index, true);
        }
    }

    /// Move focus to `index`, or drop it.
    pub fn set_focused(&mut self, index: Option<usize>) {
        for previous in self.states.clear_all(KeyVisualState::FOCUSED) {
            self.invalidation.mark_key(previous);
        }
        if let Some(index) = index
            && self.states.set(index, KeyVisualState::FOCUSED, true)
        {
            self.invalidation.mark_key(index);
        }
    }

    pub fn invalidate_key(&mut self, index: usize) {
        self.invalidation.mark_key(index);
    }

    pub fn invalidate_all(&mut self) {
        self.invalidation.mark_all();
    }

    /// Flags to draw `index` with, including the engaged state of the
    /// shift key.
    #[must_use]
    pub fn visual_state(&self, keyboard: &Keyboard, index: usize) -> KeyVisualState {
        let mut state = self.states.get(index);
        let engaged = keyboard.shift_key() == Some(index) && keyboard.is_shifted();
        let sticky = keyboard.key(index).is_some_and(|key| key.sticky);
        state.set(KeyVisualState::ON, engaged && sticky);
        state
    }

    /// Replay pending invalidation into `painter`.
    pub fn paint<P: KeyPainter + ?Sized>(
        &mut self,
        keyboard: &Keyboard,
        painter: &mut P,
    ) -> PaintReport {
        let shift = keyboard.shift_state();
        let mut report = PaintReport::default();
        let draw = |renderer: &Self, painter: &mut P, index: usize, key: &Key| {
            let label = DisplayLabel::for_key(key, shift);
            painter.paint_key(key, &label, renderer.visual_state(keyboard, index));
        };

        match self.invalidation.take() {
            Invalidation::Clean => {}
            Invalidation::Keys(dirty) => {
                for index in dirty {
                    let Some(key) = keyboard.key(index) else {
                        continue;
                    };
                    painter.clear(key.bounds());
                    draw(self, painter, index, key);
                    report.keys_painted += 1;
                }
            }
            Invalidation::Full => {
                painter.clear(keyboard.bounds());
                for (index, key) in keyboard.keys().iter().enumerate() {
                    draw(self, painter, index, key);
                }
                report.keys_painted = keyboard.keys().len();
                report.full = true;
            }
        }
        if report.keys_painted > 0 {
            tracing::trace!(
                keys = report.keys_painted,
                full = report.full,
                "keyboard painted"
            );
        }
        report
    }
}
