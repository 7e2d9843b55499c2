#![forbid(unsafe_code)]

//! Long-press popup keyboards.
//!
//! [`MiniKeyboardCache`] builds each key's popup keyboard once per parent
//! keyboard. [`ActivePopup`] owns an open popup: its placement over the
//! parent, a nested [`TouchStateMachine`] and a [`Renderer`] of its own.
//!
//! While a popup is open, parent-surface events are translated into popup
//! coordinates:
//!
//! | Event            | Popup machine idle          | Popup machine active |
//! |------------------|-----------------------------|----------------------|
//! | Down outside     | dismiss                     | dismiss              |
//! | Move/Up inside   | synthesized Down, then event | forwarded            |
//! | Move/Up outside  | ignored                     | forwarded            |
//! | Cancel           | dismiss                     | dismiss              |
//!
//! Any key delivery from the popup dismisses it.

use std::time::Instant;

use rustc_hash::FxHashMap;
use tapboard_core::action::KeyboardAction;
use tapboard_core::config::KeyboardConfig;
use tapboard_core::geometry::{Point, Rect};
use tapboard_layout::{HitResolver, Key, Keyboard, LayoutLibrary, ShiftState};
use tapboard_render::{KeyPainter, PaintReport, Renderer};

use crate::gesture::TouchStateMachine;
use crate::touch::{TouchEvent, TouchPhase};

/// Popup keyboards by parent key index.
///
/// Cleared wholesale whenever the parent keyboard changes.
#[derive(Debug, Clone, Default)]
pub struct MiniKeyboardCache {
    keyboards: FxHashMap<usize, Option<Keyboard>>,
}

impl MiniKeyboardCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Popup keyboard for key `index` of `parent`, built on first use.
    pub fn get_or_build(
        &mut self,
        index: usize,
        parent: &Keyboard,
        library: &LayoutLibrary,
    ) -> Option<&Keyboard> {
        self.keyboards
            .entry(index)
            .or_insert_with(|| {
                let key = parent.key(index)?;
                library.popup_keyboard(key, parent)
            })
            .as_ref()
    }

    pub fn clear(&mut self) {
        self.keyboards.clear();
    }

    /// Number of keys looked up so far, with or without a popup.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyboards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyboards.is_empty()
    }
}

/// What the parent should do after routing an event to the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupRoute {
    Keep,
    Dismiss,
}

/// An open popup keyboard.
#[derive(Debug, Clone)]
pub struct ActivePopup {
    parent_key: usize,
    origin: Point,
    keyboard: Keyboard,
    machine: TouchStateMachine,
    renderer: Renderer,
}

impl ActivePopup {
    /// Open `keyboard` over key `parent_key`.
    #[must_use]
    pub fn open(
        parent_key: usize,
        key: &Key,
        keyboard: Keyboard,
        config: &KeyboardConfig,
    ) -> Self {
        let origin = Self::placement(key, &keyboard);
        let renderer = Renderer::new(&keyboard);
        tracing::debug!(
            parent_key,
            x = origin.x,
            y = origin.y,
            keys = keyboard.keys().len(),
            "popup opened"
        );
        Self {
            parent_key,
            origin,
            keyboard,
            machine: TouchStateMachine::nested(config),
            renderer,
        }
    }

    /// Popup origin in parent coordinates: right-aligned with the key and
    /// directly above it, never left of the parent's edge.
    #[must_use]
    pub fn placement(key: &Key, popup: &Keyboard) -> Point {
        Point::new(
            (key.right() - popup.min_width()).max(0),
            key.y - popup.height(),
        )
    }

    #[must_use]
    pub fn parent_key(&self) -> usize {
        self.parent_key
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Popup area in parent coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.keyboard.min_width(),
            self.keyboard.height(),
        )
    }

    #[must_use]
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    #[must_use]
    pub fn machine(&self) -> &TouchStateMachine {
        &self.machine
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn set_config(&mut self, config: &KeyboardConfig) {
        self.machine.set_config(config);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.machine.next_deadline()
    }

    /// Route one parent-surface event.
    pub fn route(
        &mut self,
        event: TouchEvent,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) -> PopupRoute {
        let inside = self.bounds().contains(event.x, event.y);
        match event.phase {
            TouchPhase::Cancel => return PopupRoute::Dismiss,
            TouchPhase::Down if !inside => return PopupRoute::Dismiss,
            _ => {}
        }

        let local = event.translated(-self.origin.x, -self.origin.y);
        let start = out.len();
        if !self.machine.is_active() && event.phase != TouchPhase::Down {
            if !inside {
                return PopupRoute::Keep;
            }
            let down = TouchEvent {
                phase: TouchPhase::Down,
                ..local
            };
            self.machine.handle(down, &self.keyboard, resolver, out);
        }
        self.machine.handle(local, &self.keyboard, resolver, out);
        self.renderer.press_only(self.machine.pressed_key());

        if out[start..].iter().any(KeyboardAction::is_delivery) {
            tracing::debug!(parent_key = self.parent_key, "popup key chosen");
            PopupRoute::Dismiss
        } else {
            PopupRoute::Keep
        }
    }

    /// Paint the popup's dirty keys in popup coordinates.
    pub fn paint<P: KeyPainter + ?Sized>(&mut self, painter: &mut P) -> PaintReport {
        self.renderer.paint(&self.keyboard, painter)
    }

    /// Mirror the parent's shift state.
    pub fn set_shift_state(&mut self, state: ShiftState) {
        if self.keyboard.set_shift_state(state) {
            self.renderer.invalidate_all();
        }
    }

    /// Fire the popup machine's timers.
    pub fn poll(&mut self, now: Instant, resolver: &HitResolver, out: &mut Vec<KeyboardAction>) {
        self.machine.poll(now, &self.keyboard, resolver, out);
        self.renderer.press_only(self.machine.pressed_key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tapboard_core::codes::KeyCode;
    use tapboard_layout::LayoutParams;

    const MS: Duration = Duration::from_millis(1);

    fn setup() -> (LayoutLibrary, Keyboard) {
        let mut library = LayoutLibrary::new();
        library
            .insert_toml(
                "main",
                r#"
                [keyboard]
                key_width = 40
                key_height = 40
                [[row]]
                [[row.key]]
                label = "q"
                [[row.key]]
                label = "e"
                popup_characters = "éèê"
                [[row]]
                [[row.key]]
                label = "z"
                "#,
            )
            .unwrap();
        let kb = library.build("main", &LayoutParams::new(400, 80)).unwrap();
        (library, kb)
    }

    fn open(library: &LayoutLibrary, kb: &Keyboard, index: usize) -> ActivePopup {
        let mut cache = MiniKeyboardCache::new();
        let popup = cache.get_or_build(index, kb, library).unwrap().clone();
        ActivePopup::open(index, &kb.keys()[index], popup, &KeyboardConfig::default())
    }

    #[test]
    fn cache_builds_once_and_remembers_misses() {
        let (library, kb) = setup();
        let mut cache = MiniKeyboardCache::new();
        assert!(cache.get_or_build(0, &kb, &library).is_none());
        assert_eq!(cache.get_or_build(1, &kb, &library).map(|p| p.keys().len()), Some(3));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn placement_is_above_and_clamped() {
        let (library, kb) = setup();
        let popup = open(&library, &kb, 1);
        // Key 'e' spans 40..80; popup is 120 wide so it clamps to 0.
        assert_eq!(popup.origin(), Point::new(0, -40));

        let z = &kb.keys()[2];
        assert_eq!(ActivePopup::placement(z, popup.keyboard()), Point::new(0, 0));
    }

    #[test]
    fn sliding_in_and_releasing_selects() {
        let (library, kb) = setup();
        let mut popup = open(&library, &kb, 1);
        let resolver = HitResolver::default();
        let t = Instant::now();
        let mut out = Vec::new();

        // Finger still down from the long-press, now inside the popup.
        let route = popup.route(TouchEvent::new(TouchPhase::Move, 60, -20, t), &resolver, &mut out);
        assert_eq!(route, PopupRoute::Keep);
        assert_eq!(popup.renderer().states().with(tapboard_render::KeyVisualState::PRESSED).next(), Some(1));

        let route = popup.route(
            TouchEvent::new(TouchPhase::Up, 60, -20, t + MS * 100),
            &resolver,
            &mut out,
        );
        assert_eq!(route, PopupRoute::Dismiss);
        assert!(out.iter().any(|a| a.key_code() == Some('è' as KeyCode)));
    }

    #[test]
    fn release_outside_keeps_popup_open() {
        let (library, kb) = setup();
        let mut popup = open(&library, &kb, 1);
        let resolver = HitResolver::default();
        let mut out = Vec::new();
        let route = popup.route(
            TouchEvent::new(TouchPhase::Up, 60, 30, Instant::now()),
            &resolver,
            &mut out,
        );
        assert_eq!(route, PopupRoute::Keep);
        assert!(out.is_empty());
    }

    #[test]
    fn down_outside_and_cancel_dismiss() {
        let (library, kb) = setup();
        let mut popup = open(&library, &kb, 1);
        let resolver = HitResolver::default();
        let t = Instant::now();
        let mut out = Vec::new();
        assert_eq!(
            popup.route(TouchEvent::new(TouchPhase::Down, 300, 20, t), &resolver, &mut out),
            PopupRoute::Dismiss
        );
        assert_eq!(
            popup.route(TouchEvent::new(TouchPhase::Cancel, 10, -20, t), &resolver, &mut out),
            PopupRoute::Dismiss
        );
        assert!(out.is_empty());
    }
}
