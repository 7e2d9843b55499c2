#![forbid(unsafe_code)]

//! The keyboard engine: one installed keyboard and everything that reacts
//! to touches on it.
//!
//! [`KeyboardEngine`] is the single owner of the keyboard, the touch state
//! machine, the renderer state and the open popup (if any). Hosts drive it
//! with two calls:
//!
//! - [`KeyboardEngine::handle_touch`] for every raw touch sample;
//! - [`KeyboardEngine::poll_timers`] whenever [`KeyboardEngine::next_deadline`]
//!   has passed.
//!
//! Both return the [`KeyboardAction`]s produced, in order. Replacing the
//! keyboard bumps [`KeyboardEngine::generation`]; timers armed for the old
//! keyboard are retired and never fire against the new one.

use std::time::Instant;

use tapboard_core::action::KeyboardAction;
use tapboard_core::config::KeyboardConfig;
use tapboard_layout::{HitResolver, Keyboard, LayoutLibrary, ShiftState};
use tapboard_render::{AccessibilityMap, KeyPainter, PaintReport, Renderer};

use crate::gesture::{GesturePhase, TouchStateMachine};
use crate::popup::{ActivePopup, MiniKeyboardCache, PopupRoute};
use crate::touch::{PointerNormalizer, TouchInput};

/// Touch-to-key engine for one keyboard surface.
#[derive(Debug, Clone)]
pub struct KeyboardEngine {
    keyboard: Keyboard,
    config: KeyboardConfig,
    resolver: HitResolver,
    normalizer: PointerNormalizer,
    machine: TouchStateMachine,
    renderer: Renderer,
    popups: MiniKeyboardCache,
    popup: Option<ActivePopup>,
    generation: u64,
}

impl KeyboardEngine {
    #[must_use]
    pub fn new(keyboard: Keyboard, config: &KeyboardConfig) -> Self {
        let renderer = Renderer::new(&keyboard);
        Self {
            keyboard,
            config: config.clone(),
            resolver: HitResolver::new(config.features.proximity_correction),
            normalizer: PointerNormalizer::new(),
            machine: TouchStateMachine::new(config),
            renderer,
            popups: MiniKeyboardCache::new(),
            popup: None,
            generation: 0,
        }
    }

    // -- input --------------------------------------------------------------

    /// Feed one raw touch sample.
    pub fn handle_touch(&mut self, input: &TouchInput) -> Vec<KeyboardAction> {
        let _span = tracing::debug_span!(
            "engine.touch",
            phase = ?input.phase,
            pointers = input.pointer_count,
            generation = self.generation
        )
        .entered();
        let mut out = Vec::new();
        for event in self.normalizer.normalize(input) {
            if let Some(popup) = self.popup.as_mut() {
                if popup.route(event, &self.resolver, &mut out) == PopupRoute::Dismiss {
                    self.dismiss_popup();
                }
                continue;
            }
            self.machine
                .handle(event, &self.keyboard, &self.resolver, &mut out);
        }
        self.sync_pressed();
        out
    }

    /// Fire every timer due at `now`. `library` supplies popup layouts for
    /// a long-press.
    pub fn poll_timers(&mut self, now: Instant, library: &LayoutLibrary) -> Vec<KeyboardAction> {
        let mut out = Vec::new();
        if let Some(popup) = self.popup.as_mut() {
            popup.poll(now, &self.resolver, &mut out);
        }
        if let Some(index) = self
            .machine
            .poll(now, &self.keyboard, &self.resolver, &mut out)
        {
            self.open_popup(index, library);
        }
        self.sync_pressed();
        out
    }

    /// Earliest pending timer across the keyboard and its popup.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let popup = self.popup.as_ref().and_then(ActivePopup::next_deadline);
        match (self.machine.next_deadline(), popup) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn open_popup(&mut self, index: usize, library: &LayoutLibrary) {
        let Some(key) = self.keyboard.key(index) else {
            return;
        };
        if !key.has_popup() {
            return;
        }
        let Some(keyboard) = self.popups.get_or_build(index, &self.keyboard, library) else {
            return;
        };
        let mut popup = ActivePopup::open(index, key, keyboard.clone(), &self.config);
        popup.set_shift_state(self.keyboard.shift_state());
        self.machine.hand_off();
        self.popup = Some(popup);
    }

    /// Close the popup, if open.
    pub fn dismiss_popup(&mut self) {
        if let Some(popup) = self.popup.take() {
            tracing::debug!(parent_key = popup.parent_key(), "popup dismissed");
            self.renderer.invalidate_all();
        }
    }

    fn sync_pressed(&mut self) {
        self.renderer.press_only(self.machine.pressed_key());
    }

    // -- keyboard lifecycle -------------------------------------------------

    /// Install a new keyboard, aborting the in-flight gesture.
    pub fn replace_keyboard(&mut self, keyboard: Keyboard) {
        self.generation += 1;
        self.machine.keyboard_replaced();
        self.popups.clear();
        self.popup = None;
        self.keyboard = keyboard;
        self.renderer.attach(&self.keyboard);
        tracing::debug!(
            generation = self.generation,
            keys = self.keyboard.keys().len(),
            "keyboard replaced"
        );
    }

    /// Rescale the keyboard to a new surface width.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.keyboard.resize(width, height);
        self.popups.clear();
        self.dismiss_popup();
        self.renderer.invalidate_all();
    }

    /// Apply a shift state to the keyboard (and any open popup).
    pub fn set_shift_state(&mut self, state: ShiftState) {
        if self.keyboard.set_shift_state(state) {
            self.renderer.invalidate_all();
        }
        if let Some(popup) = self.popup.as_mut() {
            popup.set_shift_state(state);
        }
    }

    pub fn set_config(&mut self, config: &KeyboardConfig) {
        self.config = config.clone();
        self.resolver
            .set_proximity_correction(config.features.proximity_correction);
        self.machine.set_config(config);
        if let Some(popup) = self.popup.as_mut() {
            popup.set_config(config);
        }
    }

    /// Move accessibility focus.
    pub fn set_focus(&mut self, index: Option<usize>) {
        self.renderer.set_focused(index);
    }

    // -- output -------------------------------------------------------------

    /// Paint the keyboard's dirty keys.
    pub fn paint<P: KeyPainter + ?Sized>(&mut self, painter: &mut P) -> PaintReport {
        self.renderer.paint(&self.keyboard, painter)
    }

    /// Paint the open popup, in popup coordinates.
    pub fn paint_popup<P: KeyPainter + ?Sized>(&mut self, painter: &mut P) -> Option<PaintReport> {
        self.popup.as_mut().map(|popup| popup.paint(painter))
    }

    #[must_use]
    pub fn accessibility(&self) -> AccessibilityMap<'_> {
        AccessibilityMap::new(&self.keyboard)
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    #[must_use]
    pub fn config(&self) -> &KeyboardConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &HitResolver {
        &self.resolver
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub fn popup(&self) -> Option<&ActivePopup> {
        self.popup.as_ref()
    }

    /// Key whose preview should be shown, if any.
    #[must_use]
    pub fn preview(&self) -> Option<usize> {
        self.machine.preview()
    }

    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        self.machine.phase()
    }

    /// Number of keyboards installed after the first.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
