#![forbid(unsafe_code)]

//! Touch state machine: turns one logical pointer into key actions.
//!
//! [`TouchStateMachine`] consumes normalized [`TouchEvent`]s and timer
//! expirations and appends [`KeyboardAction`]s to a caller-provided buffer.
//!
//! # State Machine
//!
//! ```text
//! Idle ──Down──▶ Down ──Move──▶ Moving ──Up──▶ Idle
//!                  │                │
//!                  └─▶ LongPressPending ─(timer)─▶ popup hand-off
//! Cancel from any state ──▶ Idle
//! ```
//!
//! - **Down**: resolve the key, update multi-tap, emit `Press`, arm the
//!   long-press timer; repeatable keys deliver at once and arm the repeat
//!   timer.
//! - **Move**: re-resolve; leaving a key records "last key" timing for the
//!   debounce check and restarts the long-press timer. The swipe detector
//!   runs on every move.
//! - **Up**: debounce, then deliver exactly one key (or multi-tap step)
//!   unless the gesture repeated, swiped, or was aborted.
//! - **Cancel**: drop timers and the pending delivery.
//!
//! # Invariants
//!
//! 1. `Press` precedes the gesture's `Key`/`Text`, and `Release` follows it.
//!    Repeating keys emit `Press`/`Key` pairs and a single final `Release`.
//! 2. At most one delivery per gesture, except for repeat.
//! 3. An aborted gesture (keyboard replaced, popup opened) never delivers.
//! 4. Zero-duration gestures deliver the key under the touch-up point.

use std::time::{Duration, Instant};

use tapboard_core::action::{KeyboardAction, SwipeDirection};
use tapboard_core::codes;
use tapboard_core::config::KeyboardConfig;
use tapboard_core::geometry::Point;
use tapboard_layout::{HitResolver, Keyboard};

use crate::multitap::MultiTap;
use crate::swipe::SwipeTracker;
use crate::timer::{TimerKind, TimerQueue};
use crate::touch::{TouchEvent, TouchPhase};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Coarse phase of the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    Idle,
    Down,
    LongPressPending,
    Moving,
}

/// Bookkeeping for the gesture between `Down` and `Up`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchSession {
    pub down: Point,
    pub down_time: Instant,
    /// Key under the finger.
    pub current_key: Option<usize>,
    /// Key the finger was on before `current_key`.
    pub last_key: Option<usize>,
    /// Time spent on `current_key`.
    pub current_key_time: Duration,
    /// Time spent on `last_key`.
    pub last_key_time: Duration,
    pub last_move_time: Instant,
    /// Previous touch position.
    pub last: Point,
    /// Position at which `last_key` was left.
    pub last_code: Point,
    /// Key being auto-repeated.
    pub repeat_key: Option<usize>,
    /// Delivery suppressed for the rest of the gesture.
    pub abort: bool,
    /// A swipe fired; the rest of the gesture is ignored.
    pub swiped: bool,
    pub moved: bool,
}

impl TouchSession {
    fn new(x: i32, y: i32, time: Instant, key: Option<usize>) -> Self {
        let point = Point::new(x, y);
        Self {
            down: point,
            down_time: time,
            current_key: key,
            last_key: None,
            current_key_time: Duration::ZERO,
            last_key_time: Duration::ZERO,
            last_move_time: time,
            last: point,
            last_code: point,
            repeat_key: None,
            abort: false,
            swiped: false,
            moved: false,
        }
    }

    /// The finger moved from `current_key` onto `key`.
    fn switch_key(&mut self, key: Option<usize>, now: Instant) {
        self.last_key = self.current_key;
        self.last_key_time =
            self.current_key_time + now.saturating_duration_since(self.last_move_time);
        self.current_key = key;
        self.current_key_time = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// TouchStateMachine
// ---------------------------------------------------------------------------

/// Gesture interpreter for one keyboard surface.
///
/// A nested machine (driving a popup keyboard) never arms long-press and
/// never detects swipes or shows previews.
#[derive(Debug, Clone)]
pub struct TouchStateMachine {
    config: KeyboardConfig,
    nested: bool,
    timers: TimerQueue,
    swipe: SwipeTracker,
    multitap: MultiTap,
    session: Option<TouchSession>,
    preview: Option<usize>,
}

impl TouchStateMachine {
    #[must_use]
    pub fn new(config: &KeyboardConfig) -> Self {
        Self {
            config: config.clone(),
            nested: false,
            timers: TimerQueue::new(),
            swipe: SwipeTracker::new(),
            multitap: MultiTap::new(),
            session: None,
            preview: None,
        }
    }

    /// Machine for a popup keyboard.
    #[must_use]
    pub fn nested(config: &KeyboardConfig) -> Self {
        Self {
            nested: true,
            ..Self::new(config)
        }
    }

    #[must_use]
    pub fn config(&self) -> &KeyboardConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: &KeyboardConfig) {
        self.config = config.clone();
    }

    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        match &self.session {
            None => GesturePhase::Idle,
            Some(s) if s.moved => GesturePhase::Moving,
            Some(_) if self.timers.is_pending(TimerKind::LongPress) => {
                GesturePhase::LongPressPending
            }
            Some(_) => GesturePhase::Down,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&TouchSession> {
        self.session.as_ref()
    }

    /// Whether a gesture is between `Down` and `Up`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Key to draw as pressed.
    #[must_use]
    pub fn pressed_key(&self) -> Option<usize> {
        self.session
            .as_ref()
            .filter(|s| !s.abort && !s.swiped)
            .and_then(|s| s.current_key)
    }

    /// Key whose preview is showing.
    #[must_use]
    pub fn preview(&self) -> Option<usize> {
        self.preview
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Feed one normalized event.
    pub fn handle(
        &mut self,
        event: TouchEvent,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) {
        match event.phase {
            TouchPhase::Down => self.on_down(event, keyboard, resolver, out),
            TouchPhase::Move => self.on_move(event, keyboard, resolver, out),
            TouchPhase::Up => self.on_up(event, keyboard, resolver, out),
            TouchPhase::Cancel => self.cancel(),
        }
    }

    /// Fire due timers. Returns the key whose long-press timer fired, for
    /// the caller to decide whether it opens a popup.
    pub fn poll(
        &mut self,
        now: Instant,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) -> Option<usize> {
        let mut long_press = None;
        for kind in self.timers.expired(now) {
            match kind {
                TimerKind::Repeat => {
                    let Some(key) = self
                        .session
                        .as_ref()
                        .filter(|s| !s.abort)
                        .and_then(|s| s.repeat_key)
                    else {
                        continue;
                    };
                    if let Some(code) = keyboard.key(key).map(|k| k.code()) {
                        out.push(KeyboardAction::Press { code });
                    }
                    self.send_repeat(key, now, keyboard, resolver, out);
                    self.timers.schedule(
                        TimerKind::Repeat,
                        now,
                        self.config.timing.repeat_interval(),
                    );
                }
                TimerKind::LongPress => {
                    long_press = self
                        .session
                        .as_ref()
                        .filter(|s| !s.abort && !s.swiped)
                        .and_then(|s| s.current_key);
                }
                TimerKind::HidePreview => self.preview = None,
            }
        }
        long_press
    }

    /// End the gesture without delivering anything (CANCEL).
    pub fn cancel(&mut self) {
        self.timers.cancel(TimerKind::LongPress);
        self.timers.cancel(TimerKind::Repeat);
        self.timers.cancel(TimerKind::HidePreview);
        self.swipe.clear();
        self.preview = None;
        if self.session.take().is_some() {
            tracing::debug!("gesture canceled");
        }
    }

    /// The in-flight gesture was taken over by a popup keyboard.
    pub fn hand_off(&mut self) {
        self.cancel();
    }

    /// The keyboard was replaced: retire timers and abort the gesture.
    pub fn keyboard_replaced(&mut self) {
        let generation = self.timers.advance_generation();
        self.multitap.reset();
        self.preview = None;
        if let Some(session) = self.session.as_mut() {
            session.abort = true;
            session.current_key = None;
            session.last_key = None;
            session.repeat_key = None;
        }
        tracing::debug!(generation, "touch state retired for new keyboard");
    }

    // -- phase handlers -----------------------------------------------------

    fn on_down(
        &mut self,
        event: TouchEvent,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) {
        self.timers.cancel(TimerKind::LongPress);
        self.timers.cancel(TimerKind::Repeat);

        let index = resolver.key_at(keyboard, event.x, event.y);
        let key = index.and_then(|i| keyboard.key(i));
        let mut session = TouchSession::new(event.x, event.y, event.time, index);

        self.swipe.start(event.x, event.y, event.time);
        self.multitap.on_down(
            index,
            key,
            event.time,
            self.config.timing.multi_tap_interval(),
        );
        out.push(KeyboardAction::Press {
            code: key.map_or(0, |k| k.code()),
        });
        tracing::trace!(key = ?index, x = event.x, y = event.y, "touch down");

        if let (Some(index), Some(key)) = (index, key) {
            if key.repeatable && self.config.features.auto_repeat {
                session.repeat_key = Some(index);
                self.send_repeat(index, event.time, keyboard, resolver, out);
                self.timers.schedule(
                    TimerKind::Repeat,
                    event.time,
                    self.config.timing.repeat_start_delay(),
                );
            }
            if !self.nested {
                self.timers.schedule(
                    TimerKind::LongPress,
                    event.time,
                    self.config.timing.long_press_timeout(),
                );
            }
        }
        self.show_preview(index, keyboard);
        self.session = Some(session);
    }

    fn on_move(
        &mut self,
        event: TouchEvent,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.swiped {
            self.session = Some(session);
            return;
        }
        session.moved = true;
        self.swipe.add(event.x, event.y, event.time);
        if let Some(direction) = self.detect_swipe(&event, keyboard) {
            self.on_swipe(&mut session, direction, out);
            self.session = Some(session);
            return;
        }

        let index = resolver.key_at(keyboard, event.x, event.y);
        let mut continue_long_press = false;
        if let Some(index) = index {
            match session.current_key {
                None => {
                    session.current_key = Some(index);
                    session.current_key_time =
                        event.time.saturating_duration_since(session.down_time);
                }
                Some(current) if current == index => {
                    session.current_key_time +=
                        event.time.saturating_duration_since(session.last_move_time);
                    continue_long_press = true;
                }
                Some(_) if session.repeat_key.is_none() => {
                    self.multitap.reset();
                    session.last_code = session.last;
                    session.switch_key(Some(index), event.time);
                }
                Some(_) => {}
            }
        }

        if !continue_long_press {
            self.timers.cancel(TimerKind::LongPress);
            if index.is_some() && !self.nested && !session.abort {
                self.timers.schedule(
                    TimerKind::LongPress,
                    event.time,
                    self.config.timing.long_press_timeout(),
                );
            }
        }
        self.show_preview(session.current_key, keyboard);
        session.last_move_time = event.time;
        session.last = Point::new(event.x, event.y);
        self.session = Some(session);
    }

    fn on_up(
        &mut self,
        event: TouchEvent,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        self.timers.cancel(TimerKind::LongPress);
        self.timers.cancel(TimerKind::Repeat);
        if session.swiped {
            return;
        }
        self.swipe.add(event.x, event.y, event.time);
        if let Some(direction) = self.detect_swipe(&event, keyboard) {
            self.on_swipe(&mut session, direction, out);
            return;
        }

        let index = resolver.key_at(keyboard, event.x, event.y);
        let mut target = Point::new(event.x, event.y);
        if index == session.current_key {
            session.current_key_time +=
                event.time.saturating_duration_since(session.last_move_time);
        } else {
            self.multitap.reset();
            session.switch_key(index, event.time);
        }

        if session.current_key_time < session.last_key_time
            && session.current_key_time < self.config.timing.debounce()
            && session.last_key.is_some()
        {
            tracing::debug!(
                from = ?session.current_key,
                to = ?session.last_key,
                on_key_ms = session.current_key_time.as_millis() as u64,
                "debounce correction"
            );
            session.current_key = session.last_key;
            target = session.last_code;
        }

        self.hide_preview(event.time);
        if let Some(repeat) = session.repeat_key {
            if let Some(key) = keyboard.key(repeat) {
                out.push(KeyboardAction::Release { code: key.code() });
            }
        } else if !session.abort {
            self.detect_and_send(session.current_key, target, event.time, keyboard, resolver, out);
        }
    }

    // -- delivery -----------------------------------------------------------

    fn detect_and_send(
        &mut self,
        index: Option<usize>,
        at: Point,
        now: Instant,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) {
        let Some((index, key)) = index.and_then(|i| keyboard.key(i).map(|k| (i, k))) else {
            return;
        };
        if let Some(text) = &key.text {
            out.push(KeyboardAction::Text { text: text.clone() });
            out.push(KeyboardAction::Release { code: key.code() });
        } else {
            let alternatives = resolver.resolve(keyboard, at.x, at.y, true).alternatives;
            let (code, delete_previous) = self.multitap.resolve_code(key);
            if delete_previous {
                out.push(KeyboardAction::key(codes::DELETE));
            }
            out.push(KeyboardAction::Key { code, alternatives });
            out.push(KeyboardAction::Release { code });
        }
        self.multitap.on_sent(index, now);
        tracing::debug!(key = index, code = key.code(), "key delivered");
    }

    fn send_repeat(
        &mut self,
        index: usize,
        now: Instant,
        keyboard: &Keyboard,
        resolver: &HitResolver,
        out: &mut Vec<KeyboardAction>,
    ) {
        let Some(key) = keyboard.key(index) else {
            return;
        };
        let alternatives = resolver.resolve(keyboard, key.x, key.y, true).alternatives;
        out.push(KeyboardAction::Key {
            code: key.code(),
            alternatives,
        });
        self.multitap.on_sent(index, now);
    }

    // -- swipe and preview --------------------------------------------------

    fn detect_swipe(&self, event: &TouchEvent, keyboard: &Keyboard) -> Option<SwipeDirection> {
        if self.nested || event.poly {
            return None;
        }
        self.swipe
            .detect(&self.config.swipe, keyboard.min_width(), keyboard.height())
    }

    fn on_swipe(
        &mut self,
        session: &mut TouchSession,
        direction: SwipeDirection,
        out: &mut Vec<KeyboardAction>,
    ) {
        self.timers.cancel(TimerKind::LongPress);
        self.timers.cancel(TimerKind::Repeat);
        self.timers.cancel(TimerKind::HidePreview);
        self.preview = None;
        session.swiped = true;
        session.repeat_key = None;
        out.push(KeyboardAction::Swipe { direction });
    }

    fn show_preview(&mut self, index: Option<usize>, keyboard: &Keyboard) {
        let enabled = self.config.features.preview_popups && !self.nested;
        let shown = index.filter(|&i| {
            enabled
                && keyboard
                    .key(i)
                    .is_some_and(|k| !k.modifier && k.label.is_some())
        });
        if shown.is_some() {
            self.timers.cancel(TimerKind::HidePreview);
        }
        self.preview = shown;
    }

    fn hide_preview(&mut self, now: Instant) {
        if self.preview.is_some() {
            self.timers.schedule(
                TimerKind::HidePreview,
                now,
                self.config.timing.preview_linger(),
            );
        }
    }
}
