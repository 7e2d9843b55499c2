#![forbid(unsafe_code)]

//! Shift and sentence auto-capitalization.
//!
//! # State machine
//!
//! Shift presses:
//! - `OnPermanent` → `Off`;
//! - a press within the double-tap window of the previous `Off`/`OnOneChar`
//!   toggle → `OnPermanent`;
//! - otherwise `Off` ↔ `OnOneChar`.
//!
//! Committing an ordinary character in `OnOneChar` returns to `Off`. With
//! auto-capitalization on, committing a space right after `.`, `?` or `!`
//! arms `OnOneChar` again, except in password, email and URI fields.

use std::time::{Duration, Instant};

use tapboard_layout::ShiftState;

/// Kind of text field being edited, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputFieldKind {
    #[default]
    Text,
    Password,
    VisiblePassword,
    WebPassword,
    Email,
    WebEmail,
    Uri,
}

impl InputFieldKind {
    /// Fields where capitalizing the next character would corrupt input.
    #[must_use]
    pub const fn suppresses_auto_caps(self) -> bool {
        !matches!(self, Self::Text)
    }
}

const SENTENCE_END: [char; 3] = ['.', '?', '!'];

/// Shift state plus the context that drives its automatic transitions.
#[derive(Debug, Clone)]
pub struct ShiftMachine {
    state: ShiftState,
    last_toggle: Option<Instant>,
    double_tap: Duration,
    auto_capitalize: bool,
    field: InputFieldKind,
    /// The two most recently committed characters, oldest first.
    recent: [Option<char>; 2],
}

impl ShiftMachine {
    #[must_use]
    pub fn new(double_tap: Duration, auto_capitalize: bool) -> Self {
        Self {
            state: ShiftState::Off,
            last_toggle: None,
            double_tap,
            auto_capitalize,
            field: InputFieldKind::Text,
            recent: [None, None],
        }
    }

    #[must_use]
    pub fn state(&self) -> ShiftState {
        self.state
    }

    #[must_use]
    pub fn field(&self) -> InputFieldKind {
        self.field
    }

    pub fn set_auto_capitalize(&mut self, enabled: bool) {
        self.auto_capitalize = enabled;
    }

    pub fn set_double_tap(&mut self, window: Duration) {
        self.double_tap = window;
    }

    /// Explicit shift-key press.
    pub fn press(&mut self, now: Instant) -> ShiftState {
        let double = self
            .last_toggle
            .is_some_and(|last| now.saturating_duration_since(last) < self.double_tap);
        self.last_toggle = Some(now);
        self.state = match self.state {
            ShiftState::OnPermanent => ShiftState::Off,
            _ if double => ShiftState::OnPermanent,
            ShiftState::Off => ShiftState::OnOneChar,
            ShiftState::OnOneChar => ShiftState::Off,
        };
        tracing::debug!(state = ?self.state, "shift pressed");
        self.state
    }

    /// A character was committed.
    pub fn commit_char(&mut self, ch: char) -> ShiftState {
        self.recent = [self.recent[1], Some(ch)];
        if self.state == ShiftState::OnOneChar {
            self.state = ShiftState::Off;
        }
        self.apply_auto_caps();
        self.state
    }

    /// A multi-character text was committed.
    pub fn commit_text(&mut self, text: &str) -> ShiftState {
        let mut chars = text.chars().rev();
        let last = chars.next();
        if last.is_none() {
            return self.state;
        }
        let previous = chars.next().or(self.recent[1]);
        self.recent = [previous, last];
        if self.state == ShiftState::OnOneChar {
            self.state = ShiftState::Off;
        }
        self.apply_auto_caps();
        self.state
    }

    /// The character before the cursor was deleted.
    pub fn delete_backward(&mut self) -> ShiftState {
        self.recent = [None, self.recent[0]];
        self.state
    }

    /// A field gained focus with `text_before_cursor` already present.
    ///
    /// Caps lock survives a field change; otherwise the state is
    /// recomputed from the field kind and the existing text, so an empty
    /// text field starts capitalized.
    pub fn start_input(&mut self, field: InputFieldKind, text_before_cursor: &str) -> ShiftState {
        self.field = field;
        let mut tail = text_before_cursor.chars().rev();
        let last = tail.next();
        self.recent = [tail.next(), last];
        if self.state != ShiftState::OnPermanent {
            self.state = ShiftState::Off;
            if last.is_none() && self.auto_caps_allowed() {
                self.state = ShiftState::OnOneChar;
            } else {
                self.apply_auto_caps();
            }
        }
        self.state
    }

    /// Force a state (e.g. restoring after a mode switch).
    pub fn set_state(&mut self, state: ShiftState) {
        self.state = state;
    }

    fn auto_caps_allowed(&self) -> bool {
        self.auto_capitalize && !self.field.suppresses_auto_caps()
    }

    fn apply_auto_caps(&mut self) {
        if !self.auto_caps_allowed() || self.state != ShiftState::Off {
            return;
        }
        if let [Some(previous), Some(' ')] = self.recent
            && SENTENCE_END.contains(&previous)
        {
            tracing::trace!("sentence end, capitalizing next character");
            self.state = ShiftState::OnOneChar;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn machine() -> ShiftMachine {
        ShiftMachine::new(WINDOW, true)
    }

    #[test]
    fn single_tap_is_one_shot() {
        let t = Instant::now();
        let mut m = machine();
        assert_eq!(m.press(t), ShiftState::OnOneChar);
        assert_eq!(m.commit_char('H'), ShiftState::Off);
        assert_eq!(m.commit_char('i'), ShiftState::Off);
    }

    #[test]
    fn double_tap_locks_and_single_tap_unlocks() {
        let t = Instant::now();
        let mut m = machine();
        m.press(t);
        assert_eq!(m.press(t + Duration::from_millis(150)), ShiftState::OnPermanent);
        assert_eq!(m.commit_char('A'), ShiftState::OnPermanent);
        assert_eq!(m.press(t + Duration::from_millis(250)), ShiftState::Off);
    }

    #[test]
    fn unlock_then_quick_press_locks_again() {
        let t = Instant::now();
        let mut m = machine();
        m.press(t);
        m.press(t + Duration::from_millis(150));
        assert_eq!(m.press(t + Duration::from_millis(250)), ShiftState::Off);
        assert_eq!(m.press(t + Duration::from_millis(350)), ShiftState::OnPermanent);
        assert_eq!(m.press(t + Duration::from_millis(1_000)), ShiftState::Off);
        assert_eq!(m.press(t + Duration::from_millis(2_000)), ShiftState::OnOneChar);
    }

    #[test]
    fn slow_taps_toggle() {
        let t = Instant::now();
        let mut m = machine();
        m.press(t);
        assert_eq!(m.press(t + WINDOW), ShiftState::Off);
        assert_eq!(m.press(t + WINDOW * 3), ShiftState::OnOneChar);
    }

    #[test]
    fn sentence_end_capitalizes() {
        let mut m = machine();
        m.commit_char('o');
        m.commit_char('k');
        assert_eq!(m.commit_char('.'), ShiftState::Off);
        assert_eq!(m.commit_char(' '), ShiftState::OnOneChar);
        assert_eq!(m.commit_char('N'), ShiftState::Off);

        m.commit_char('?');
        assert_eq!(m.commit_text(" "), ShiftState::OnOneChar);
        assert_eq!(m.commit_text(".com"), ShiftState::Off);
    }

    #[test]
    fn restricted_fields_never_auto_capitalize() {
        for field in [
            InputFieldKind::Password,
            InputFieldKind::VisiblePassword,
            InputFieldKind::WebPassword,
            InputFieldKind::Email,
            InputFieldKind::WebEmail,
            InputFieldKind::Uri,
        ] {
            let mut m = machine();
            assert_eq!(m.start_input(field, ""), ShiftState::Off);
            m.commit_char('!');
            assert_eq!(m.commit_char(' '), ShiftState::Off);
        }
    }

    #[test]
    fn start_input_primes_from_context() {
        let mut m = machine();
        assert_eq!(m.start_input(InputFieldKind::Text, ""), ShiftState::OnOneChar);
        assert_eq!(m.start_input(InputFieldKind::Text, "Hello. "), ShiftState::OnOneChar);
        assert_eq!(m.start_input(InputFieldKind::Text, "Hello"), ShiftState::Off);

        let mut off = ShiftMachine::new(WINDOW, false);
        assert_eq!(off.start_input(InputFieldKind::Text, ""), ShiftState::Off);
    }

    #[test]
    fn delete_rewinds_the_window() {
        let mut m = machine();
        m.commit_char('.');
        m.commit_char('x');
        m.delete_backward();
        assert_eq!(m.commit_char(' '), ShiftState::OnOneChar);
    }
}
