#![forbid(unsafe_code)]

//! Key actions → editor commands.
//!
//! [`KeyInterpreter`] sits between the engine's [`KeyboardAction`] stream
//! and the text field. It owns the [`ShiftMachine`] and the current
//! [`KeyboardMode`], so shift presses, mode switches and capitalization are
//! resolved here rather than by the host.

use std::time::Instant;

use tapboard_core::action::{KeyboardAction, SwipeDirection};
use tapboard_core::codes::{self, KeyCode};
use tapboard_core::config::KeyboardConfig;
use tapboard_layout::{KeyboardMode, ShiftState};

use crate::shift::{InputFieldKind, ShiftMachine};

/// Instruction for the text field or the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    CommitText(String),
    DeleteBackward,
    /// A non-character code the host handles (enter, alt, custom codes).
    SendCode(KeyCode),
    /// Rebuild the keyboard in this mode.
    SwitchMode(KeyboardMode),
    /// Redraw with this shift state.
    ShiftChanged(ShiftState),
    Swipe(SwipeDirection),
    Done,
    Cancel,
}

/// Stateful action interpreter for one input session.
#[derive(Debug, Clone)]
pub struct KeyInterpreter {
    shift: ShiftMachine,
    mode: KeyboardMode,
}

impl KeyInterpreter {
    #[must_use]
    pub fn new(config: &KeyboardConfig) -> Self {
        Self {
            shift: ShiftMachine::new(
                config.timing.shift_double_tap(),
                config.features.auto_capitalize,
            ),
            mode: KeyboardMode::LETTERS,
        }
    }

    pub fn set_config(&mut self, config: &KeyboardConfig) {
        self.shift.set_double_tap(config.timing.shift_double_tap());
        self.shift
            .set_auto_capitalize(config.features.auto_capitalize);
    }

    #[must_use]
    pub fn mode(&self) -> KeyboardMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: KeyboardMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn shift_state(&self) -> ShiftState {
        self.shift.state()
    }

    #[must_use]
    pub fn shift_machine(&self) -> &ShiftMachine {
        &self.shift
    }

    pub fn shift_machine_mut(&mut self) -> &mut ShiftMachine {
        &mut self.shift
    }

    /// A field gained focus. Returns the commands to bring the keyboard
    /// in line with it.
    pub fn start_input(
        &mut self,
        field: InputFieldKind,
        text_before_cursor: &str,
    ) -> Vec<EditorCommand> {
        let before = self.shift.state();
        let after = self.shift.start_input(field, text_before_cursor);
        let mut commands = Vec::new();
        if self.mode != KeyboardMode::LETTERS {
            self.mode = KeyboardMode::LETTERS;
            commands.push(EditorCommand::SwitchMode(self.mode));
        }
        if after != before {
            commands.push(EditorCommand::ShiftChanged(after));
        }
        commands
    }

    /// Translate one engine action.
    pub fn interpret(&mut self, action: &KeyboardAction, now: Instant) -> Vec<EditorCommand> {
        let before = self.shift.state();
        let mut commands = Vec::new();
        match action {
            KeyboardAction::Press { .. } | KeyboardAction::Release { .. } => {}
            KeyboardAction::Swipe { direction } => {
                commands.push(EditorCommand::Swipe(*direction));
            }
            KeyboardAction::Text { text } => {
                if !text.is_empty() {
                    self.shift.commit_text(text);
                    commands.push(EditorCommand::CommitText(text.clone()));
                }
            }
            KeyboardAction::Key { code, .. } => self.on_code(*code, now, &mut commands),
        }

        let after = self.shift.state();
        if after != before {
            commands.push(EditorCommand::ShiftChanged(after));
        }
        commands
    }

    fn on_code(&mut self, code: KeyCode, now: Instant, commands: &mut Vec<EditorCommand>) {
        match code {
            codes::DELETE => {
                self.shift.delete_backward();
                commands.push(EditorCommand::DeleteBackward);
            }
            codes::SHIFT if self.mode.is_symbols() => {
                self.mode = if self.mode == KeyboardMode::SYMBOLS {
                    KeyboardMode::SYMBOLS_SHIFTED
                } else {
                    KeyboardMode::SYMBOLS
                };
                commands.push(EditorCommand::SwitchMode(self.mode));
            }
            codes::SHIFT => {
                self.shift.press(now);
            }
            codes::MODE_CHANGE => {
                self.mode = if self.mode.is_symbols() {
                    KeyboardMode::LETTERS
                } else {
                    KeyboardMode::SYMBOLS
                };
                commands.push(EditorCommand::SwitchMode(self.mode));
            }
            codes::CANCEL => commands.push(EditorCommand::Cancel),
            codes::DONE => commands.push(EditorCommand::Done),
            codes::ENTER => commands.push(EditorCommand::SendCode(codes::ENTER)),
            code if code >= codes::SPACE => {
                let Some(ch) = codes::to_char(code) else {
                    tracing::warn!(code, "key code is not a character");
                    return;
                };
                let text: String = if self.shift.state().is_shifted() && !self.mode.is_symbols() {
                    ch.to_uppercase().collect()
                } else {
                    ch.to_string()
                };
                self.shift.commit_text(&text);
                commands.push(EditorCommand::CommitText(text));
            }
            code => commands.push(EditorCommand::SendCode(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyboardAction {
        KeyboardAction::key(code)
    }

    fn interpreter() -> KeyInterpreter {
        KeyInterpreter::new(&KeyboardConfig::default())
    }

    #[test]
    fn press_and_release_are_silent() {
        let mut i = interpreter();
        let now = Instant::now();
        assert!(i.interpret(&KeyboardAction::Press { code: 97 }, now).is_empty());
        assert!(i.interpret(&KeyboardAction::Release { code: 97 }, now).is_empty());
    }

    #[test]
    fn one_shot_shift_capitalizes_one_letter() {
        let mut i = interpreter();
        let now = Instant::now();
        assert_eq!(
            i.interpret(&key(codes::SHIFT), now),
            vec![EditorCommand::ShiftChanged(ShiftState::OnOneChar)]
        );
        assert_eq!(
            i.interpret(&key('h' as KeyCode), now),
            vec![
                EditorCommand::CommitText("H".to_owned()),
                EditorCommand::ShiftChanged(ShiftState::Off)
            ]
        );
        assert_eq!(
            i.interpret(&key('i' as KeyCode), now),
            vec![EditorCommand::CommitText("i".to_owned())]
        );
    }

    #[test]
    fn caps_lock_after_double_tap() {
        let mut i = interpreter();
        let t = Instant::now();
        i.interpret(&key(codes::SHIFT), t);
        i.interpret(&key(codes::SHIFT), t + Duration::from_millis(100));
        assert_eq!(i.shift_state(), ShiftState::OnPermanent);
        i.interpret(&key('a' as KeyCode), t);
        assert_eq!(
            i.interpret(&key('b' as KeyCode), t),
            vec![EditorCommand::CommitText("B".to_owned())]
        );
    }

    #[test]
    fn mode_switching() {
        let mut i = interpreter();
        let now = Instant::now();
        assert_eq!(
            i.interpret(&key(codes::MODE_CHANGE), now),
            vec![EditorCommand::SwitchMode(KeyboardMode::SYMBOLS)]
        );
        assert_eq!(
            i.interpret(&key(codes::SHIFT), now),
            vec![EditorCommand::SwitchMode(KeyboardMode::SYMBOLS_SHIFTED)]
        );
        assert_eq!(
            i.interpret(&key(codes::SHIFT), now),
            vec![EditorCommand::SwitchMode(KeyboardMode::SYMBOLS)]
        );
        assert_eq!(
            i.interpret(&key(codes::MODE_CHANGE), now),
            vec![EditorCommand::SwitchMode(KeyboardMode::LETTERS)]
        );
        assert_eq!(i.shift_state(), ShiftState::Off);
    }

    #[test]
    fn action_codes_map_to_commands() {
        let mut i = interpreter();
        let now = Instant::now();
        assert_eq!(i.interpret(&key(codes::DELETE), now), vec![EditorCommand::DeleteBackward]);
        assert_eq!(i.interpret(&key(codes::DONE), now), vec![EditorCommand::Done]);
        assert_eq!(i.interpret(&key(codes::CANCEL), now), vec![EditorCommand::Cancel]);
        assert_eq!(
            i.interpret(&key(codes::ENTER), now),
            vec![EditorCommand::SendCode(codes::ENTER)]
        );
        assert_eq!(
            i.interpret(&key(codes::ALT), now),
            vec![EditorCommand::SendCode(codes::ALT)]
        );
        assert_eq!(
            i.interpret(&KeyboardAction::Swipe { direction: SwipeDirection::Left }, now),
            vec![EditorCommand::Swipe(SwipeDirection::Left)]
        );
    }

    #[test]
    fn sentence_end_recapitalizes() {
        let mut i = interpreter();
        let now = Instant::now();
        i.interpret(&key('o' as KeyCode), now);
        i.interpret(&key('k' as KeyCode), now);
        i.interpret(&key('.' as KeyCode), now);
        assert_eq!(
            i.interpret(&key(codes::SPACE), now),
            vec![
                EditorCommand::CommitText(" ".to_owned()),
                EditorCommand::ShiftChanged(ShiftState::OnOneChar)
            ]
        );
    }

    #[test]
    fn text_keys_commit_verbatim() {
        let mut i = interpreter();
        let now = Instant::now();
        i.interpret(&key(codes::SHIFT), now);
        let commands = i.interpret(&KeyboardAction::Text { text: ".com".to_owned() }, now);
        assert_eq!(
            commands,
            vec![
                EditorCommand::CommitText(".com".to_owned()),
                EditorCommand::ShiftChanged(ShiftState::Off)
            ]
        );
    }

    #[test]
    fn start_input_resets_mode_and_primes_shift() {
        let mut i = interpreter();
        let now = Instant::now();
        i.interpret(&key(codes::MODE_CHANGE), now);
        assert_eq!(
            i.start_input(InputFieldKind::Text, ""),
            vec![
                EditorCommand::SwitchMode(KeyboardMode::LETTERS),
                EditorCommand::ShiftChanged(ShiftState::OnOneChar)
            ]
        );
        assert_eq!(
            i.start_input(InputFieldKind::Email, ""),
            vec![EditorCommand::ShiftChanged(ShiftState::Off)]
        );
    }
}
