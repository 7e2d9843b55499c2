#![forbid(unsafe_code)]

//! Session-level flows: typing with shift and auto-caps, mode switching,
//! and loading layouts and config from disk.

use std::io::Write as _;
use std::time::{Duration, Instant};

use tapboard::prelude::*;
use tapboard::{Error, KeyboardMode};

// ============================================================================
// Helpers
// ============================================================================

const MS: Duration = Duration::from_millis(1);

/// Letters row `h i o k .`, symbol rows `1 2 3` / `! @ #`, and a shared
/// bottom row `⇧ ?123 space ⌫ ⏎`, all 40 px keys on a 400 px surface.
const LAYOUT: &str = r##"
[keyboard]
key_width = 40
key_height = 40

[[row]]
mode = 1
[[row.key]]
label = "h"
[[row.key]]
label = "i"
[[row.key]]
label = "o"
[[row.key]]
label = "k"
[[row.key]]
label = "."

[[row]]
mode = 2
[[row.key]]
label = "1"
[[row.key]]
label = "2"
[[row.key]]
label = "3"

[[row]]
mode = 3
[[row.key]]
label = "!"
[[row.key]]
label = "@"
[[row.key]]
label = "#"

[[row]]
[[row.key]]
codes = -1
label = "⇧"
sticky = true
modifier = true
[[row.key]]
codes = -2
label = "?123"
[[row.key]]
codes = 32
label = " "
key_width = 120
[[row.key]]
codes = -5
icon = "delete"
repeatable = true
[[row.key]]
codes = 10
label = "enter"
"##;

const SHIFT: (i32, i32) = (20, 60);
const MODE: (i32, i32) = (60, 60);
const SPACE: (i32, i32) = (140, 60);
const DELETE: (i32, i32) = (220, 60);

fn session() -> Session {
    let mut library = LayoutLibrary::new();
    library.insert_toml("main", LAYOUT).unwrap();
    Session::new(library, "main", 400, 300, &KeyboardConfig::default()).unwrap()
}

struct Typist {
    session: Session,
    now: Instant,
}

impl Typist {
    fn new(session: Session) -> Self {
        Self {
            session,
            now: Instant::now(),
        }
    }

    fn tap(&mut self, (x, y): (i32, i32)) -> Vec<EditorCommand> {
        self.now += MS * 300;
        let mut commands = self.session.touch(&TouchInput::down(x, y, self.now));
        commands.extend(self.session.touch(&TouchInput::up(x, y, self.now + MS * 60)));
        commands
    }

    fn typed(&mut self, keys: &[(i32, i32)]) -> String {
        let mut text = String::new();
        for &key in keys {
            for command in self.tap(key) {
                match command {
                    EditorCommand::CommitText(t) => text.push_str(&t),
                    EditorCommand::DeleteBackward => {
                        text.pop();
                    }
                    _ => {}
                }
            }
        }
        text
    }
}

fn letter(index: i32) -> (i32, i32) {
    (index * 40 + 20, 20)
}

// ============================================================================
// Typing
// ============================================================================

#[test]
fn empty_field_starts_capitalized() {
    let mut s = session();
    assert_eq!(
        s.start_input(InputFieldKind::Text, ""),
        vec![EditorCommand::ShiftChanged(ShiftState::OnOneChar)]
    );
    assert!(s.engine().keyboard().is_shifted());

    let mut t = Typist::new(s);
    let h = t.tap(letter(0));
    assert_eq!(
        h,
        vec![
            EditorCommand::CommitText("H".to_owned()),
            EditorCommand::ShiftChanged(ShiftState::Off)
        ]
    );
    assert!(!t.session.engine().keyboard().is_shifted());
}

#[test]
fn sentence_flow_with_auto_caps_and_delete() {
    let mut s = session();
    s.start_input(InputFieldKind::Text, "");
    let mut t = Typist::new(s);
    let text = t.typed(&[
        letter(0),
        letter(1),
        letter(4),
        SPACE,
        letter(2),
        letter(3),
        DELETE,
        letter(3),
    ]);
    assert_eq!(text, "Hi. Ok");
    assert_eq!(t.session.shift_state(), ShiftState::Off);
}

#[test]
fn password_fields_never_auto_capitalize() {
    let mut s = session();
    assert!(s.start_input(InputFieldKind::Password, "").is_empty());
    let mut t = Typist::new(s);
    assert_eq!(t.typed(&[letter(0), letter(4), SPACE, letter(1)]), "h. i");
}

#[test]
fn caps_lock_survives_letters() {
    let mut s = session();
    s.start_input(InputFieldKind::Email, "");
    let mut t = Typist::new(s);
    // Two quick shift taps lock caps.
    let start = t.now;
    t.session.touch(&TouchInput::down(SHIFT.0, SHIFT.1, start));
    t.session.touch(&TouchInput::up(SHIFT.0, SHIFT.1, start + MS * 40));
    t.session.touch(&TouchInput::down(SHIFT.0, SHIFT.1, start + MS * 120));
    t.session.touch(&TouchInput::up(SHIFT.0, SHIFT.1, start + MS * 160));
    assert_eq!(t.session.shift_state(), ShiftState::OnPermanent);
    assert_eq!(t.typed(&[letter(2), letter(3)]), "OK");
}

// ============================================================================
// Mode switching
// ============================================================================

#[test]
fn mode_key_rebuilds_keyboard() {
    let mut t = Typist::new(session());
    assert_eq!(t.tap(MODE), vec![EditorCommand::SwitchMode(KeyboardMode::SYMBOLS)]);
    assert_eq!(t.session.mode(), KeyboardMode::SYMBOLS);
    assert_eq!(t.session.engine().generation(), 1);
    assert_eq!(t.typed(&[letter(0)]), "1");

    // Shift on a symbols keyboard switches to the shifted symbols.
    assert_eq!(
        t.tap(SHIFT),
        vec![EditorCommand::SwitchMode(KeyboardMode::SYMBOLS_SHIFTED)]
    );
    assert_eq!(t.typed(&[letter(1)]), "@");

    assert_eq!(t.tap(MODE), vec![EditorCommand::SwitchMode(KeyboardMode::LETTERS)]);
    assert_eq!(t.typed(&[letter(0)]), "h");
    assert_eq!(t.session.engine().generation(), 3);
}

#[test]
fn shifted_symbols_reach_hash_key() {
    let mut t = Typist::new(session());
    t.tap(MODE);
    t.tap(SHIFT);
    assert_eq!(t.session.mode(), KeyboardMode::SYMBOLS_SHIFTED);
    assert_eq!(t.typed(&[letter(2)]), "#");
}

#[test]
fn letters_return_with_pending_shift() {
    let mut s = session();
    s.start_input(InputFieldKind::Text, "");
    let mut t = Typist::new(s);
    t.tap(MODE);
    assert!(!t.session.engine().keyboard().is_shifted());
    t.tap(MODE);
    assert!(t.session.engine().keyboard().is_shifted());
    assert_eq!(t.typed(&[letter(0)]), "H");
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout_path = dir.path().join("qwerty.toml");
    std::fs::File::create(&layout_path)
        .unwrap()
        .write_all(LAYOUT.as_bytes())
        .unwrap();
    let config_path = dir.path().join("keyboard.toml");
    std::fs::write(&config_path, "[timing]\ndebounce_ms = 40\n").unwrap();

    let s = Session::load(&layout_path, Some(config_path.as_path()), 400, 300).unwrap();
    assert_eq!(s.layout_name(), "qwerty");
    assert_eq!(s.engine().config().timing.debounce_ms, 40);
}

#[test]
fn load_errors_are_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let err = Session::load(&missing, None, 400, 300).unwrap_err();
    assert_eq!(err.error_type(), "layout");

    let layout_path = dir.path().join("main.toml");
    std::fs::write(&layout_path, LAYOUT).unwrap();
    let config_path = dir.path().join("bad.toml");
    std::fs::write(&config_path, "[timing]\ndebounce_ms = \"soon\"\n").unwrap();
    let err = Session::load(&layout_path, Some(config_path.as_path()), 400, 300).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let library = LayoutLibrary::new();
    let err = Session::new(library, "nope", 400, 300, &KeyboardConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Layout(_)));
}
