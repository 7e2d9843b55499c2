#![forbid(unsafe_code)]

//! Key codes shared by layouts, the touch engine, and the commit path.
//!
//! Printable keys carry their Unicode scalar value as the code. Action keys
//! use small negative values so they can never collide with a character.

/// A key code: a Unicode scalar value or one of the negative action codes.
pub type KeyCode = i32;

/// Toggles the shift state.
pub const SHIFT: KeyCode = -1;
/// Switches between letter and symbol layouts.
pub const MODE_CHANGE: KeyCode = -2;
/// Dismisses the keyboard.
pub const CANCEL: KeyCode = -3;
/// Finishes input in the current field.
pub const DONE: KeyCode = -4;
/// Deletes the character before the cursor.
pub const DELETE: KeyCode = -5;
/// Toggles the alternate-character modifier.
pub const ALT: KeyCode = -6;

/// Line feed, used by the enter key.
pub const ENTER: KeyCode = '\n' as KeyCode;
/// Space bar.
pub const SPACE: KeyCode = ' ' as KeyCode;

/// Codes at or below this value never take part in proximity correction.
pub const LAST_NON_PRINTABLE: KeyCode = SPACE;

/// Returns true for codes that stand for an action rather than a character.
#[inline]
#[must_use]
pub const fn is_action(code: KeyCode) -> bool {
    code < 0
}

/// Returns true for codes eligible as alternatives in proximity correction.
#[inline]
#[must_use]
pub const fn is_correctable(code: KeyCode) -> bool {
    code > LAST_NON_PRINTABLE
}

/// Convert a code to the character it commits, if any.
#[inline]
#[must_use]
pub fn to_char(code: KeyCode) -> Option<char> {
    u32::try_from(code).ok().and_then(char::from_u32)
}

/// Labels that stand for an action key rather than the character they show.
///
/// A layout key whose label is one of these glyphs and which declares no
/// explicit code receives the mapped action code instead of the glyph's
/// scalar value.
pub const RESERVED_GLYPHS: &[(&str, KeyCode)] = &[
    ("⇧", SHIFT),
    ("⌫", DELETE),
    ("↵", ENTER),
    ("⏎", ENTER),
    ("␣", SPACE),
    ("⌨", CANCEL),
    ("✓", DONE),
];

/// Look up the action code for a reserved label glyph.
#[must_use]
pub fn reserved_glyph(label: &str) -> Option<KeyCode> {
    RESERVED_GLYPHS
        .iter()
        .find(|(glyph, _)| *glyph == label)
        .map(|&(_, code)| code)
}

/// Parse a code list: a single integer or a comma-separated list.
///
/// Entries that fail to parse are skipped; an input with no valid entries
/// yields an empty list so the caller can fall back to the label.
#[must_use]
pub fn parse_code_list(raw: &str) -> Vec<KeyCode> {
    raw.split(',')
        .filter_map(|part| parse_code(part.trim()))
        .collect()
}

fn parse_code(part: &str) -> Option<KeyCode> {
    if part.is_empty() {
        return None;
    }
    if let Some(hex) = part
        .strip_prefix("0x")
        .or_else(|| part.strip_prefix("0X"))
    {
        return i32::from_str_radix(hex, 16).ok();
    }
    part.parse().ok()
}
