#![forbid(unsafe_code)]

//! Key captions as they should be drawn.

use std::borrow::Cow;

use tapboard_layout::{Key, ShiftState};

/// Labels this long or longer keep their declared case ("123", "Enter").
pub const MAX_FOLDED_LABEL: usize = 3;

/// What to draw on a key face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayLabel {
    /// Caption text, already case-folded.
    Text(String),
    /// Icon reference for the host to resolve.
    Icon(String),
    /// Nothing to draw.
    Blank,
}

impl DisplayLabel {
    /// Label for `key` under the given shift state. Labels win over icons.
    #[must_use]
    pub fn for_key(key: &Key, shift: ShiftState) -> Self {
        if let Some(label) = key.label.as_deref() {
            return Self::Text(adjust_case(label, shift.is_shifted()).into_owned());
        }
        match key.icon.as_deref() {
            Some(icon) => Self::Icon(icon.to_owned()),
            None => Self::Blank,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Upper-case short lowercase labels when shifted.
#[must_use]
pub fn adjust_case(label: &str, shifted: bool) -> Cow<'_, str> {
    let short = label.chars().count() < MAX_FOLDED_LABEL;
    let lowercase = label.chars().next().is_some_and(char::is_lowercase);
    if shifted && short && lowercase {
        Cow::Owned(label.to_uppercase())
    } else {
        Cow::Borrowed(label)
    }
}
