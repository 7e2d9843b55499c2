#![forbid(unsafe_code)]

//! tapboard public facade crate.
//!
//! This crate provides the stable surface area for hosts embedding an
//! on-screen keyboard. It re-exports the common types from the internal
//! crates, adds a unified [`Error`], and offers [`Session`] for the usual
//! "one layout, one surface, one text field" setup.
//!
//! ```rust,ignore
//! use std::time::Instant;
//! use tapboard::prelude::*;
//!
//! let mut session = Session::load("qwerty.toml", None, 1080, 720)?;
//! for command in session.touch(&TouchInput::down(120, 40, Instant::now())) {
//!     // apply CommitText / DeleteBackward / ... to the text field
//! }
//! ```

pub mod error;
pub mod session;

pub use error::{Error, Result};
pub use session::Session;

// --- Core re-exports -------------------------------------------------------

pub use tapboard_core::action::{Alternative, Alternatives, KeyboardAction, SwipeDirection};
pub use tapboard_core::codes::KeyCode;
pub use tapboard_core::config::{ConfigError, KeyboardConfig};
pub use tapboard_core::geometry::{EdgeFlags, Point, Rect};

// --- Layout re-exports -----------------------------------------------------

pub use tapboard_layout::{
    HitResolver, Key, Keyboard, KeyboardMode, LayoutLibrary, LayoutParams, LayoutParseError,
    Resolution, ShiftState,
};

// --- Render re-exports -----------------------------------------------------

pub use tapboard_render::{
    AccessibilityMap, DescriptionProvider, DisplayLabel, KeyPainter, KeyVisualState, PaintReport,
    Renderer,
};

// --- Input re-exports ------------------------------------------------------

pub use tapboard_input::{
    EditorCommand, GesturePhase, InputFieldKind, KeyInterpreter, KeyboardEngine, TouchInput,
    TouchPhase,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        EditorCommand, Error, InputFieldKind, KeyPainter, Keyboard, KeyboardAction, KeyboardConfig,
        KeyboardEngine, LayoutLibrary, Result, Session, ShiftState, TouchInput,
    };

    pub use crate::{codes, core, input, layout, render};
}

pub use tapboard_core as core;
pub use tapboard_core::codes;
pub use tapboard_input as input;
pub use tapboard_layout as layout;
pub use tapboard_render as render;
