#![forbid(unsafe_code)]

//! One keyboard in use: library, engine and interpreter wired together.
//!
//! [`Session`] is the convenient top of the stack. Touches go in, editor
//! commands come out, and the commands that concern the keyboard itself
//! (mode switches, shift changes) are applied before being returned so the
//! host only has to act on text and key events.

use std::path::Path;
use std::time::Instant;

use tapboard_core::action::KeyboardAction;
use tapboard_core::config::KeyboardConfig;
use tapboard_input::{EditorCommand, InputFieldKind, KeyInterpreter, KeyboardEngine, TouchInput};
use tapboard_layout::{Keyboard, KeyboardMode, LayoutLibrary, LayoutParams, ShiftState};

use crate::error::Result;

/// A keyboard session for one layout on one surface.
#[derive(Debug, Clone)]
pub struct Session {
    library: LayoutLibrary,
    layout: String,
    params: LayoutParams,
    engine: KeyboardEngine,
    interpreter: KeyInterpreter,
}

impl Session {
    /// Start a session on layout `layout` from `library`, sized for a
    /// `width × height` surface.
    pub fn new(
        library: LayoutLibrary,
        layout: &str,
        width: i32,
        height: i32,
        config: &KeyboardConfig,
    ) -> Result<Self> {
        let params = LayoutParams::new(width, height).proximity(config.proximity.clone());
        let keyboard = library.build(layout, &params)?;
        tracing::debug!(layout, width, height, keys = keyboard.keys().len(), "session started");
        Ok(Self {
            engine: KeyboardEngine::new(keyboard, config),
            interpreter: KeyInterpreter::new(config),
            library,
            layout: layout.to_owned(),
            params,
        })
    }

    /// Load a layout file (registered under its file stem) and an optional
    /// TOML config file, then start a session on it.
    pub fn load(
        layout_path: impl AsRef<Path>,
        config_path: Option<&Path>,
        width: i32,
        height: i32,
    ) -> Result<Self> {
        let layout_path = layout_path.as_ref();
        let name = layout_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("main")
            .to_owned();
        let mut library = LayoutLibrary::new();
        library.load_file(name.as_str(), layout_path)?;
        let config = match config_path {
            Some(path) => KeyboardConfig::from_toml_file(path)?.validated()?,
            None => KeyboardConfig::default(),
        };
        Self::new(library, &name, width, height, &config)
    }

    // -- input --------------------------------------------------------------

    /// Feed one raw touch sample.
    pub fn touch(&mut self, input: &TouchInput) -> Vec<EditorCommand> {
        let actions = self.engine.handle_touch(input);
        self.dispatch(&actions, input.time)
    }

    /// Fire due timers (long-press, repeat, preview hide).
    pub fn poll(&mut self, now: Instant) -> Vec<EditorCommand> {
        let actions = self.engine.poll_timers(now, &self.library);
        self.dispatch(&actions, now)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.engine.next_deadline()
    }

    /// A text field gained focus.
    pub fn start_input(
        &mut self,
        field: InputFieldKind,
        text_before_cursor: &str,
    ) -> Vec<EditorCommand> {
        let commands = self.interpreter.start_input(field, text_before_cursor);
        for command in &commands {
            self.apply(command);
        }
        commands
    }

    fn dispatch(&mut self, actions: &[KeyboardAction], now: Instant) -> Vec<EditorCommand> {
        let mut commands = Vec::new();
        for action in actions {
            for command in self.interpreter.interpret(action, now) {
                self.apply(&command);
                commands.push(command);
            }
        }
        commands
    }

    fn apply(&mut self, command: &EditorCommand) {
        match command {
            EditorCommand::SwitchMode(mode) => self.switch_mode(*mode),
            EditorCommand::ShiftChanged(state) if !self.params.mode.is_symbols() => {
                self.engine.set_shift_state(*state);
            }
            _ => {}
        }
    }

    /// Rebuild the keyboard in `mode`. On failure the current keyboard stays.
    fn switch_mode(&mut self, mode: KeyboardMode) {
        let mut params = self.params.clone();
        params.mode = mode;
        let mut keyboard = match self.library.build(&self.layout, &params) {
            Ok(keyboard) => keyboard,
            Err(err) => {
                tracing::warn!(layout = %self.layout, mode = mode.0, error = %err, "mode switch failed");
                return;
            }
        };
        self.fit(&mut keyboard);
        if !mode.is_symbols() {
            keyboard.set_shift_state(self.interpreter.shift_state());
        }
        self.params = params;
        self.engine.replace_keyboard(keyboard);
    }

    fn fit(&self, keyboard: &mut Keyboard) {
        let current = self.engine.keyboard();
        if keyboard.min_width() > current.min_width() {
            keyboard.resize(current.min_width(), current.height());
        }
    }

    // -- surface ------------------------------------------------------------

    /// Rescale the keyboard to a new surface width.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.engine.resize(width, height);
    }

    pub fn set_config(&mut self, config: &KeyboardConfig) {
        self.engine.set_config(config);
        self.interpreter.set_config(config);
        self.params.proximity = config.proximity.clone();
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub fn engine(&self) -> &KeyboardEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut KeyboardEngine {
        &mut self.engine
    }

    #[must_use]
    pub fn interpreter(&self) -> &KeyInterpreter {
        &self.interpreter
    }

    #[must_use]
    pub fn library(&self) -> &LayoutLibrary {
        &self.library
    }

    #[must_use]
    pub fn layout_name(&self) -> &str {
        &self.layout
    }

    #[must_use]
    pub fn mode(&self) -> KeyboardMode {
        self.params.mode
    }

    #[must_use]
    pub fn shift_state(&self) -> ShiftState {
        self.interpreter.shift_state()
    }
}
