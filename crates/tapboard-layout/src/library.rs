#![forbid(unsafe_code)]

//! Named layout sources.
//!
//! [`LayoutLibrary`] is the explicit cache of parsed layout documents. The
//! host loads each document once and passes the library by reference to
//! whatever builds keyboards; keyboards themselves are built on demand for a
//! `(name, mode, display size)` triple.

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{LayoutParseError, Result};
use crate::key::Key;
use crate::keyboard::{Keyboard, LayoutParams};
use crate::source::LayoutSource;

/// Validated layout documents by name.
#[derive(Debug, Clone, Default)]
pub struct LayoutLibrary {
    layouts: FxHashMap<String, LayoutSource>,
}

impl LayoutLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a validated document.
    pub fn insert(&mut self, name: impl Into<String>, source: LayoutSource) {
        let name = name.into();
        tracing::debug!(layout = %name, rows = source.row_count(), "layout registered");
        self.layouts.insert(name, source);
    }

    /// Parse and add a TOML document. On error the library is unchanged.
    pub fn insert_toml(&mut self, name: impl Into<String>, document: &str) -> Result<()> {
        let source = LayoutSource::from_toml_str(document)?;
        self.insert(name, source);
        Ok(())
    }

    /// Load and add a TOML document from disk.
    pub fn load_file(&mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Result<()> {
        let source = LayoutSource::from_toml_file(path)?;
        self.insert(name, source);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LayoutSource> {
        self.layouts.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Registered layout names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    /// Build the named layout.
    pub fn build(&self, name: &str, params: &LayoutParams) -> Result<Keyboard> {
        let source = self
            .get(name)
            .ok_or_else(|| LayoutParseError::MissingLayout(name.to_owned()))?;
        Ok(Keyboard::from_source(source, params))
    }

    /// Build the long-press keyboard for `key` of `parent`.
    ///
    /// Popup characters win over a popup layout; when both are present the
    /// layout only supplies key sizing. Returns `None` when the key has no
    /// popup data or its layout reference is unknown.
    #[must_use]
    pub fn popup_keyboard(&self, key: &Key, parent: &Keyboard) -> Option<Keyboard> {
        let (display_width, display_height) = parent.display_size();
        let params = LayoutParams::new(display_width, display_height)
            .mode(parent.mode())
            .proximity(parent.proximity_config().clone());

        let template = match key.popup_layout.as_deref() {
            Some(name) => match self.build(name, &params) {
                Ok(keyboard) => Some(keyboard),
                Err(err) => {
                    tracing::warn!(layout = name, error = %err, "popup layout unavailable");
                    None
                }
            },
            None => None,
        };

        let popup = match (key.popup_characters.as_deref(), template) {
            (Some(characters), template) => {
                let defaults = template
                    .as_ref()
                    .map_or_else(|| parent.defaults(), Keyboard::defaults);
                Keyboard::from_popup_characters(characters, defaults, None, &params)
            }
            (None, Some(template)) => template,
            (None, None) => return None,
        };
        (!popup.keys().is_empty()).then_some(popup)
    }
}
