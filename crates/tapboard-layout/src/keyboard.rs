#![forbid(unsafe_code)]

//! The geometric keyboard model.
//!
//! A [`Keyboard`] is built from a validated [`LayoutSource`] for one
//! [`KeyboardMode`] and display size. Building resolves every dimension to
//! absolute pixels, lays keys out left to right within rows and rows top to
//! bottom, combines edge flags, and builds the [`SpatialIndex`] used for hit
//! resolution.
//!
//! # Invariants
//!
//! 1. Every key has at least one code and `x + width <= min_width`.
//! 2. Rows whose non-zero mode differs from the requested mode contribute no
//!    keys and no vertical space.
//! 3. The spatial index always matches the current geometry; [`Keyboard::resize`]
//!    rebuilds it.

use std::ops::Range;

use smallvec::smallvec;
use tapboard_core::codes::{self, KeyCode};
use tapboard_core::config::ProximityConfig;
use tapboard_core::geometry::{EdgeFlags, Rect};

use crate::dimension::MAX_DIMENSION;
use crate::error::Result;
use crate::key::{Key, KeyCodes};
use crate::proximity::{SpatialIndex, proximity_threshold};
use crate::source::{Attrs, LayoutSource};

// ---------------------------------------------------------------------------
// Modes and shift
// ---------------------------------------------------------------------------

/// Layout variant selector shared by rows and keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyboardMode(pub u32);

impl KeyboardMode {
    /// Rows tagged with this mode appear in every variant.
    pub const ANY: Self = Self(0);
    pub const LETTERS: Self = Self(1);
    pub const SYMBOLS: Self = Self(2);
    pub const SYMBOLS_SHIFTED: Self = Self(3);

    /// Whether a row tagged `row_mode` is instantiated in this mode.
    #[must_use]
    pub const fn includes(self, row_mode: KeyboardMode) -> bool {
        row_mode.0 == 0 || row_mode.0 == self.0
    }

    /// Whether this is one of the symbol variants.
    #[must_use]
    pub const fn is_symbols(self) -> bool {
        self.0 == Self::SYMBOLS.0 || self.0 == Self::SYMBOLS_SHIFTED.0
    }
}

/// Capitalization state of a keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShiftState {
    #[default]
    Off,
    /// Reverts to `Off` after one committed character.
    OnOneChar,
    /// Caps lock; persists until toggled.
    OnPermanent,
}

impl ShiftState {
    /// Whether letters are currently upper-cased.
    #[must_use]
    pub const fn is_shifted(self) -> bool {
        !matches!(self, Self::Off)
    }
}

// ---------------------------------------------------------------------------
// Parameters and defaults
// ---------------------------------------------------------------------------

/// Inputs to a layout build that do not come from the document.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Reference width for fractional dimensions.
    pub display_width: i32,
    /// Reference height for fractional dimensions.
    pub display_height: i32,
    /// Variant to instantiate.
    pub mode: KeyboardMode,
    /// Spatial index tuning.
    pub proximity: ProximityConfig,
}

impl LayoutParams {
    /// Letters mode with default proximity tuning.
    #[must_use]
    pub fn new(display_width: i32, display_height: i32) -> Self {
        Self {
            display_width,
            display_height,
            mode: KeyboardMode::LETTERS,
            proximity: ProximityConfig::default(),
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: KeyboardMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn proximity(mut self, proximity: ProximityConfig) -> Self {
        self.proximity = proximity;
        self
    }
}

/// Furthest a key edge may be placed from the keyboard origin, in pixels.
const MAX_EXTENT: i32 = 1 << 28;

/// Move a layout cursor by `by`, staying within `0..=MAX_EXTENT`.
fn advance(pos: i32, by: i32) -> i32 {
    pos.saturating_add(by).clamp(0, MAX_EXTENT)
}

/// Key size and spacing defaults, inherited keyboard → row → key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDefaults {
    pub width: i32,
    pub height: i32,
    pub horizontal_gap: i32,
    pub vertical_gap: i32,
}

impl KeyDefaults {
    fn read(attrs: &Attrs<'_>, params: &LayoutParams, inherited: KeyDefaults) -> Self {
        let width = attrs.dimension("key_width", params.display_width, inherited.width);
        Self {
            width,
            height: attrs.dimension("key_height", params.display_height, inherited.height),
            horizontal_gap: attrs.dimension(
                "horizontal_gap",
                params.display_width,
                inherited.horizontal_gap,
            ),
            vertical_gap: attrs.dimension(
                "vertical_gap",
                params.display_height,
                inherited.vertical_gap,
            ),
        }
    }
}

/// A horizontal band of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Indices of the row's keys in [`Keyboard::keys`].
    pub keys: Range<usize>,
    /// Defaults the row's keys inherit.
    pub defaults: KeyDefaults,
    /// Declared flags combined with the keyboard boundary.
    pub edge_flags: EdgeFlags,
    pub mode: KeyboardMode,
    /// Top of the row in pixels.
    pub y: i32,
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

/// A laid-out keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyboard {
    keys: Vec<Key>,
    rows: Vec<Row>,
    defaults: KeyDefaults,
    display_width: i32,
    display_height: i32,
    min_width: i32,
    height: i32,
    mode: KeyboardMode,
    shift: ShiftState,
    shift_key: Option<usize>,
    modifier_keys: Vec<usize>,
    proximity: ProximityConfig,
    index: SpatialIndex,
}

impl Keyboard {
    /// Parse a layout document and build it in one step.
    pub fn parse(document: &str, params: &LayoutParams) -> Result<Self> {
        let source = LayoutSource::from_toml_str(document)?;
        Ok(Self::from_source(&source, params))
    }

    /// Build a keyboard from a validated layout document.
    pub fn from_source(source: &LayoutSource, params: &LayoutParams) -> Self {
        let _span = tracing::debug_span!(
            "layout.build",
            mode = params.mode.0,
            display_width = params.display_width,
            display_height = params.display_height
        )
        .entered();

        let fallback_width = (params.display_width / 10).clamp(0, MAX_DIMENSION);
        let root = KeyDefaults {
            width: fallback_width,
            height: fallback_width,
            horizontal_gap: 0,
            vertical_gap: 0,
        };
        let kb_attrs = Attrs::new(&source.keyboard, "keyboard");
        let mut defaults = KeyDefaults::read(&kb_attrs, params, root);
        if !source.keyboard.contains_key("key_height") {
            defaults.height = defaults.width;
        }

        let mut keys = Vec::new();
        let mut rows = Vec::new();
        let mut y = 0;
        let mut min_width = 0;

        for (row_index, row_source) in source.rows.iter().enumerate() {
            let attrs = Attrs::new(&row_source.attrs, "row");
            let mode = KeyboardMode(u32::try_from(attrs.int("mode", 0)).unwrap_or(0));
            if !params.mode.includes(mode) {
                tracing::trace!(row = row_index, row_mode = mode.0, "skipping row");
                continue;
            }
            let row_defaults = KeyDefaults::read(&attrs, params, defaults);
            let row_edges = attrs.edges();
            let first_key = keys.len();
            let mut x = 0;

            for key_table in &row_source.keys {
                let key_attrs = Attrs::new(key_table, "key");
                let width =
                    key_attrs.dimension("key_width", params.display_width, row_defaults.width);
                let height =
                    key_attrs.dimension("key_height", params.display_height, row_defaults.height);
                let gap = key_attrs.dimension(
                    "horizontal_gap",
                    params.display_width,
                    row_defaults.horizontal_gap,
                );
                let label = key_attrs.string("label");
                let text = key_attrs.string("text");
                let key_codes = derive_codes(key_attrs.codes(), label.as_deref(), text.as_deref());

                if key_codes.is_empty() || width <= 0 || height <= 0 {
                    tracing::warn!(
                        row = row_index,
                        width,
                        height,
                        "key without codes or area, treating as spacer"
                    );
                    x = advance(x, gap + width.max(0));
                    min_width = min_width.max(x);
                    continue;
                }

                let key_x = advance(x, gap);
                keys.push(Key {
                    codes: key_codes,
                    label,
                    icon: key_attrs.string("icon"),
                    text,
                    popup_characters: key_attrs.string("popup_characters"),
                    popup_layout: key_attrs.string("popup_layout"),
                    x: key_x,
                    y,
                    width,
                    height,
                    gap,
                    sticky: key_attrs.flag("sticky", false),
                    modifier: key_attrs.flag("modifier", false),
                    repeatable: key_attrs.flag("repeatable", false),
                    edge_flags: key_attrs.edges() | row_edges,
                    row: rows.len(),
                });
                x = advance(key_x, width);
                min_width = min_width.max(key_x + width);
            }

            rows.push(Row {
                keys: first_key..keys.len(),
                defaults: row_defaults,
                edge_flags: row_edges,
                mode,
                y,
            });
            y = advance(y, row_defaults.vertical_gap + row_defaults.height);
        }

        apply_boundary_edges(&mut keys, &mut rows);

        let height = (y - defaults.vertical_gap).max(0);
        let mut keyboard = Self {
            keys,
            rows,
            defaults,
            display_width: params.display_width,
            display_height: params.display_height,
            min_width,
            height,
            mode: params.mode,
            shift: ShiftState::Off,
            shift_key: None,
            modifier_keys: Vec::new(),
            proximity: params.proximity.clone(),
            index: SpatialIndex::default(),
        };
        keyboard.index_special_keys();
        keyboard.rebuild_index();

        tracing::debug!(
            rows = keyboard.rows.len(),
            keys = keyboard.keys.len(),
            min_width = keyboard.min_width,
            height = keyboard.height,
            "layout built"
        );
        keyboard
    }

    /// Build a popup keyboard holding one key per character.
    ///
    /// Keys are laid out left to right using `defaults`, wrapping when
    /// `columns` keys are on a line or the next key would cross the display
    /// width. The single row is flagged as both top and bottom edge.
    pub fn from_popup_characters(
        characters: &str,
        defaults: KeyDefaults,
        columns: Option<usize>,
        params: &LayoutParams,
    ) -> Self {
        let max_columns = columns.unwrap_or(usize::MAX).max(1);
        let edges = EdgeFlags::TOP | EdgeFlags::BOTTOM;
        let mut keys = Vec::new();
        let (mut x, mut y, mut column, mut min_width) = (0, 0, 0, 0);

        for ch in characters.chars().filter(|c| !c.is_whitespace()) {
            if column >= max_columns
                || (column > 0 && x + defaults.width > params.display_width)
            {
                x = 0;
                y = advance(y, defaults.vertical_gap + defaults.height);
                column = 0;
            }
            keys.push(Key {
                codes: smallvec![ch as KeyCode],
                label: Some(ch.to_string()),
                icon: None,
                text: None,
                popup_characters: None,
                popup_layout: None,
                x,
                y,
                width: defaults.width,
                height: defaults.height,
                gap: defaults.horizontal_gap,
                sticky: false,
                modifier: false,
                repeatable: false,
                edge_flags: edges,
                row: 0,
            });
            column += 1;
            min_width = min_width.max(x + defaults.width);
            x = advance(x, defaults.width + defaults.horizontal_gap);
            min_width = min_width.max(x);
        }

        let height = if keys.is_empty() { 0 } else { y + defaults.height };
        let rows = vec![Row {
            keys: 0..keys.len(),
            defaults,
            edge_flags: edges,
            mode: KeyboardMode::ANY,
            y: 0,
        }];
        let mut keyboard = Self {
            keys,
            rows,
            defaults,
            display_width: params.display_width,
            display_height: params.display_height,
            min_width,
            height,
            mode: params.mode,
            shift: ShiftState::Off,
            shift_key: None,
            modifier_keys: Vec::new(),
            proximity: params.proximity.clone(),
            index: SpatialIndex::default(),
        };
        keyboard.rebuild_index();
        keyboard
    }

    fn index_special_keys(&mut self) {
        self.shift_key = self.keys.iter().position(|k| k.code() == codes::SHIFT);
        self.modifier_keys = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k.modifier || k.code() == codes::ALT)
            .map(|(i, _)| i)
            .collect();
    }

    fn rebuild_index(&mut self) {
        let threshold = proximity_threshold(&self.keys, self.proximity.factor);
        self.index = SpatialIndex::build(
            &self.keys,
            self.min_width,
            self.height,
            &self.proximity,
            threshold,
        );
    }

    /// Fit rows into a narrower width.
    ///
    /// Rows whose key widths plus inter-key gaps exceed `new_width` have every
    /// key width scaled by `(new_width - gaps) / widths` and are re-laid out
    /// from `x = 0`. Other rows keep their geometry. Vertical placement is
    /// not adjusted.
    ///
    /// The keyboard width becomes `new_width`, or the widest row's right edge
    /// when keys cannot shrink below one pixel each.
    pub fn resize(&mut self, new_width: i32, new_height: i32) {
        for row in &self.rows {
            let keys = &mut self.keys[row.keys.clone()];
            let total_gap: i64 = keys.iter().skip(1).map(|k| i64::from(k.gap)).sum();
            let total_width: i64 = keys.iter().map(|k| i64::from(k.width)).sum();
            if total_width <= 0 || total_gap + total_width <= i64::from(new_width) {
                continue;
            }
            let scale = (i64::from(new_width) - total_gap) as f32 / total_width as f32;
            let mut x = 0;
            for key in keys.iter_mut() {
                key.width = ((key.width as f32 * scale) as i32).max(1);
                key.x = x;
                x = advance(x, key.width + key.gap);
            }
        }
        let reached = self.keys.iter().map(Key::right).max().unwrap_or(0);
        self.min_width = new_width.max(reached);
        self.display_width = new_width;
        self.display_height = new_height;
        self.rebuild_index();
        tracing::debug!(new_width, new_height, "keyboard resized");
    }

    // -- accessors ----------------------------------------------------------

    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[must_use]
    pub fn key(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Keys of one row.
    #[must_use]
    pub fn row_keys(&self, row: usize) -> &[Key] {
        self.rows
            .get(row)
            .map_or(&[][..], |r| &self.keys[r.keys.clone()])
    }

    /// Widest extent reached by any row.
    #[must_use]
    pub fn min_width(&self) -> i32 {
        self.min_width
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Bounding box of the keyboard.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.min_width, self.height)
    }

    #[must_use]
    pub fn display_size(&self) -> (i32, i32) {
        (self.display_width, self.display_height)
    }

    #[must_use]
    pub fn defaults(&self) -> KeyDefaults {
        self.defaults
    }

    #[must_use]
    pub fn mode(&self) -> KeyboardMode {
        self.mode
    }

    #[must_use]
    pub fn shift_state(&self) -> ShiftState {
        self.shift
    }

    #[must_use]
    pub fn is_shifted(&self) -> bool {
        self.shift.is_shifted()
    }

    /// Set the shift state, returning whether it changed.
    pub fn set_shift_state(&mut self, state: ShiftState) -> bool {
        let changed = self.shift != state;
        self.shift = state;
        changed
    }

    /// Index of the first shift key.
    #[must_use]
    pub fn shift_key(&self) -> Option<usize> {
        self.shift_key
    }

    /// Indices of modifier keys.
    #[must_use]
    pub fn modifier_keys(&self) -> &[usize] {
        &self.modifier_keys
    }

    #[must_use]
    pub fn proximity_config(&self) -> &ProximityConfig {
        &self.proximity
    }

    #[must_use]
    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Squared proximity threshold for near-miss correction.
    #[must_use]
    pub fn proximity_threshold(&self) -> i64 {
        self.index.threshold()
    }

    /// Candidate keys near `(x, y)`.
    #[must_use]
    pub fn nearest_keys(&self, x: i32, y: i32) -> &[usize] {
        self.index.query(x, y)
    }
}

/// Codes for a key: explicit codes, else the reserved action for a glyph
/// label, else the label's first character, else the text's first character.
fn derive_codes(explicit: Vec<KeyCode>, label: Option<&str>, text: Option<&str>) -> KeyCodes {
    if !explicit.is_empty() {
        return explicit.into_iter().collect();
    }
    if let Some(label) = label {
        if let Some(code) = codes::reserved_glyph(label) {
            return smallvec![code];
        }
        if let Some(ch) = label.chars().next() {
            return smallvec![ch as KeyCode];
        }
    }
    text.and_then(|t| t.chars().next())
        .map(|ch| smallvec![ch as KeyCode])
        .unwrap_or_default()
}

/// First/last keys of each row gain LEFT/RIGHT; keys of the first/last rows
/// gain TOP/BOTTOM.
fn apply_boundary_edges(keys: &mut [Key], rows: &mut [Row]) {
    let row_count = rows.len();
    for (index, row) in rows.iter_mut().enumerate() {
        if index == 0 {
            row.edge_flags |= EdgeFlags::TOP;
        }
        if index + 1 == row_count {
            row.edge_flags |= EdgeFlags::BOTTOM;
        }
        let range = row.keys.clone();
        let Some(last) = range.end.checked_sub(1) else {
            continue;
        };
        for key_index in range.clone() {
            let key = &mut keys[key_index];
            key.edge_flags |= row.edge_flags;
            if key_index == range.start {
                key.edge_flags |= EdgeFlags::LEFT;
            }
            if key_index == last {
                key.edge_flags |= EdgeFlags::RIGHT;
            }
        }
    }
}
