#![forbid(unsafe_code)]

//! The atomic touchable unit.

use smallvec::SmallVec;
use tapboard_core::codes::{self, KeyCode};
use tapboard_core::geometry::{EdgeFlags, Point, Rect};

/// Candidate codes of a key; index 0 is the primary code.
pub type KeyCodes = SmallVec<[KeyCode; 4]>;

/// One key: an immutable geometry snapshot plus its metadata.
///
/// Transient interaction flags (pressed, focused) are not stored here; they
/// live in a per-index state table owned by the renderer, so a key shared
/// between a keyboard and its cached popups never aliases visual state.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    /// Candidate codes, never empty.
    pub codes: KeyCodes,
    /// Caption, if the key shows text.
    pub label: Option<String>,
    /// Icon reference, resolved by the rendering surface.
    pub icon: Option<String>,
    /// Output text inserted instead of the primary code (e.g. `.com`).
    pub text: Option<String>,
    /// Characters offered by the long-press popup.
    pub popup_characters: Option<String>,
    /// Named layout used for (or as a template of) the long-press popup.
    pub popup_layout: Option<String>,
    /// Left edge in pixels.
    pub x: i32,
    /// Top edge in pixels.
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Horizontal gap preceding the key.
    pub gap: i32,
    /// Toggle-style key such as shift.
    pub sticky: bool,
    /// Modifier key such as alt.
    pub modifier: bool,
    /// Re-delivered while held.
    pub repeatable: bool,
    /// Keyboard-boundary flags, combined from the row and the layout.
    pub edge_flags: EdgeFlags,
    /// Index of the owning row.
    pub row: usize,
}

impl Key {
    /// Primary code.
    #[inline]
    #[must_use]
    pub fn code(&self) -> KeyCode {
        self.codes.first().copied().unwrap_or(codes::SPACE)
    }

    /// Bounding rectangle.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Whether the key offers a long-press popup.
    #[must_use]
    pub fn has_popup(&self) -> bool {
        self.popup_characters.is_some() || self.popup_layout.is_some()
    }

    /// Whether taps cycle through several codes.
    #[must_use]
    pub fn is_multi_tap(&self) -> bool {
        self.codes.len() > 1
    }

    /// Exact containment test.
    ///
    /// A side flagged in [`Key::edge_flags`] extends to infinity, so touches
    /// past the keyboard's physical margin still land on edge keys.
    #[must_use]
    pub fn is_inside(&self, x: i32, y: i32) -> bool {
        let left = self.edge_flags.contains(EdgeFlags::LEFT);
        let right = self.edge_flags.contains(EdgeFlags::RIGHT);
        let top = self.edge_flags.contains(EdgeFlags::TOP);
        let bottom = self.edge_flags.contains(EdgeFlags::BOTTOM);
        let (kx, ky, kr, kb) = (self.x, self.y, self.right(), self.y.saturating_add(self.height));

        (x >= kx || (left && x <= kr))
            && (x < kr || (right && x >= kx))
            && (y >= ky || (top && y <= kb))
            && (y < kb || (bottom && y >= ky))
    }

    /// Squared distance from the key's center to a point.
    #[inline]
    #[must_use]
    pub fn squared_distance_from(&self, x: i32, y: i32) -> i64 {
        self.bounds().center().squared_distance(Point::new(x, y))
    }
}
