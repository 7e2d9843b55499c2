#![forbid(unsafe_code)]

//! Index ↔ region lookup for accessibility collaborators.
//!
//! The map only exposes geometry. Spoken descriptions come from a
//! host-supplied [`DescriptionProvider`].

use tapboard_core::geometry::Rect;
use tapboard_layout::{Key, Keyboard};

/// Supplies the content description for a key.
pub trait DescriptionProvider {
    /// Description of `key` at `index`, or `None` to leave it undescribed.
    fn describe(&self, index: usize, key: &Key, shifted: bool) -> Option<String>;
}

impl<F> DescriptionProvider for F
where
    F: Fn(usize, &Key, bool) -> Option<String>,
{
    fn describe(&self, index: usize, key: &Key, shifted: bool) -> Option<String> {
        self(index, key, shifted)
    }
}

/// One accessibility node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibleKey {
    pub index: usize,
    pub bounds: Rect,
    pub description: Option<String>,
}

/// Read-only accessibility view over a keyboard.
#[derive(Debug, Clone, Copy)]
pub struct AccessibilityMap<'a> {
    keyboard: &'a Keyboard,
}

impl<'a> AccessibilityMap<'a> {
    #[must_use]
    pub fn new(keyboard: &'a Keyboard) -> Self {
        Self { keyboard }
    }

    /// Key whose bounds contain `(x, y)`.
    ///
    /// Exact containment only; edge extension and proximity correction do
    /// not apply to exploration by touch.
    #[must_use]
    pub fn key_at(&self, x: i32, y: i32) -> Option<usize> {
        self.keyboard
            .keys()
            .iter()
            .position(|key| key.bounds().contains(x, y))
    }

    #[must_use]
    pub fn bounds(&self, index: usize) -> Option<Rect> {
        self.keyboard.key(index).map(Key::bounds)
    }

    /// Every key with its bounds and description.
    pub fn nodes<D: DescriptionProvider + ?Sized>(&self, provider: &D) -> Vec<AccessibleKey> {
        let shifted = self.keyboard.is_shifted();
        self.keyboard
            .keys()
            .iter()
            .enumerate()
            .map(|(index, key)| AccessibleKey {
                index,
                bounds: key.bounds(),
                description: provider.describe(index, key, shifted),
            })
            .collect()
    }
}
