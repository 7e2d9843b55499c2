#![forbid(unsafe_code)]

//! Touch coordinate → key resolution.
//!
//! Candidates come from the keyboard's [`SpatialIndex`](crate::SpatialIndex)
//! cell for the touch point and are scanned in index order:
//!
//! - the first candidate that contains the point is the primary key;
//! - with proximity correction on, printable candidates whose center lies
//!   within the proximity threshold are accepted too, and the closest one is
//!   the fallback primary when nothing contains the point;
//! - accepted printable candidates feed the [`Alternatives`] buffer with all
//!   of their codes.
//!
//! Ties on distance go to the key seen first, so results depend only on the
//! layout order.

use tapboard_core::action::Alternatives;
use tapboard_core::codes;

use crate::keyboard::Keyboard;

/// Result of resolving one touch point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Key index under the touch, `None` for padding or out-of-bounds.
    pub primary: Option<usize>,
    /// Nearby codes by ascending distance (empty unless requested).
    pub alternatives: Alternatives,
}

impl Resolution {
    /// Whether no key was hit.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        self.primary.is_none()
    }
}

/// Stateless resolver, parameterized by the proximity toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResolver {
    proximity_correction: bool,
}

impl Default for HitResolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HitResolver {
    #[must_use]
    pub const fn new(proximity_correction: bool) -> Self {
        Self {
            proximity_correction,
        }
    }

    #[must_use]
    pub const fn proximity_correction(&self) -> bool {
        self.proximity_correction
    }

    pub fn set_proximity_correction(&mut self, enabled: bool) {
        self.proximity_correction = enabled;
    }

    /// Resolve `(x, y)` against `keyboard`.
    #[must_use]
    pub fn resolve(
        &self,
        keyboard: &Keyboard,
        x: i32,
        y: i32,
        want_alternatives: bool,
    ) -> Resolution {
        let threshold = keyboard.proximity_threshold();
        let mut resolution = Resolution::default();
        let mut closest: Option<(usize, i64)> = None;

        for &index in keyboard.nearest_keys(x, y) {
            let Some(key) = keyboard.key(index) else {
                continue;
            };
            let inside = key.is_inside(x, y);
            if inside && resolution.primary.is_none() {
                resolution.primary = Some(index);
            }

            let distance = if self.proximity_correction {
                key.squared_distance_from(x, y)
            } else {
                0
            };
            let near = self.proximity_correction && distance < threshold;
            if !(near || inside) || !codes::is_correctable(key.code()) {
                continue;
            }
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((index, distance));
            }
            if want_alternatives {
                resolution.alternatives.insert_key(&key.codes, distance);
            }
        }

        if resolution.primary.is_none() {
            resolution.primary = closest.map(|(index, _)| index);
        }
        tracing::trace!(
            x,
            y,
            primary = ?resolution.primary,
            alternatives = resolution.alternatives.len(),
            "touch resolved"
        );
        resolution
    }

    /// Primary key only.
    #[must_use]
    pub fn key_at(&self, keyboard: &Keyboard, x: i32, y: i32) -> Option<usize> {
        self.resolve(keyboard, x, y, false).primary
    }
}
