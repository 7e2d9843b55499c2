#![forbid(unsafe_code)]

//! Multi-tap cycling for keys with several codes.
//!
//! A key with codes `[a, á, à]` tapped three times inside the interval
//! delivers `a`, then delete + `á`, then delete + `à`; a fourth tap wraps to
//! delete + `a`. The delete replaces the character committed by the previous
//! tap. A tap on another key, or after the interval, starts over.

use std::time::{Duration, Instant};

use tapboard_core::codes::KeyCode;
use tapboard_layout::Key;

/// Cross-gesture multi-tap bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiTap {
    last_sent: Option<usize>,
    last_tap: Option<Instant>,
    /// Index into the key's codes; `None` until the first delivery of a cycle.
    tap_count: Option<usize>,
    active: bool,
}

impl MultiTap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the current cycle.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the pending delivery is part of a cycle.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn within(&self, now: Instant, interval: Duration) -> bool {
        self.last_tap
            .is_some_and(|last| now.saturating_duration_since(last) < interval)
    }

    fn expired(&self, now: Instant, interval: Duration) -> bool {
        self.last_tap
            .is_none_or(|last| now.saturating_duration_since(last) > interval)
    }

    /// Update the cycle for a touch-down on `index`.
    pub fn on_down(
        &mut self,
        index: Option<usize>,
        key: Option<&Key>,
        now: Instant,
        interval: Duration,
    ) {
        let (Some(index), Some(key)) = (index, key) else {
            return;
        };
        if key.is_multi_tap() {
            self.active = true;
            self.tap_count = if self.within(now, interval) && self.last_sent == Some(index) {
                Some(self.tap_count.map_or(0, |n| (n + 1) % key.codes.len()))
            } else {
                None
            };
            return;
        }
        if self.expired(now, interval) || self.last_sent != Some(index) {
            self.reset();
        }
    }

    /// Code to deliver for `key`, and whether the previous character must
    /// be deleted first.
    pub fn resolve_code(&mut self, key: &Key) -> (KeyCode, bool) {
        if !self.active {
            return (key.code(), false);
        }
        let (index, delete) = match self.tap_count {
            Some(n) => (n, true),
            None => (0, false),
        };
        self.tap_count = Some(index);
        let code = key.codes.get(index).copied().unwrap_or_else(|| key.code());
        (code, delete)
    }

    /// Record a delivery of `index`.
    pub fn on_sent(&mut self, index: usize, now: Instant) {
        self.last_sent = Some(index);
        self.last_tap = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapboard_core::geometry::EdgeFlags;

    const INTERVAL: Duration = Duration::from_millis(800);

    fn key(codes: &[i32]) -> Key {
        Key {
            codes: codes.iter().copied().collect(),
            label: None,
            icon: None,
            text: None,
            popup_characters: None,
            popup_layout: None,
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            gap: 0,
            sticky: false,
            modifier: false,
            repeatable: false,
            edge_flags: EdgeFlags::empty(),
            row: 0,
        }
    }

    fn tap(mt: &mut MultiTap, index: usize, key: &Key, now: Instant) -> (i32, bool) {
        mt.on_down(Some(index), Some(key), now, INTERVAL);
        let out = mt.resolve_code(key);
        mt.on_sent(index, now);
        out
    }

    #[test]
    fn cycles_and_wraps_with_deletes() {
        let t = Instant::now();
        let k = key(&[97, 225, 224]);
        let mut mt = MultiTap::new();
        let step = Duration::from_millis(200);
        assert_eq!(tap(&mut mt, 3, &k, t), (97, false));
        assert_eq!(tap(&mut mt, 3, &k, t + step), (225, true));
        assert_eq!(tap(&mut mt, 3, &k, t + step * 2), (224, true));
        assert_eq!(tap(&mut mt, 3, &k, t + step * 3), (97, true));
    }

    #[test]
    fn interval_expiry_restarts() {
        let t = Instant::now();
        let k = key(&[97, 225]);
        let mut mt = MultiTap::new();
        tap(&mut mt, 0, &k, t);
        assert_eq!(tap(&mut mt, 0, &k, t + INTERVAL), (97, false));
    }

    #[test]
    fn other_key_restarts() {
        let t = Instant::now();
        let k = key(&[97, 225]);
        let plain = key(&[98]);
        let mut mt = MultiTap::new();
        tap(&mut mt, 0, &k, t);
        assert_eq!(tap(&mut mt, 1, &plain, t), (98, false));
        assert!(!mt.is_active());
        assert_eq!(tap(&mut mt, 0, &k, t), (97, false));
    }

    #[test]
    fn single_code_keys_never_cycle() {
        let t = Instant::now();
        let k = key(&[98]);
        let mut mt = MultiTap::new();
        assert_eq!(tap(&mut mt, 0, &k, t), (98, false));
        assert_eq!(tap(&mut mt, 0, &k, t), (98, false));
    }
}
