#![forbid(unsafe_code)]

//! Fling detection across the whole keyboard.
//!
//! A swipe fires when, along the dominant axis, the recent velocity exceeds
//! [`SwipeConfig::min_velocity`] and the total travel from the touch-down
//! point exceeds [`SwipeConfig::travel_fraction`] of the keyboard's extent in
//! that direction, with both pointing the same way.

use std::collections::VecDeque;
use std::time::Instant;

use tapboard_core::action::SwipeDirection;
use tapboard_core::config::SwipeConfig;

/// Samples kept per gesture; older ones no longer affect the velocity.
const MAX_SAMPLES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f32,
    y: f32,
    time: Instant,
}

/// Velocity tracker for one gesture.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start: Option<(i32, i32)>,
    samples: VecDeque<Sample>,
}

impl SwipeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new gesture at the touch-down point.
    pub fn start(&mut self, x: i32, y: i32, time: Instant) {
        self.samples.clear();
        self.start = Some((x, y));
        self.add(x, y, time);
    }

    pub fn add(&mut self, x: i32, y: i32, time: Instant) {
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            x: x as f32,
            y: y as f32,
            time,
        });
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.samples.clear();
    }

    /// Velocity in px/s over the samples inside the configured window,
    /// ending at the newest sample. `None` when the window spans no time.
    #[must_use]
    pub fn velocity(&self, config: &SwipeConfig) -> Option<(f32, f32)> {
        let last = self.samples.back()?;
        let window = config.velocity_window();
        let first = self
            .samples
            .iter()
            .find(|s| last.time.saturating_duration_since(s.time) <= window)?;
        let dt = last.time.saturating_duration_since(first.time).as_secs_f32();
        if dt <= 0.0 {
            return None;
        }
        Some(((last.x - first.x) / dt, (last.y - first.y) / dt))
    }

    /// Evaluate the gesture so far against a `width × height` keyboard.
    #[must_use]
    pub fn detect(&self, config: &SwipeConfig, width: i32, height: i32) -> Option<SwipeDirection> {
        let (sx, sy) = self.start?;
        let last = self.samples.back()?;
        let (vx, vy) = self.velocity(config)?;
        let dx = last.x - sx as f32;
        let dy = last.y - sy as f32;

        let direction = if vx.abs() > vy.abs() {
            let travel = width as f32 * config.travel_fraction;
            if vx > config.min_velocity && dx > travel {
                SwipeDirection::Right
            } else if vx < -config.min_velocity && dx < -travel {
                SwipeDirection::Left
            } else {
                return None;
            }
        } else {
            let travel = height as f32 * config.travel_fraction;
            if vy > config.min_velocity && dy > travel {
                SwipeDirection::Down
            } else if vy < -config.min_velocity && dy < -travel {
                SwipeDirection::Up
            } else {
                return None;
            }
        };
        tracing::debug!(?direction, vx, vy, dx, dy, "swipe detected");
        Some(direction)
    }
}
