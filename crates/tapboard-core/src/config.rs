#![forbid(unsafe_code)]

//! Externally supplied keyboard configuration.
//!
//! Captures every tunable of the touch engine as a single [`KeyboardConfig`]
//! that can be loaded from TOML or JSON. The engine consumes it; persisting
//! it is the host's concern.
//!
//! # Loading
//!
//! ```toml
//! # tapboard.toml
//! [features]
//! proximity_correction = false
//!
//! [timing]
//! long_press_timeout_ms = 450
//! ```
//!
//! ```
//! use tapboard_core::config::KeyboardConfig;
//!
//! let config = KeyboardConfig::from_toml_str("[timing]\ndebounce_ms = 60\n").unwrap();
//! assert_eq!(config.timing.debounce_ms, 60);
//! assert!(config.features.auto_repeat);
//! ```
//!
//! # Defaults
//!
//! Every field has a default, so a partial document only overrides what it
//! names and `KeyboardConfig::default()` is a complete, valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Every tunable consumed by the touch engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Behavior switches.
    pub features: FeatureToggles,
    /// Timer and window lengths.
    pub timing: TimingConfig,
    /// Spatial index and proximity correction tuning.
    pub proximity: ProximityConfig,
    /// Fling detection thresholds.
    pub swipe: SwipeConfig,
}

/// Behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// Re-deliver repeatable keys while held.
    pub auto_repeat: bool,
    /// Accept near-miss touches within the proximity threshold.
    pub proximity_correction: bool,
    /// Track a preview key for the rendering surface.
    pub preview_popups: bool,
    /// Capitalize after sentence-ending punctuation.
    pub auto_capitalize: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            auto_repeat: true,
            proximity_correction: true,
            preview_popups: true,
            auto_capitalize: true,
        }
    }
}

/// Timer and window lengths, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Hold time before a long-press opens the popup keyboard.
    pub long_press_timeout_ms: u64,
    /// A key visited for less than this before release yields to the previous key.
    pub debounce_ms: u64,
    /// Re-taps of a multi-code key within this window cycle its codes.
    pub multi_tap_interval_ms: u64,
    /// Delay before the first auto-repeat.
    pub repeat_start_delay_ms: u64,
    /// Interval between auto-repeats.
    pub repeat_interval_ms: u64,
    /// Two shift presses within this window lock caps.
    pub shift_double_tap_ms: u64,
    /// How long the preview lingers after release.
    pub preview_linger_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            long_press_timeout_ms: 500,
            debounce_ms: 70,
            multi_tap_interval_ms: 800,
            repeat_start_delay_ms: 400,
            repeat_interval_ms: 50,
            shift_double_tap_ms: 300,
            preview_linger_ms: 70,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub fn long_press_timeout(&self) -> Duration {
        Duration::from_millis(self.long_press_timeout_ms)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn multi_tap_interval(&self) -> Duration {
        Duration::from_millis(self.multi_tap_interval_ms)
    }

    #[must_use]
    pub fn repeat_start_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_start_delay_ms)
    }

    #[must_use]
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    #[must_use]
    pub fn shift_double_tap(&self) -> Duration {
        Duration::from_millis(self.shift_double_tap_ms)
    }

    #[must_use]
    pub fn preview_linger(&self) -> Duration {
        Duration::from_millis(self.preview_linger_ms)
    }
}

/// Spatial index and proximity correction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Number of grid columns over the keyboard.
    pub grid_width: u16,
    /// Number of grid rows over the keyboard.
    pub grid_height: u16,
    /// Multiplier applied to the average key dimension before squaring.
    pub factor: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            grid_width: 10,
            grid_height: 5,
            factor: 1.4,
        }
    }
}

/// Fling detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Minimum velocity along the dominant axis, in pixels per second.
    pub min_velocity: f32,
    /// Minimum travel as a fraction of the keyboard width (horizontal) or
    /// height (vertical).
    pub travel_fraction: f32,
    /// Only samples this recent contribute to the velocity estimate.
    pub velocity_window_ms: u64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            min_velocity: 500.0,
            travel_fraction: 0.5,
            velocity_window_ms: 100,
        }
    }
}

impl SwipeConfig {
    #[must_use]
    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl KeyboardConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let t = &self.timing;

        for (name, value) in [
            ("timing.long_press_timeout_ms", t.long_press_timeout_ms),
            ("timing.multi_tap_interval_ms", t.multi_tap_interval_ms),
            ("timing.repeat_interval_ms", t.repeat_interval_ms),
            ("timing.shift_double_tap_ms", t.shift_double_tap_ms),
        ] {
            if value == 0 {
                errors.push(format!("{name} must be > 0"));
            }
        }

        if self.proximity.grid_width == 0 || self.proximity.grid_height == 0 {
            errors.push(format!(
                "proximity grid must be non-empty, got {}x{}",
                self.proximity.grid_width, self.proximity.grid_height
            ));
        }
        if !(self.proximity.factor > 0.0) {
            errors.push(format!(
                "proximity.factor must be > 0, got {}",
                self.proximity.factor
            ));
        }

        if !(self.swipe.min_velocity > 0.0) {
            errors.push(format!(
                "swipe.min_velocity must be > 0, got {}",
                self.swipe.min_velocity
            ));
        }
        if !(0.0..=1.0).contains(&self.swipe.travel_fraction) {
            errors.push(format!(
                "swipe.travel_fraction must be in [0, 1], got {}",
                self.swipe.travel_fraction
            ));
        }
        if self.swipe.velocity_window_ms == 0 {
            errors.push("swipe.velocity_window_ms must be > 0".into());
        }

        errors
    }

    /// Validate, turning any problems into a [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading a [`KeyboardConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = KeyboardConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.timing.long_press_timeout(), Duration::from_millis(500));
        assert_eq!(config.timing.debounce(), Duration::from_millis(70));
        assert_eq!(config.proximity.grid_width, 10);
        assert_eq!(config.proximity.grid_height, 5);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = KeyboardConfig::from_toml_str(
            r#"
            [features]
            proximity_correction = false

            [timing]
            multi_tap_interval_ms = 600
            "#,
        )
        .unwrap();
        assert!(!config.features.proximity_correction);
        assert!(config.features.auto_repeat);
        assert_eq!(config.timing.multi_tap_interval_ms, 600);
        assert_eq!(config.timing.debounce_ms, 70);
    }

    #[test]
    fn json_round_trip() {
        let mut config = KeyboardConfig::default();
        config.swipe.min_velocity = 900.0;
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(KeyboardConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn toml_file_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[proximity]\ngrid_width = 12").unwrap();
        let config = KeyboardConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.proximity.grid_width, 12);
        assert_eq!(config.proximity.grid_height, 5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = KeyboardConfig::from_toml_file("/nonexistent/tapboard.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = KeyboardConfig::from_toml_str("[timing\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn validation_catches_degenerate_values() {
        let mut config = KeyboardConfig::default();
        config.timing.repeat_interval_ms = 0;
        config.proximity.grid_height = 0;
        config.proximity.factor = f32::NAN;
        config.swipe.travel_fraction = 1.5;
        let errors = config.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");

        let err = KeyboardConfig::default().validated();
        assert!(err.is_ok());
        let mut bad = KeyboardConfig::default();
        bad.swipe.velocity_window_ms = 0;
        assert!(matches!(bad.validated(), Err(ConfigError::Validation(v)) if v.len() == 1));
    }
}
