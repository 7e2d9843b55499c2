#![forbid(unsafe_code)]

//! Dimension attributes: absolute pixels or fractions of a reference.

use toml::Value;

/// Largest magnitude a resolved dimension may take, in pixels.
pub const MAX_DIMENSION: i32 = 1 << 20;

/// A declared size or gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    /// Absolute pixels.
    Pixels(i32),
    /// Fraction of the enclosing reference dimension (`0.5` = 50%).
    Fraction(f64),
}

impl Dimension {
    /// Parse a dimension value.
    ///
    /// Accepts integers and floats (pixels) and strings of the forms
    /// `"12"`, `"12px"`, `"10%"` and `"10%p"`. Anything else yields `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => i32::try_from(*n).ok().map(Self::Pixels),
            Value::Float(f) if f.is_finite() => Some(Self::Pixels(f.round() as i32)),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Parse the string form of a dimension.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if let Some(percent) = s.strip_suffix("%p").or_else(|| s.strip_suffix('%')) {
            let value: f64 = percent.trim().parse().ok()?;
            return value.is_finite().then_some(Self::Fraction(value / 100.0));
        }
        let number = s.strip_suffix("px").unwrap_or(s).trim();
        if let Ok(px) = number.parse::<i32>() {
            return Some(Self::Pixels(px));
        }
        let value: f64 = number.parse().ok()?;
        value.is_finite().then_some(Self::Pixels(value.round() as i32))
    }

    /// Resolve against a reference dimension.
    ///
    /// Fractions round to the nearest pixel; truncating would shrink every
    /// fractional key by up to a pixel. Results are clamped to
    /// `±MAX_DIMENSION`.
    #[must_use]
    pub fn resolve(self, reference: i32) -> i32 {
        let px = match self {
            Self::Pixels(px) => px,
            Self::Fraction(fraction) => (fraction * f64::from(reference)).round() as i32,
        };
        px.clamp(-MAX_DIMENSION, MAX_DIMENSION)
    }
}
