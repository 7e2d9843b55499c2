#![forbid(unsafe_code)]

//! Keyboard layouts: parsing, geometry, proximity grid, and hit resolution.
//!
//! A layout document ([`LayoutSource`]) is validated once and can then be
//! built into a [`Keyboard`] for any [`KeyboardMode`] and display size. The
//! keyboard owns its [`SpatialIndex`], and [`HitResolver`] maps touch
//! coordinates to keys through it.

pub mod dimension;
pub mod error;
pub mod hit;
pub mod key;
pub mod keyboard;
pub mod library;
pub mod proximity;
pub mod source;

pub use error::{LayoutParseError, Result};
pub use hit::{HitResolver, Resolution};
pub use key::{Key, KeyCodes};
pub use keyboard::{KeyDefaults, Keyboard, KeyboardMode, LayoutParams, Row, ShiftState};
pub use library::LayoutLibrary;
pub use proximity::{SpatialIndex, proximity_threshold};
pub use source::LayoutSource;
