#![forbid(unsafe_code)]

//! Rendering adapter: key visual state, invalidation, and painting.
//!
//! # Role in tapboard
//! Keys are immutable geometry; whether a key is pressed or focused lives in
//! a [`KeyStateTable`] indexed by key position. Interaction code marks keys
//! dirty in an [`Invalidation`], and a [`Renderer`] hands only the dirty keys
//! (or the whole keyboard) to a host-provided [`KeyPainter`].
//!
//! # How it fits in the system
//! `tapboard-input` owns a [`Renderer`] next to the installed keyboard and
//! updates it as touches move between keys. The host calls
//! [`Renderer::paint`] from its draw callback; this crate never prescribes
//! pixels.

pub mod accessibility;
pub mod invalidation;
pub mod label;
pub mod paint;
pub mod state;

pub use accessibility::{AccessibilityMap, AccessibleKey, DescriptionProvider};
pub use invalidation::Invalidation;
pub use label::DisplayLabel;
pub use paint::{KeyPainter, PaintReport, Renderer};
pub use state::{KeyStateTable, KeyVisualState};
