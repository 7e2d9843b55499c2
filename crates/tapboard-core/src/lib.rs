#![forbid(unsafe_code)]

//! Core: geometry, key codes, keyboard actions, and configuration.
//!
//! # Role in tapboard
//! `tapboard-core` is the vocabulary layer. It owns the pixel geometry
//! primitives, the key-code constants shared by layouts and the commit path,
//! the [`KeyboardAction`](action::KeyboardAction) enum every touch gesture
//! reduces to, and the externally supplied [`KeyboardConfig`](config::KeyboardConfig).
//!
//! # How it fits in the system
//! `tapboard-layout` builds keyboards out of these primitives, `tapboard-input`
//! turns touch streams into actions, and `tapboard-render` paints key state.
//! Nothing in this crate holds mutable state beyond plain values.

pub mod action;
pub mod codes;
pub mod config;
pub mod geometry;
pub mod logging;
