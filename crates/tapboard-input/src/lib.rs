#![forbid(unsafe_code)]

//! Touch interpretation for tapboard.
//!
//! # Role in tapboard
//! This crate turns raw touch samples into [`KeyboardAction`]s. It owns
//! everything stateful about a keyboard in use: the gesture state machine,
//! its timers, multi-tap cycling, swipe detection, popup keyboards and the
//! shift/caps machine.
//!
//! # Primary responsibilities
//! - **PointerNormalizer**: collapses multi-pointer input into one pointer.
//! - **TouchStateMachine**: debounce, multi-tap, repeat, long-press, swipe.
//! - **TimerQueue**: generation-tagged deadlines polled by the host.
//! - **ActivePopup**: nested machine for long-press keyboards.
//! - **ShiftMachine** / **KeyInterpreter**: shift, caps lock, auto-caps and
//!   mode switching, producing [`EditorCommand`]s.
//! - **KeyboardEngine**: ties the above to one installed keyboard.
//!
//! # How it fits in the system
//! `tapboard-layout` provides immutable keyboards and hit resolution;
//! `tapboard-render` provides per-key visual state. The engine here mutates
//! only its own state and hands actions back to the caller; no callbacks
//! run while it holds borrows.
//!
//! [`KeyboardAction`]: tapboard_core::action::KeyboardAction

pub mod engine;
pub mod gesture;
pub mod interpret;
pub mod multitap;
pub mod popup;
pub mod shift;
pub mod swipe;
pub mod timer;
pub mod touch;

pub use engine::KeyboardEngine;
pub use gesture::{GesturePhase, TouchSession, TouchStateMachine};
pub use interpret::{EditorCommand, KeyInterpreter};
pub use multitap::MultiTap;
pub use popup::{ActivePopup, MiniKeyboardCache, PopupRoute};
pub use shift::{InputFieldKind, ShiftMachine};
pub use swipe::SwipeTracker;
pub use timer::{TimerKind, TimerQueue};
pub use touch::{PointerNormalizer, TouchEvent, TouchInput, TouchPhase};
