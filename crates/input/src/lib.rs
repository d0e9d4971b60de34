//! Keyboard input: a listener hub and the arrow-key controller.
//!
//! # Invariants
//! - Last key wins: each key-down overwrites the orientation, any key-up
//!   resets it. Held keys are not tracked.
//! - A detached controller leaves no listeners behind.

pub mod action;
pub mod controller;
pub mod keyboard;

pub use action::{Action, Key, STEP};
pub use controller::InputController;
pub use keyboard::{KeyEvent, KeyEventKind, KeyboardHub, ListenerId};

pub fn crate_info() -> &'static str {
    "wingspan-input v0.1.0"
}
