//! Platform abstraction layer
//!
//! - `input`: keyboard and swipe decoding (pure, testable natively)
//! - `dom`: the browser board view (wasm only)

pub mod input;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use input::{Command, SwipeTracker, decode_key, swipe_direction};

#[cfg(target_arch = "wasm32")]
pub use dom::DomBoardView;
