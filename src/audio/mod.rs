//! Procedural audio
//!
//! Every sound is synthesized from oscillators and filtered noise. No sample
//! files are loaded.

pub mod backend;
pub mod manager;
pub mod recipe;

pub use backend::{AudioBackend, AudioOp, LoopId, SilentBackend};
#[cfg(target_arch = "wasm32")]
pub use backend::WebAudioBackend;
pub use manager::AudioManager;
pub use recipe::{SoundEvent, Voice, recipe};
