//! Visual effects: tiered merge celebrations and the particle simulation
//!
//! Nothing here touches the DOM or GPU. The host polls `EffectEngine::frame`
//! and materializes overlays and particles itself.

pub mod engine;
pub mod overlays;
pub mod particles;
pub mod tiers;

pub use engine::{EffectEngine, FxFrame, Region};
pub use overlays::{Overlay, OverlayId, OverlayKind, OverlayTracker};
pub use particles::{Particle, ParticleHandle, ParticlePool, ParticleShape, particle_alpha};
pub use tiers::{TIERS, Tier, resolve_tier};
