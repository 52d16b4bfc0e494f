//! WebGPU particle rendering
//!
//! Particles are tessellated on the CPU into a triangle list and drawn on a
//! transparent canvas layered over the board.

pub mod particles;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use particles::particle_vertices;
pub use pipeline::ParticleCanvas;
pub use vertex::Vertex;
