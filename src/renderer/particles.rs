//! Particle pool to triangle list

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, rgba};
use crate::fx::{Particle, ParticlePool, ParticleShape};

/// Segments for round shapes; glows get fewer since they are soft anyway
const CIRCLE_SEGMENTS: u32 = 10;
const GLOW_SEGMENTS: u32 = 8;
/// Glow opacity relative to the particle body
const GLOW_ALPHA: f32 = 0.35;

/// Tessellate every live particle, glows underneath bodies
pub fn particle_vertices(pool: &ParticlePool) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(pool.len() * 48);
    for particle in pool.iter() {
        push_particle(&mut out, particle);
    }
    out
}

/// Append one particle's geometry
pub fn push_particle(out: &mut Vec<Vertex>, p: &Particle) {
    let alpha = p.alpha();
    if alpha <= 0.0 {
        return;
    }
    let color = rgba(p.color, alpha);

    if p.glow > 0.0 {
        shapes::glow(out, p.pos, p.glow, rgba(p.color, alpha * GLOW_ALPHA), GLOW_SEGMENTS);
    }

    match p.shape {
        ParticleShape::Circle => shapes::circle(out, p.pos, p.size, color, CIRCLE_SEGMENTS),
        ParticleShape::Star => shapes::star(out, p.pos, p.size * 1.6, p.rotation, color),
        ParticleShape::Streak => shapes::streak(out, p.pos, p.vel, p.size * 0.6, color),
        ParticleShape::Comet => {
            let trail: Vec<Vec2> = p.trail.iter().flat_map(|t| t.iter().copied()).collect();
            shapes::comet_trail(out, p.pos, &trail, p.size, color);
            shapes::circle(out, p.pos, p.size, color, CIRCLE_SEGMENTS);
        }
        ParticleShape::Cross => shapes::cross(out, p.pos, p.size * 2.2, p.rotation, color),
        ParticleShape::Bolt => shapes::bolt(out, p.pos, p.size * 2.0, p.rotation, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(shape: ParticleShape) -> Particle {
        let mut p = Particle::new(Vec2::new(10.0, 10.0), Vec2::new(2.0, 0.0), 20, 3.0, [1.0; 3], shape);
        // Past the fade-in so alpha is non-zero
        for _ in 0..5 {
            p.step();
        }
        p
    }

    #[test]
    fn test_fresh_particle_is_invisible() {
        let p = Particle::new(Vec2::ZERO, Vec2::ZERO, 20, 3.0, [1.0; 3], ParticleShape::Circle);
        let mut out = Vec::new();
        push_particle(&mut out, &p);
        assert!(out.is_empty());
    }

    #[test]
    fn test_every_shape_emits_triangles() {
        let shapes = [
            ParticleShape::Circle,
            ParticleShape::Star,
            ParticleShape::Streak,
            ParticleShape::Comet,
            ParticleShape::Cross,
            ParticleShape::Bolt,
        ];
        for shape in shapes {
            let mut out = Vec::new();
            push_particle(&mut out, &particle(shape));
            assert!(!out.is_empty(), "{:?} drew nothing", shape);
            assert_eq!(out.len() % 3, 0);
        }
    }

    #[test]
    fn test_glow_adds_geometry() {
        let plain = particle(ParticleShape::Circle);
        let mut glowing = plain.clone();
        glowing.glow = 6.0;

        let (mut a, mut b) = (Vec::new(), Vec::new());
        push_particle(&mut a, &plain);
        push_particle(&mut b, &glowing);
        assert_eq!(b.len(), a.len() + GLOW_SEGMENTS as usize * 3);
    }

    #[test]
    fn test_pool_vertices() {
        let mut pool = ParticlePool::new(4);
        pool.spawn(particle(ParticleShape::Circle));
        pool.spawn(particle(ParticleShape::Star));
        let vertices = particle_vertices(&pool);
        assert_eq!(vertices.len(), (CIRCLE_SEGMENTS as usize + 10) * 3);
    }
}
