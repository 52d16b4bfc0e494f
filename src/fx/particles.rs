//! Particle simulation
//!
//! Particles live in a fixed-capacity slot arena. Spawning into a full pool
//! evicts the oldest live particle, so the live count never exceeds capacity.

use std::collections::VecDeque;

use glam::Vec2;

use crate::consts::TRAIL_LENGTH;

/// Fraction of a particle's life spent fading in
const FADE_IN: f32 = 0.15;
/// Exponent of the fade-out curve
const FADE_OUT_POWER: f32 = 0.7;
/// Twinkle phase advance per frame (radians)
const TWINKLE_RATE: f32 = 0.35;

/// Closed set of particle shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleShape {
    Circle,
    Star,
    /// Short line along the velocity
    Streak,
    /// Head with a fading trail
    Comet,
    /// Radiating four-point cross
    Cross,
    /// Jagged lightning segment
    Bolt,
}

impl ParticleShape {
    /// Shapes that keep a history of recent positions
    pub fn has_trail(self) -> bool {
        matches!(self, ParticleShape::Comet)
    }
}

/// Bounded history of recent positions, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    points: VecDeque<Vec2>,
    cap: usize,
}

impl Trail {
    pub fn new(cap: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, pos: Vec2) {
        if self.cap == 0 {
            return;
        }
        if self.points.len() == self.cap {
            self.points.pop_back();
        }
        self.points.push_front(pos);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec2> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single effect particle. Lifetimes are counted in frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Constant acceleration added each frame (gravity)
    pub acc: Vec2,
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
    pub color: [f32; 3],
    pub shape: ParticleShape,
    /// Glow radius in px (0 = none)
    pub glow: f32,
    pub trail: Option<Trail>,
    pub rotation: f32,
    pub spin: f32,
    pub twinkle: Option<f32>,
    /// Per-frame velocity multiplier
    pub friction: f32,
}

impl Particle {
    pub fn new(
        pos: Vec2,
        vel: Vec2,
        life: u32,
        size: f32,
        color: [f32; 3],
        shape: ParticleShape,
    ) -> Self {
        let life = life.max(1);
        Self {
            pos,
            vel,
            acc: Vec2::ZERO,
            life,
            max_life: life,
            size,
            color,
            shape,
            glow: 0.0,
            trail: shape.has_trail().then(|| Trail::new(TRAIL_LENGTH)),
            rotation: 0.0,
            spin: 0.0,
            twinkle: None,
            friction: 1.0,
        }
    }

    /// Remaining life in [0, 1]; 1 at birth
    pub fn life_fraction(&self) -> f32 {
        self.life as f32 / self.max_life as f32
    }

    /// Render opacity including twinkle
    pub fn alpha(&self) -> f32 {
        let base = particle_alpha(self.life_fraction());
        match self.twinkle {
            Some(phase) => base * (0.65 + 0.35 * phase.sin()),
            None => base,
        }
    }

    /// Advance one frame. Returns false once the particle is dead.
    pub fn step(&mut self) -> bool {
        if let Some(trail) = &mut self.trail {
            trail.push(self.pos);
        }
        self.vel *= self.friction;
        self.vel += self.acc;
        self.pos += self.vel;
        self.rotation += self.spin;
        if let Some(phase) = &mut self.twinkle {
            *phase += TWINKLE_RATE;
        }
        self.life = self.life.saturating_sub(1);
        self.life > 0
    }
}

/// Fast-attack, slow-decay opacity curve over remaining life fraction
pub fn particle_alpha(remaining: f32) -> f32 {
    let remaining = remaining.clamp(0.0, 1.0);
    let age = 1.0 - remaining;
    if age < FADE_IN {
        age / FADE_IN
    } else {
        remaining.powf(FADE_OUT_POWER)
    }
}

/// Generation-checked reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    born: u64,
    particle: Option<Particle>,
}

/// Fixed-capacity particle arena with oldest-first eviction
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
    births: u64,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            live: 0,
            births: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the live-particle budget, evicting the oldest overflow
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.live > capacity {
            self.evict_oldest();
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Insert a particle. Returns `None` only when the budget is zero.
    pub fn spawn(&mut self, particle: Particle) -> Option<ParticleHandle> {
        if self.capacity == 0 {
            return None;
        }
        if self.live >= self.capacity {
            self.evict_oldest();
        }

        let born = self.births;
        self.births += 1;

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    born,
                    particle: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.born = born;
        slot.particle = Some(particle);
        self.live += 1;

        Some(ParticleHandle {
            index,
            generation: slot.generation,
        })
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.particle.as_ref())
    }

    /// Live particles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter_map(|s| s.particle.as_ref())
    }

    /// Advance every particle one frame and free the dead. Returns live count.
    pub fn step(&mut self) -> usize {
        for index in 0..self.slots.len() {
            let alive = match self.slots[index].particle.as_mut() {
                Some(p) => p.step(),
                None => continue,
            };
            if !alive {
                self.release(index);
            }
        }
        self.live
    }

    /// Drop every particle
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].particle.is_some() {
                self.release(index);
            }
        }
    }

    fn release(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.particle = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        self.live -= 1;
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.particle.is_some())
            .min_by_key(|(_, s)| s.born)
            .map(|(i, _)| i);
        if let Some(index) = oldest {
            self.release(index);
        }
    }
}
