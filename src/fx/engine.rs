//! Effect engine: merge celebrations, undo split, swap stream, black hole
//!
//! Triggers only schedule work on the virtual-clock timeline. `frame` drains
//! due tasks (spawning overlays and particle bursts), expires finished
//! overlays and steps the particle simulation once. The host keeps calling
//! `frame` from its animation callback while `is_running` is true.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::overlays::{Overlay, OverlayId, OverlayKind, OverlayTracker};
use super::particles::{Particle, ParticlePool, ParticleShape};
use super::tiers::{TIERS, Tier, is_top_tier, is_upper_tier, tier_index};
use crate::polar_to_cartesian;
use crate::settings::Settings;

const FLASH_MS: f64 = 260.0;
const NEBULA_MS: f64 = 1100.0;
const NEBULA_RING_COUNT: usize = 6;
const NEBULA_RING_STAGGER_MS: f64 = 70.0;
const RING_STAGGER_MS: f64 = 90.0;
/// Each later ring grows by this fraction of the first ring's diameter
const RING_GROWTH: f32 = 0.45;
const SHAKE_DELAY_MS: f64 = 60.0;
const SHAKE_MS: f64 = 420.0;
const AFTERSHOCK_DELAY_MS: f64 = 380.0;
const ECHO_DELAY_MS: f64 = 200.0;

const SPLIT_PALETTE: &[[f32; 3]] = &[[0.55, 0.85, 1.0], [0.75, 0.6, 1.0], [0.95, 0.95, 1.0]];
const SPLIT_CLUSTER: usize = 18;
const SPLIT_HALO: usize = 24;
const SPLIT_RING_STAGGER_MS: f64 = 110.0;

const SWAP_STREAM: usize = 14;
const SWAP_FRAMES: u32 = 28;

const VOID_PALETTE: &[[f32; 3]] = &[[0.55, 0.2, 0.85], [0.85, 0.3, 0.75], [0.25, 0.1, 0.45]];
const VOID_PARTICLES: usize = 40;
const VOID_MS: f64 = 900.0;

/// Screen region an effect is centered on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: Vec2,
    pub size: Vec2,
}

/// Which wave of a tier burst to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wave {
    Primary,
    /// Delayed, smaller and slower
    Echo,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FxTask {
    Overlay(Overlay),
    Burst { tier: usize, anchor: Vec2, wave: Wave },
}

/// What one animation frame produced for the host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FxFrame {
    /// Overlays to materialize, in layering order
    pub spawned: Vec<(OverlayId, Overlay)>,
    /// Overlays whose animation finished
    pub expired: Vec<OverlayId>,
    /// Live particles after this step
    pub particles: usize,
    /// Whether another frame is needed
    pub running: bool,
}

/// Owns the particle pool, overlay bookkeeping and pending effect tasks
pub struct EffectEngine {
    pool: ParticlePool,
    overlays: OverlayTracker,
    timeline: crate::sim::Timeline<FxTask>,
    rng: Pcg32,
    running: bool,
    shake_enabled: bool,
    viewport: Vec2,
}

impl EffectEngine {
    pub fn new(settings: &Settings, seed: u64) -> Self {
        Self {
            pool: ParticlePool::new(settings.max_particles()),
            overlays: OverlayTracker::new(),
            timeline: crate::sim::Timeline::new(),
            rng: Pcg32::seed_from_u64(seed),
            running: false,
            shake_enabled: settings.effective_screen_shake(),
            viewport: Vec2::new(800.0, 600.0),
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.pool.set_capacity(settings.max_particles());
        self.shake_enabled = settings.effective_screen_shake();
    }

    /// Viewport size, used to center full-screen overlays
    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = size;
    }

    /// Drop all pending and live effects
    pub fn shutdown(&mut self) {
        self.pool.clear();
        self.overlays.clear();
        self.timeline.clear();
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn particles(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn overlays(&self) -> &OverlayTracker {
        &self.overlays
    }

    /// Tasks waiting on the timeline
    pub fn pending(&self) -> usize {
        self.timeline.len()
    }

    /// Mark the loop active. Returns true if the host must start a frame loop.
    fn wake(&mut self) -> bool {
        let was_running = self.running;
        self.running = true;
        !was_running
    }

    fn schedule_overlay(&mut self, at: f64, overlay: Overlay) {
        self.timeline.schedule(at, FxTask::Overlay(overlay));
    }

    /// Merge celebration for `merged_value` at `anchor`.
    ///
    /// Layering order is flash, nebula, rings, shake, particles.
    pub fn trigger(&mut self, merged_value: u32, anchor: Vec2, now: f64) -> bool {
        let index = tier_index(merged_value);
        let tier = &TIERS[index];
        let primary = tier.palette[0];
        let secondary = tier.palette[1 % tier.palette.len()];

        self.schedule_overlay(
            now,
            Overlay::new(
                OverlayKind::Flash {
                    diameter: tier.flash_size,
                },
                anchor,
                primary,
                FLASH_MS,
            ),
        );

        if tier.nebula {
            let diameter = tier.flash_size * 1.6;
            self.schedule_overlay(
                now,
                Overlay::new(OverlayKind::Nebula { diameter }, anchor, secondary, NEBULA_MS),
            );
            if is_top_tier(tier) {
                for i in 0..NEBULA_RING_COUNT {
                    let angle = TAU * i as f32 / NEBULA_RING_COUNT as f32;
                    let color = tier.palette[i % tier.palette.len()];
                    self.schedule_overlay(
                        now + NEBULA_RING_STAGGER_MS * (i + 1) as f64,
                        Overlay::new(
                            OverlayKind::Nebula {
                                diameter: diameter * 0.7,
                            },
                            anchor + polar_to_cartesian(tier.ring_size * 0.6, angle),
                            color,
                            NEBULA_MS,
                        ),
                    );
                }
            }
        }

        for i in 0..tier.rings {
            let diameter = tier.ring_size * (1.0 + RING_GROWTH * i as f32);
            let color = tier.palette[i as usize % tier.palette.len()];
            self.schedule_overlay(
                now + RING_STAGGER_MS * i as f64,
                Overlay::new(
                    OverlayKind::Ring { diameter },
                    anchor,
                    color,
                    tier.ring_duration_ms,
                ),
            );
        }

        if let Some(intensity) = tier.shake.filter(|_| self.shake_enabled) {
            self.schedule_overlay(
                now + SHAKE_DELAY_MS,
                Overlay::new(OverlayKind::Shake { intensity }, anchor, primary, SHAKE_MS),
            );
            if is_upper_tier(tier) {
                self.schedule_overlay(
                    now + AFTERSHOCK_DELAY_MS,
                    Overlay::new(
                        OverlayKind::Shake {
                            intensity: intensity * 0.5,
                        },
                        anchor,
                        primary,
                        SHAKE_MS,
                    ),
                );
            }
        }

        self.timeline.schedule(
            now,
            FxTask::Burst {
                tier: index,
                anchor,
                wave: Wave::Primary,
            },
        );
        if tier.double_burst {
            self.timeline.schedule(
                now + ECHO_DELAY_MS,
                FxTask::Burst {
                    tier: index,
                    anchor,
                    wave: Wave::Echo,
                },
            );
        }

        log::debug!("Merge effect: value {} -> tier {}", merged_value, tier.value);
        self.wake()
    }

    /// Undo effect: opposing fission clusters, a halo, contracting rings,
    /// a viewport tint and a central flash, all around `region`
    pub fn trigger_split(&mut self, region: Region, now: f64) -> bool {
        let center = region.center;
        let extent = region.size.max_element().max(1.0);

        self.schedule_overlay(
            now,
            Overlay::new(OverlayKind::Tint, self.viewport * 0.5, SPLIT_PALETTE[1], 480.0),
        );
        for i in 0..3 {
            self.schedule_overlay(
                now + SPLIT_RING_STAGGER_MS * i as f64,
                Overlay::new(
                    OverlayKind::ContractingRing {
                        diameter: extent * (1.1 - 0.2 * i as f32),
                    },
                    center,
                    SPLIT_PALETTE[i % SPLIT_PALETTE.len()],
                    620.0,
                ),
            );
        }
        self.schedule_overlay(
            now,
            Overlay::new(
                OverlayKind::Flash {
                    diameter: extent * 0.35,
                },
                center,
                SPLIT_PALETTE[2],
                FLASH_MS,
            ),
        );

        let axis = self.rng.random_range(0.0..=TAU);
        for side in [0.0, PI] {
            for _ in 0..SPLIT_CLUSTER {
                let angle = axis + side + self.rng.random_range(-0.35..=0.35);
                let speed = self.rng.random_range(2.5..=5.0);
                let mut p = Particle::new(
                    center + polar_to_cartesian(extent * 0.05, angle),
                    polar_to_cartesian(speed, angle),
                    self.rng.random_range(30..=50),
                    self.rng.random_range(1.8..=3.2),
                    self.pick(SPLIT_PALETTE),
                    if self.rng.random_bool(0.3) {
                        ParticleShape::Comet
                    } else {
                        ParticleShape::Streak
                    },
                );
                p.friction = 0.94;
                p.glow = p.size * 2.0;
                self.pool.spawn(p);
            }
        }

        let halo_radius = extent * 0.5;
        for i in 0..SPLIT_HALO {
            let angle = TAU * i as f32 / SPLIT_HALO as f32 + self.rng.random_range(-0.1..=0.1);
            let mut p = Particle::new(
                center + polar_to_cartesian(halo_radius, angle),
                polar_to_cartesian(self.rng.random_range(0.4..=1.2), angle),
                self.rng.random_range(36..=60),
                self.rng.random_range(1.2..=2.2),
                self.pick(SPLIT_PALETTE),
                ParticleShape::Circle,
            );
            p.twinkle = Some(self.rng.random_range(0.0..=TAU));
            p.friction = 0.97;
            p.glow = p.size * 1.5;
            self.pool.spawn(p);
        }

        self.wake()
    }

    /// Swap effect: flashes at both anchors and particles streaming between them
    pub fn trigger_swap(&mut self, a: Vec2, b: Vec2, now: f64) -> bool {
        let color = [0.6, 0.9, 1.0];
        for anchor in [a, b] {
            self.schedule_overlay(
                now,
                Overlay::new(OverlayKind::Flash { diameter: 90.0 }, anchor, color, FLASH_MS),
            );
        }

        for (from, to) in [(a, b), (b, a)] {
            let delta = to - from;
            let perp = delta.perp().normalize_or_zero();
            for _ in 0..SWAP_STREAM {
                let frames = SWAP_FRAMES + self.rng.random_range(0..=8);
                let wobble = self.rng.random_range(-1.0..=1.0);
                let mut p = Particle::new(
                    from + perp * wobble * 6.0,
                    delta / frames as f32 + perp * wobble * 0.4,
                    frames,
                    self.rng.random_range(1.5..=2.6),
                    [0.6 + 0.4 * wobble.abs(), 0.9, 1.0],
                    ParticleShape::Comet,
                );
                p.glow = p.size * 2.0;
                self.pool.spawn(p);
            }
        }

        self.wake()
    }

    /// Tile removal: vortex, collapsing rings and particles spiralling inward
    pub fn trigger_black_hole(&mut self, anchor: Vec2, now: f64) -> bool {
        self.schedule_overlay(
            now,
            Overlay::new(OverlayKind::Vortex { diameter: 150.0 }, anchor, VOID_PALETTE[2], VOID_MS),
        );
        for i in 0..2 {
            self.schedule_overlay(
                now + 150.0 * i as f64,
                Overlay::new(
                    OverlayKind::ContractingRing {
                        diameter: 180.0 - 40.0 * i as f32,
                    },
                    anchor,
                    VOID_PALETTE[i],
                    600.0,
                ),
            );
        }
        if self.shake_enabled {
            self.schedule_overlay(
                now + VOID_MS * 0.7,
                Overlay::new(OverlayKind::Shake { intensity: 0.3 }, anchor, VOID_PALETTE[0], SHAKE_MS),
            );
        }
        self.schedule_overlay(
            now + VOID_MS * 0.7,
            Overlay::new(OverlayKind::Flash { diameter: 70.0 }, anchor, VOID_PALETTE[1], FLASH_MS),
        );

        for _ in 0..VOID_PARTICLES {
            let angle = self.rng.random_range(0.0..=TAU);
            let radius = self.rng.random_range(55.0..=95.0);
            let offset = polar_to_cartesian(radius, angle);
            let inward = -offset.normalize_or_zero();
            let tangent = inward.perp();
            let frames: u32 = self.rng.random_range(36..=54);
            let speed = radius / frames as f32;
            let mut p = Particle::new(
                anchor + offset,
                inward * speed + tangent * speed * 0.8,
                frames,
                self.rng.random_range(1.4..=2.6),
                self.pick(VOID_PALETTE),
                if self.rng.random_bool(0.25) {
                    ParticleShape::Bolt
                } else {
                    ParticleShape::Streak
                },
            );
            p.glow = p.size * 2.5;
            p.spin = 0.15;
            self.pool.spawn(p);
        }

        self.wake()
    }

    /// Advance the effect clock to `now` and step particles one frame
    pub fn frame(&mut self, now: f64) -> FxFrame {
        let mut out = FxFrame::default();

        for task in self.timeline.drain_due(now) {
            match task {
                FxTask::Overlay(overlay) => {
                    let id = self.overlays.spawn(overlay, now);
                    out.spawned.push((id, overlay));
                }
                FxTask::Burst { tier, anchor, wave } => {
                    self.spawn_burst(&TIERS[tier], anchor, wave);
                }
            }
        }

        out.expired = self.overlays.expire(now);
        out.particles = self.pool.step();

        self.running = !(self.pool.is_empty() && self.timeline.is_empty() && self.overlays.is_empty());
        out.running = self.running;
        out
    }

    fn pick(&mut self, palette: &[[f32; 3]]) -> [f32; 3] {
        palette[self.rng.random_range(0..palette.len())]
    }

    fn spawn_burst(&mut self, tier: &Tier, anchor: Vec2, wave: Wave) {
        let (count, speed_scale, life_scale) = match wave {
            Wave::Primary => (tier.count, 1.0, 1.0),
            Wave::Echo => (tier.count / 2, 0.55, 1.25),
        };

        for _ in 0..count {
            let angle = self.rng.random_range(0.0..=TAU);
            let speed = self.rng.random_range(tier.speed.0..=tier.speed.1) * speed_scale;
            let jitter = polar_to_cartesian(
                self.rng.random_range(0.0..=tier.spread),
                self.rng.random_range(0.0..=TAU),
            );
            let life = self.rng.random_range(tier.life.0..=tier.life.1) as f32 * life_scale;
            let size = self.rng.random_range(tier.size.0..=tier.size.1);
            let shape = tier.shapes[self.rng.random_range(0..tier.shapes.len())];

            let mut p = Particle::new(
                anchor + jitter,
                polar_to_cartesian(speed, angle),
                life as u32,
                size,
                self.pick(tier.palette),
                shape,
            );
            p.friction = tier.friction;
            p.acc = Vec2::new(0.0, tier.gravity);
            p.glow = size * tier.glow;
            p.rotation = angle;
            p.spin = self.rng.random_range(-0.2..=0.2);
            if matches!(shape, ParticleShape::Star | ParticleShape::Cross) {
                p.twinkle = Some(self.rng.random_range(0.0..=TAU));
            }
            self.pool.spawn(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;

    fn engine() -> EffectEngine {
        EffectEngine::new(&Settings::from_preset(QualityPreset::High), 7)
    }

    fn kinds(frame: &FxFrame) -> Vec<&'static str> {
        frame.spawned.iter().map(|(_, o)| o.kind.css_class()).collect()
    }

    /// Run frames until `end`, collecting every spawned overlay
    fn run_until(fx: &mut EffectEngine, start: f64, end: f64) -> Vec<Overlay> {
        let mut spawned = Vec::new();
        let mut now = start;
        while now <= end {
            spawned.extend(fx.frame(now).spawned.into_iter().map(|(_, o)| o));
            now += 16.0;
        }
        spawned
    }

    #[test]
    fn test_first_frame_layering_order() {
        let mut fx = engine();
        fx.trigger(256, Vec2::new(100.0, 100.0), 0.0);
        let frame = fx.frame(0.0);

        assert_eq!(kinds(&frame), vec!["fx-flash", "fx-nebula", "fx-ring"]);
        assert_eq!(frame.particles, TIERS[tier_index(256)].count);
    }

    #[test]
    fn test_top_tier_for_large_values() {
        let mut fx = engine();
        fx.trigger(3000, Vec2::ZERO, 0.0);
        let overlays = run_until(&mut fx, 0.0, 1000.0);

        let nebulae = overlays
            .iter()
            .filter(|o| matches!(o.kind, OverlayKind::Nebula { .. }))
            .count();
        let rings = overlays
            .iter()
            .filter(|o| matches!(o.kind, OverlayKind::Ring { .. }))
            .count();
        let shakes = overlays
            .iter()
            .filter(|o| matches!(o.kind, OverlayKind::Shake { .. }))
            .count();
        assert_eq!(nebulae, 1 + NEBULA_RING_COUNT);
        assert_eq!(rings, TIERS[10].rings as usize);
        assert_eq!(shakes, 2);
    }

    #[test]
    fn test_odd_value_falls_back_to_smallest_tier() {
        let mut fx = engine();
        fx.trigger(3, Vec2::ZERO, 0.0);
        let frame = fx.frame(0.0);
        assert_eq!(kinds(&frame), vec!["fx-flash"]);
        assert_eq!(frame.particles, TIERS[0].count);
    }

    #[test]
    fn test_rings_are_staggered_and_growing() {
        let mut fx = engine();
        fx.trigger(512, Vec2::ZERO, 0.0);
        let rings: Vec<f32> = run_until(&mut fx, 0.0, 400.0)
            .iter()
            .filter_map(|o| match o.kind {
                OverlayKind::Ring { diameter } => Some(diameter),
                _ => None,
            })
            .collect();
        assert_eq!(rings.len(), 3);
        assert!(rings.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_double_burst_adds_echo_wave() {
        let mut fx = engine();
        let tier = &TIERS[tier_index(512)];
        fx.trigger(512, Vec2::ZERO, 0.0);
        let first = fx.frame(0.0).particles;
        assert_eq!(first, tier.count);

        let echo = fx.frame(ECHO_DELAY_MS).particles;
        assert!(echo > first, "echo wave should add particles");
    }

    #[test]
    fn test_shake_respects_settings() {
        let mut settings = Settings::default();
        settings.reduced_motion = true;
        let mut fx = EffectEngine::new(&settings, 1);
        fx.trigger(2048, Vec2::ZERO, 0.0);
        let overlays = run_until(&mut fx, 0.0, 1000.0);
        assert!(overlays.iter().all(|o| !matches!(o.kind, OverlayKind::Shake { .. })));
    }

    #[test]
    fn test_global_particle_cap() {
        let mut fx = EffectEngine::new(&Settings::from_preset(QualityPreset::Low), 3);
        let cap = QualityPreset::Low.max_particles();
        for i in 0..5 {
            fx.trigger(2048, Vec2::ZERO, i as f64);
            let frame = fx.frame(i as f64);
            assert!(frame.particles <= cap);
        }
        assert!(fx.particles().len() <= cap);
    }

    #[test]
    fn test_loop_stops_when_idle_and_restarts_lazily() {
        let mut fx = engine();
        assert!(fx.trigger(2, Vec2::ZERO, 0.0));
        assert!(!fx.trigger(2, Vec2::ZERO, 0.0), "already running");

        let mut now = 0.0;
        while fx.frame(now).running {
            now += 16.0;
            assert!(now < 10_000.0, "effects never settled");
        }
        assert!(!fx.is_running());
        assert!(fx.particles().is_empty());
        assert!(fx.overlays().is_empty());

        assert!(fx.trigger(2, Vec2::ZERO, now));
    }

    #[test]
    fn test_split_effect_composition() {
        let mut fx = engine();
        let region = Region {
            center: Vec2::new(200.0, 200.0),
            size: Vec2::new(400.0, 400.0),
        };
        fx.trigger_split(region, 0.0);
        let first = fx.frame(0.0);
        assert_eq!(first.particles, SPLIT_CLUSTER * 2 + SPLIT_HALO);

        let mut overlays: Vec<Overlay> = first.spawned.iter().map(|(_, o)| *o).collect();
        overlays.extend(run_until(&mut fx, 16.0, 500.0));
        let contracting = overlays
            .iter()
            .filter(|o| matches!(o.kind, OverlayKind::ContractingRing { .. }))
            .count();
        assert_eq!(contracting, 3);
        assert_eq!(overlays.iter().filter(|o| o.kind == OverlayKind::Tint).count(), 1);
        assert!(overlays.iter().any(|o| matches!(o.kind, OverlayKind::Flash { .. })));
    }

    #[test]
    fn test_swap_stream_travels_toward_target() {
        let mut fx = engine();
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(300.0, 0.0);
        fx.trigger_swap(a, b, 0.0);
        fx.frame(0.0);
        let moving_right = fx.particles().iter().filter(|p| p.vel.x > 0.0).count();
        let moving_left = fx.particles().iter().filter(|p| p.vel.x < 0.0).count();
        assert_eq!(moving_right, SWAP_STREAM);
        assert_eq!(moving_left, SWAP_STREAM);
    }

    #[test]
    fn test_black_hole_particles_fall_inward() {
        let mut fx = engine();
        let anchor = Vec2::new(50.0, 50.0);
        fx.trigger_black_hole(anchor, 0.0);
        let frame = fx.frame(0.0);
        assert_eq!(kinds(&frame)[0], "fx-vortex");
        for p in fx.particles().iter() {
            let to_center = anchor - p.pos;
            assert!(p.vel.dot(to_center) > 0.0);
        }
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let mut fx = engine();
        fx.trigger(1024, Vec2::ZERO, 0.0);
        fx.frame(0.0);
        fx.shutdown();
        assert!(!fx.is_running());
        assert!(fx.particles().is_empty());
        assert_eq!(fx.pending(), 0);
    }
}
