//! Effect intensity tiers
//!
//! Keyed by merge result. Lookup picks the largest key not above the value and
//! falls back to the smallest tier for anything below it.

use super::particles::ParticleShape;
use ParticleShape::*;

/// Per-tier effect configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    /// Merge value this tier starts at
    pub value: u32,
    /// Particles in the primary burst
    pub count: usize,
    pub palette: &'static [[f32; 3]],
    /// Spawn jitter around the anchor (px)
    pub spread: f32,
    /// Initial speed range (px/frame)
    pub speed: (f32, f32),
    /// Lifetime range (frames)
    pub life: (u32, u32),
    /// Radius range (px)
    pub size: (f32, f32),
    pub shapes: &'static [ParticleShape],
    pub rings: u8,
    pub ring_duration_ms: f64,
    /// Diameter of the first ring (px); later rings grow from it
    pub ring_size: f32,
    pub nebula: bool,
    /// Board shake intensity (0-1), if any
    pub shake: Option<f32>,
    pub flash_size: f32,
    /// Fire a second, slower wave after a delay
    pub double_burst: bool,
    /// Downward acceleration (px/frame²)
    pub gravity: f32,
    /// Per-frame velocity multiplier
    pub friction: f32,
    /// Glow radius as a multiple of particle size
    pub glow: f32,
}

const WARM: &[[f32; 3]] = &[[1.0, 0.93, 0.78], [0.98, 0.84, 0.55]];
const AMBER: &[[f32; 3]] = &[[1.0, 0.75, 0.35], [1.0, 0.6, 0.25], [1.0, 0.9, 0.6]];
const EMBER: &[[f32; 3]] = &[[1.0, 0.5, 0.2], [1.0, 0.35, 0.15], [1.0, 0.8, 0.4]];
const CORAL: &[[f32; 3]] = &[[1.0, 0.4, 0.4], [1.0, 0.6, 0.45], [1.0, 0.85, 0.6]];
const ROSE: &[[f32; 3]] = &[[1.0, 0.35, 0.55], [0.95, 0.5, 0.8], [1.0, 0.8, 0.9]];
const VIOLET: &[[f32; 3]] = &[[0.7, 0.45, 1.0], [0.55, 0.35, 0.95], [0.9, 0.75, 1.0]];
const AZURE: &[[f32; 3]] = &[[0.35, 0.65, 1.0], [0.5, 0.85, 1.0], [0.85, 0.95, 1.0]];
const TEAL: &[[f32; 3]] = &[[0.3, 0.95, 0.85], [0.45, 0.8, 1.0], [0.9, 1.0, 0.95]];
const AURORA: &[[f32; 3]] = &[
    [0.4, 1.0, 0.6],
    [0.35, 0.75, 1.0],
    [0.8, 0.5, 1.0],
    [1.0, 1.0, 0.85],
];
const SUPERNOVA: &[[f32; 3]] = &[
    [1.0, 1.0, 1.0],
    [1.0, 0.85, 0.35],
    [0.6, 0.8, 1.0],
    [1.0, 0.45, 0.75],
    [0.75, 0.55, 1.0],
];

/// Static tier table, ascending by `value`
pub static TIERS: [Tier; 11] = [
    Tier {
        value: 2,
        count: 8,
        palette: WARM,
        spread: 4.0,
        speed: (1.0, 2.2),
        life: (22, 34),
        size: (1.5, 2.5),
        shapes: &[Circle],
        rings: 0,
        ring_duration_ms: 400.0,
        ring_size: 60.0,
        nebula: false,
        shake: None,
        flash_size: 60.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.92,
        glow: 1.5,
    },
    Tier {
        value: 4,
        count: 10,
        palette: WARM,
        spread: 5.0,
        speed: (1.2, 2.6),
        life: (24, 36),
        size: (1.5, 2.8),
        shapes: &[Circle],
        rings: 0,
        ring_duration_ms: 400.0,
        ring_size: 64.0,
        nebula: false,
        shake: None,
        flash_size: 66.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.92,
        glow: 1.6,
    },
    Tier {
        value: 8,
        count: 14,
        palette: AMBER,
        spread: 6.0,
        speed: (1.5, 3.0),
        life: (26, 40),
        size: (1.8, 3.0),
        shapes: &[Circle, Star],
        rings: 1,
        ring_duration_ms: 450.0,
        ring_size: 70.0,
        nebula: false,
        shake: None,
        flash_size: 72.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.93,
        glow: 1.8,
    },
    Tier {
        value: 16,
        count: 18,
        palette: EMBER,
        spread: 7.0,
        speed: (1.8, 3.4),
        life: (28, 44),
        size: (2.0, 3.2),
        shapes: &[Circle, Star],
        rings: 1,
        ring_duration_ms: 480.0,
        ring_size: 76.0,
        nebula: false,
        shake: None,
        flash_size: 80.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.93,
        glow: 2.0,
    },
    Tier {
        value: 32,
        count: 22,
        palette: CORAL,
        spread: 8.0,
        speed: (2.0, 3.8),
        life: (30, 48),
        size: (2.0, 3.4),
        shapes: &[Circle, Star, Streak],
        rings: 1,
        ring_duration_ms: 500.0,
        ring_size: 84.0,
        nebula: false,
        shake: None,
        flash_size: 88.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.935,
        glow: 2.2,
    },
    Tier {
        value: 64,
        count: 28,
        palette: ROSE,
        spread: 9.0,
        speed: (2.2, 4.2),
        life: (32, 52),
        size: (2.2, 3.6),
        shapes: &[Circle, Star, Streak],
        rings: 2,
        ring_duration_ms: 550.0,
        ring_size: 90.0,
        nebula: false,
        shake: None,
        flash_size: 96.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.94,
        glow: 2.4,
    },
    Tier {
        value: 128,
        count: 34,
        palette: VIOLET,
        spread: 10.0,
        speed: (2.5, 4.6),
        life: (36, 58),
        size: (2.2, 3.8),
        shapes: &[Circle, Star, Streak, Comet],
        rings: 2,
        ring_duration_ms: 600.0,
        ring_size: 100.0,
        nebula: true,
        shake: None,
        flash_size: 110.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.94,
        glow: 2.6,
    },
    Tier {
        value: 256,
        count: 42,
        palette: AZURE,
        spread: 12.0,
        speed: (2.8, 5.0),
        life: (40, 64),
        size: (2.4, 4.0),
        shapes: &[Circle, Star, Streak, Comet],
        rings: 2,
        ring_duration_ms: 650.0,
        ring_size: 110.0,
        nebula: true,
        shake: Some(0.25),
        flash_size: 124.0,
        double_burst: false,
        gravity: 0.0,
        friction: 0.945,
        glow: 2.8,
    },
    Tier {
        value: 512,
        count: 52,
        palette: TEAL,
        spread: 14.0,
        speed: (3.0, 5.6),
        life: (44, 72),
        size: (2.5, 4.2),
        shapes: &[Circle, Star, Streak, Comet, Cross],
        rings: 3,
        ring_duration_ms: 700.0,
        ring_size: 120.0,
        nebula: true,
        shake: Some(0.4),
        flash_size: 140.0,
        double_burst: true,
        gravity: 0.0,
        friction: 0.95,
        glow: 3.0,
    },
    Tier {
        value: 1024,
        count: 64,
        palette: AURORA,
        spread: 16.0,
        speed: (3.4, 6.2),
        life: (50, 80),
        size: (2.6, 4.6),
        shapes: &[Circle, Star, Streak, Comet, Cross, Bolt],
        rings: 3,
        ring_duration_ms: 800.0,
        ring_size: 130.0,
        nebula: true,
        shake: Some(0.6),
        flash_size: 160.0,
        double_burst: true,
        gravity: 0.04,
        friction: 0.955,
        glow: 3.3,
    },
    Tier {
        value: 2048,
        count: 80,
        palette: SUPERNOVA,
        spread: 18.0,
        speed: (3.8, 7.0),
        life: (60, 96),
        size: (2.8, 5.0),
        shapes: &[Circle, Star, Streak, Comet, Cross, Bolt],
        rings: 4,
        ring_duration_ms: 900.0,
        ring_size: 140.0,
        nebula: true,
        shake: Some(1.0),
        flash_size: 200.0,
        double_burst: true,
        gravity: 0.06,
        friction: 0.96,
        glow: 3.6,
    },
];

/// Index of the tier for a merge value
pub fn tier_index(value: u32) -> usize {
    TIERS.iter().rposition(|t| t.value <= value).unwrap_or(0)
}

/// Tier for a merge value; never fails
pub fn resolve_tier(value: u32) -> &'static Tier {
    &TIERS[tier_index(value)]
}

/// True for the highest tier
pub fn is_top_tier(tier: &Tier) -> bool {
    tier_index(tier.value) == TIERS.len() - 1
}

/// True for the two highest tiers (aftershock shake)
pub fn is_upper_tier(tier: &Tier) -> bool {
    tier_index(tier.value) + 2 >= TIERS.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(resolve_tier(2).value, 2);
        assert_eq!(resolve_tier(128).value, 128);
        assert_eq!(resolve_tier(2048).value, 2048);
    }

    #[test]
    fn test_above_top_uses_top() {
        assert_eq!(resolve_tier(3000).value, 2048);
        assert_eq!(resolve_tier(u32::MAX).value, 2048);
    }

    #[test]
    fn test_between_keys_rounds_down() {
        assert_eq!(resolve_tier(3).value, 2);
        assert_eq!(resolve_tier(100).value, 64);
    }

    #[test]
    fn test_below_smallest_falls_back() {
        assert_eq!(resolve_tier(0).value, 2);
        assert_eq!(resolve_tier(1).value, 2);
    }

    #[test]
    fn test_table_is_ascending_and_well_formed() {
        for pair in TIERS.windows(2) {
            assert!(pair[0].value < pair[1].value);
            assert!(pair[0].count <= pair[1].count);
        }
        for tier in &TIERS {
            assert!(!tier.palette.is_empty());
            assert!(!tier.shapes.is_empty());
            assert!(tier.speed.0 <= tier.speed.1);
            assert!(tier.life.0 <= tier.life.1 && tier.life.0 > 0);
            assert!(tier.friction > 0.0 && tier.friction <= 1.0);
        }
    }

    #[test]
    fn test_tiers_from_8_have_distinct_palettes() {
        let palettes: Vec<_> = TIERS.iter().skip(2).map(|t| t.palette).collect();
        for (i, a) in palettes.iter().enumerate() {
            for b in &palettes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_upper_tiers() {
        assert!(is_top_tier(resolve_tier(2048)));
        assert!(!is_top_tier(resolve_tier(1024)));
        assert!(is_upper_tier(resolve_tier(1024)));
        assert!(!is_upper_tier(resolve_tier(512)));
    }
}
