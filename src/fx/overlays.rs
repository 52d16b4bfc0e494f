//! Timed overlay elements layered over the board
//!
//! Overlays are described here and materialized by the host (DOM elements
//! with CSS animations). Each one self-removes once its duration elapses.

use glam::Vec2;

/// Overlay variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayKind {
    /// Brief bright disc at the anchor
    Flash { diameter: f32 },
    /// Soft expanding cloud
    Nebula { diameter: f32 },
    /// Expanding shockwave ring
    Ring { diameter: f32 },
    /// Ring collapsing toward the anchor
    ContractingRing { diameter: f32 },
    /// Shake of the board container
    Shake { intensity: f32 },
    /// Full-viewport color wash
    Tint,
    /// Dark swirling disc for tile removal
    Vortex { diameter: f32 },
}

impl OverlayKind {
    /// CSS class the DOM host applies
    pub fn css_class(&self) -> &'static str {
        match self {
            OverlayKind::Flash { .. } => "fx-flash",
            OverlayKind::Nebula { .. } => "fx-nebula",
            OverlayKind::Ring { .. } => "fx-ring",
            OverlayKind::ContractingRing { .. } => "fx-ring-in",
            OverlayKind::Shake { intensity } if *intensity >= 0.6 => "fx-shake-heavy",
            OverlayKind::Shake { .. } => "fx-shake",
            OverlayKind::Tint => "fx-tint",
            OverlayKind::Vortex { .. } => "fx-vortex",
        }
    }

    /// Element size in px, if the overlay is sized
    pub fn diameter(&self) -> Option<f32> {
        match *self {
            OverlayKind::Flash { diameter }
            | OverlayKind::Nebula { diameter }
            | OverlayKind::Ring { diameter }
            | OverlayKind::ContractingRing { diameter }
            | OverlayKind::Vortex { diameter } => Some(diameter),
            OverlayKind::Shake { .. } | OverlayKind::Tint => None,
        }
    }
}

/// An overlay ready to be spawned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    /// Center in viewport pixels
    pub anchor: Vec2,
    pub color: [f32; 3],
    pub duration_ms: f64,
}

impl Overlay {
    pub fn new(kind: OverlayKind, anchor: Vec2, color: [f32; 3], duration_ms: f64) -> Self {
        Self {
            kind,
            anchor,
            color,
            duration_ms,
        }
    }

    /// CSS `rgb()` string for the overlay color
    pub fn css_color(&self) -> String {
        let [r, g, b] = self.color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("rgb({r}, {g}, {b})")
    }
}

/// Identity of a spawned overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

/// A spawned overlay awaiting removal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveOverlay {
    pub id: OverlayId,
    pub overlay: Overlay,
    pub expires_at: f64,
}

/// Bookkeeping of live overlays
#[derive(Debug, Clone, Default)]
pub struct OverlayTracker {
    active: Vec<ActiveOverlay>,
    next_id: u64,
}

impl OverlayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an overlay spawned at `now`
    pub fn spawn(&mut self, overlay: Overlay, now: f64) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.active.push(ActiveOverlay {
            id,
            overlay,
            expires_at: now + overlay.duration_ms,
        });
        id
    }

    /// Remove and return overlays whose animation has completed
    pub fn expire(&mut self, now: f64) -> Vec<OverlayId> {
        let mut expired = Vec::new();
        self.active.retain(|a| {
            if a.expires_at <= now {
                expired.push(a.id);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveOverlay> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlays_expire_after_duration() {
        let mut tracker = OverlayTracker::new();
        let flash = Overlay::new(OverlayKind::Flash { diameter: 80.0 }, Vec2::ZERO, [1.0; 3], 200.0);
        let ring = Overlay::new(OverlayKind::Ring { diameter: 90.0 }, Vec2::ZERO, [1.0; 3], 500.0);
        let a = tracker.spawn(flash, 0.0);
        let b = tracker.spawn(ring, 100.0);

        assert!(tracker.expire(199.0).is_empty());
        assert_eq!(tracker.expire(200.0), vec![a]);
        assert_eq!(tracker.expire(600.0), vec![b]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_css_color() {
        let o = Overlay::new(OverlayKind::Tint, Vec2::ZERO, [1.0, 0.5, 0.0], 1.0);
        assert_eq!(o.css_color(), "rgb(255, 128, 0)");
    }

    #[test]
    fn test_shake_class_by_intensity() {
        assert_eq!(OverlayKind::Shake { intensity: 0.3 }.css_class(), "fx-shake");
        assert_eq!(OverlayKind::Shake { intensity: 1.0 }.css_class(), "fx-shake-heavy");
        assert_eq!(OverlayKind::Tint.diameter(), None);
    }
}
