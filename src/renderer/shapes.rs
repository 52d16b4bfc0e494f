//! Shape generation for 2D primitives
//!
//! Everything is emitted as a plain triangle list.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

use super::vertex::Vertex;

/// Push one quad as two triangles
fn quad(out: &mut Vec<Vertex>, corners: [Vec2; 4], colors: [[f32; 4]; 4]) {
    let [a, b, c, d] = corners;
    let [ca, cb, cc, cd] = colors;
    out.push(Vertex::new(a.x, a.y, ca));
    out.push(Vertex::new(b.x, b.y, cb));
    out.push(Vertex::new(c.x, c.y, cc));

    out.push(Vertex::new(c.x, c.y, cc));
    out.push(Vertex::new(b.x, b.y, cb));
    out.push(Vertex::new(d.x, d.y, cd));
}

/// Tapered band from `p1` to `p2`
pub fn segment(
    out: &mut Vec<Vertex>,
    p1: Vec2,
    p2: Vec2,
    width1: f32,
    width2: f32,
    color1: [f32; 4],
    color2: [f32; 4],
) {
    let dir = (p2 - p1).normalize_or_zero();
    let perp = dir.perp();
    quad(
        out,
        [
            p1 + perp * width1,
            p1 - perp * width1,
            p2 + perp * width2,
            p2 - perp * width2,
        ],
        [color1, color1, color2, color2],
    );
}

/// Filled circle
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4], segments: u32) {
    radial_fan(out, center, radius, color, color, segments);
}

/// Soft halo: opaque-ish center fading to transparent at `radius`
pub fn glow(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4], segments: u32) {
    let edge = [color[0], color[1], color[2], 0.0];
    radial_fan(out, center, radius, color, edge, segments);
}

fn radial_fan(
    out: &mut Vec<Vertex>,
    center: Vec2,
    radius: f32,
    inner: [f32; 4],
    outer: [f32; 4],
    segments: u32,
) {
    let segments = segments.max(3);
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        // Triangle from center to edge
        out.push(Vertex::new(center.x, center.y, inner));
        out.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            outer,
        ));
        out.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            outer,
        ));
    }
}

/// Ring (hollow circle)
pub fn ring(
    out: &mut Vec<Vertex>,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) {
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;
        let (d1, d2) = (Vec2::from_angle(theta1), Vec2::from_angle(theta2));

        quad(
            out,
            [
                center + d1 * inner_radius,
                center + d1 * outer_radius,
                center + d2 * inner_radius,
                center + d2 * outer_radius,
            ],
            [color; 4],
        );
    }
}

/// Five-point star
pub fn star(out: &mut Vec<Vertex>, center: Vec2, radius: f32, rotation: f32, color: [f32; 4]) {
    const POINTS: u32 = 5;
    let inner = radius * 0.45;
    for i in 0..POINTS * 2 {
        let r1 = if i % 2 == 0 { radius } else { inner };
        let r2 = if i % 2 == 0 { inner } else { radius };
        let a1 = rotation + i as f32 * PI / POINTS as f32;
        let a2 = rotation + (i + 1) as f32 * PI / POINTS as f32;
        let p1 = center + Vec2::from_angle(a1) * r1;
        let p2 = center + Vec2::from_angle(a2) * r2;
        out.push(Vertex::new(center.x, center.y, color));
        out.push(Vertex::new(p1.x, p1.y, color));
        out.push(Vertex::new(p2.x, p2.y, color));
    }
}

/// Line stretched along `vel`, fading toward the tail
pub fn streak(out: &mut Vec<Vertex>, head: Vec2, vel: Vec2, width: f32, color: [f32; 4]) {
    let length = (vel.length() * 3.0).max(width * 2.0);
    let tail = head - vel.normalize_or(Vec2::X) * length;
    let faded = [color[0], color[1], color[2], 0.0];
    segment(out, tail, head, width * 0.3, width, faded, color);
}

/// Trail behind a comet head, newest point first
pub fn comet_trail(out: &mut Vec<Vertex>, head: Vec2, trail: &[Vec2], width: f32, color: [f32; 4]) {
    if trail.is_empty() {
        return;
    }
    let len = trail.len() as f32 + 1.0;
    let mut prev = head;
    for (i, point) in trail.iter().enumerate() {
        let t1 = i as f32 / len;
        let t2 = (i + 1) as f32 / len;
        let c1 = [color[0], color[1], color[2], color[3] * (1.0 - t1) * 0.8];
        let c2 = [color[0], color[1], color[2], color[3] * (1.0 - t2) * 0.8];
        segment(out, prev, *point, width * (1.0 - t1 * 0.7), width * (1.0 - t2 * 0.7), c1, c2);
        prev = *point;
    }
}

/// Four-point cross of thin tapered arms
pub fn cross(out: &mut Vec<Vertex>, center: Vec2, radius: f32, rotation: f32, color: [f32; 4]) {
    let tip = [color[0], color[1], color[2], 0.0];
    for i in 0..4 {
        let dir = Vec2::from_angle(rotation + i as f32 * PI * 0.5);
        segment(out, center, center + dir * radius, radius * 0.18, 0.0, color, tip);
    }
}

/// Jagged three-segment lightning bolt oriented by `rotation`
pub fn bolt(out: &mut Vec<Vertex>, center: Vec2, radius: f32, rotation: f32, color: [f32; 4]) {
    let axis = Vec2::from_angle(rotation);
    let side = axis.perp();
    let points = [
        center - axis * radius,
        center - axis * radius * 0.2 + side * radius * 0.35,
        center + axis * radius * 0.2 - side * radius * 0.35,
        center + axis * radius,
    ];
    let width = (radius * 0.12).max(0.6);
    for pair in points.windows(2) {
        segment(out, pair[0], pair[1], width, width, color, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_lists() {
        let mut out = Vec::new();
        circle(&mut out, Vec2::ZERO, 4.0, [1.0; 4], 12);
        assert_eq!(out.len(), 36);

        out.clear();
        ring(&mut out, Vec2::ZERO, 2.0, 3.0, [1.0; 4], 8);
        assert_eq!(out.len(), 48);

        out.clear();
        star(&mut out, Vec2::ZERO, 5.0, 0.0, [1.0; 4]);
        assert_eq!(out.len(), 30);

        out.clear();
        cross(&mut out, Vec2::ZERO, 5.0, 0.0, [1.0; 4]);
        bolt(&mut out, Vec2::ZERO, 5.0, 0.0, [1.0; 4]);
        assert_eq!(out.len() % 3, 0);
    }

    #[test]
    fn test_glow_fades_to_transparent() {
        let mut out = Vec::new();
        glow(&mut out, Vec2::ZERO, 10.0, [1.0, 0.5, 0.2, 0.8], 6);
        assert_eq!(out[0].color[3], 0.8);
        assert_eq!(out[1].color[3], 0.0);
    }

    #[test]
    fn test_comet_trail_fades() {
        let mut out = Vec::new();
        let trail = [Vec2::new(-1.0, 0.0), Vec2::new(-2.0, 0.0), Vec2::new(-3.0, 0.0)];
        comet_trail(&mut out, Vec2::ZERO, &trail, 2.0, [1.0; 4]);
        assert_eq!(out.len(), trail.len() * 6);
        let first = out[0].color[3];
        let last = out[out.len() - 1].color[3];
        assert!(first > last);

        out.clear();
        comet_trail(&mut out, Vec2::ZERO, &[], 2.0, [1.0; 4]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_star_points_reach_radius() {
        let mut out = Vec::new();
        star(&mut out, Vec2::ZERO, 5.0, 0.0, [1.0; 4]);
        let max = out
            .iter()
            .map(|v| Vec2::from(v.position).length())
            .fold(0.0f32, f32::max);
        assert!((max - 5.0).abs() < 1e-4);
    }
}
