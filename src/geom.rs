//! Geometry primitives shared across the plotting engine.
//!
//! World positions are `glam::DVec3`; screen positions are plain f32 pixel
//! pairs. The screen-space predicates (`point_segment_distance`,
//! `point_in_ring`) back the hit-testing in [`crate::scene::MemoryScene`].

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A position in world coordinates.
pub type WorldPos = DVec3;

/// Screen (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another screen position, in pixels.
    pub fn distance(self, other: ScreenPos) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Linear interpolation between two world positions.
#[inline]
pub fn lerp_point(a: WorldPos, b: WorldPos, t: f64) -> WorldPos {
    a + (b - a) * t
}

/// Pairwise linear interpolation between two position lists.
///
/// The result has `next.len()` entries. Indices beyond `prev`'s length pass
/// through unmodified from `next` (a capture in progress grows the list one
/// point at a time, so the newer sample may be longer).
pub fn lerp_points(prev: &[WorldPos], next: &[WorldPos], t: f64) -> Vec<WorldPos> {
    next.iter()
        .enumerate()
        .map(|(i, n)| match prev.get(i) {
            Some(p) => lerp_point(*p, *n, t),
            None => *n,
        })
        .collect()
}

/// Midpoints between adjacent position pairs.
///
/// With `closed` the last→first pair is included, so the result has as many
/// entries as `positions`; otherwise one fewer. Fewer than two positions
/// yield no midpoints.
pub fn midpoints(positions: &[WorldPos], closed: bool) -> Vec<WorldPos> {
    if positions.len() < 2 {
        return Vec::new();
    }
    let mut out: Vec<WorldPos> = positions
        .windows(2)
        .map(|w| (w[0] + w[1]) * 0.5)
        .collect();
    if closed {
        let first = positions[0];
        let last = positions[positions.len() - 1];
        out.push((last + first) * 0.5);
    }
    out
}

/// Arithmetic centroid of a position list. `None` when empty.
pub fn centroid(positions: &[WorldPos]) -> Option<WorldPos> {
    if positions.is_empty() {
        return None;
    }
    let sum: WorldPos = positions.iter().copied().sum();
    Some(sum / positions.len() as f64)
}

/// Rotate a direction vector around the Z axis by `heading` radians.
///
/// Used to express keyboard nudges relative to the camera heading.
pub fn rotate_heading(dir: WorldPos, heading: f64) -> WorldPos {
    let (sin, cos) = heading.sin_cos();
    WorldPos::new(dir.x * cos - dir.y * sin, dir.x * sin + dir.y * cos, dir.z)
}

/// Distance from a point to a segment, in screen space.
pub fn point_segment_distance(p: ScreenPos, a: ScreenPos, b: ScreenPos) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(ScreenPos::new(a.x + abx * t, a.y + aby * t))
}

/// Even-odd point-in-polygon test over a screen-space ring.
///
/// The ring does not need an explicit closing vertex; the last→first edge is
/// always considered.
pub fn point_in_ring(p: ScreenPos, ring: &[ScreenPos]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if ((a.y > p.y) != (b.y > p.y))
            && (p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
