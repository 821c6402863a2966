//! Polygon ring simplification.
//!
//! Removes vertices that would otherwise produce degenerate geometry further
//! down the pipeline: neighbours closer than a distance tolerance are merged,
//! then vertices whose corner is nearly straight or nearly folded back are
//! dropped. Both passes run until the ring stops changing, so simplifying a
//! simplified ring is a no-op.

use crate::{Error, Result};
use glam::Vec2;

/// Configuration for polygon simplification
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SimplificationConfig {
    /// A corner is removed when the absolute cosine of its angle exceeds this value
    pub angle_tolerance_cos: f32,
    /// Neighbouring points closer than this are merged
    pub distance_tolerance: f32,
}

impl Default for SimplificationConfig {
    fn default() -> Self {
        Self {
            angle_tolerance_cos: 0.996_194_7, // 5 degrees
            distance_tolerance: 0.01,
        }
    }
}

impl SimplificationConfig {
    pub fn new(angle_tolerance_cos: f32, distance_tolerance: f32) -> Self {
        Self {
            angle_tolerance_cos,
            distance_tolerance,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.angle_tolerance_cos > 0.0 && self.angle_tolerance_cos <= 1.0) {
            return Err(Error::InvalidConfig(
                "angle tolerance cosine must be in (0, 1]".to_string(),
            ));
        }
        if !(self.distance_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(
                "distance tolerance must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics from a simplification
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimplificationStats {
    pub original_points: usize,
    pub final_points: usize,
    /// Points merged into a neighbour
    pub merged_points: usize,
    /// Points removed because of a flat or folded corner
    pub flat_corners_removed: usize,
}

/// Simplifies closed polygon rings
#[derive(Debug, Clone, Default)]
pub struct PolygonSimplifier {
    config: SimplificationConfig,
}

impl PolygonSimplifier {
    pub fn new(config: SimplificationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimplificationConfig {
        &self.config
    }

    /// Simplifies a ring, preserving the order of the surviving points.
    ///
    /// Returns an empty ring when fewer than three points survive.
    pub fn simplify(&self, points: &[Vec2]) -> Vec<Vec2> {
        self.simplify_with_stats(points).0
    }

    pub fn simplify_with_stats(&self, points: &[Vec2]) -> (Vec<Vec2>, SimplificationStats) {
        let mut stats = SimplificationStats {
            original_points: points.len(),
            ..Default::default()
        };

        let mut ring = points.to_vec();
        loop {
            let merged = self.merge_close_points(&mut ring);
            let removed = self.remove_flat_corners(&mut ring);
            stats.merged_points += merged;
            stats.flat_corners_removed += removed;

            if ring.len() < 3 {
                ring.clear();
                break;
            }
            if merged == 0 && removed == 0 {
                break;
            }
        }

        stats.final_points = ring.len();
        (ring, stats)
    }

    /// Drops every point too close to the previous kept point, including the
    /// wrap-around pair formed by the last and first points.
    fn merge_close_points(&self, ring: &mut Vec<Vec2>) -> usize {
        let tolerance_sq = self.config.distance_tolerance * self.config.distance_tolerance;
        let original_len = ring.len();

        let mut kept: Vec<Vec2> = Vec::with_capacity(ring.len());
        for &point in ring.iter() {
            match kept.last() {
                Some(last) if last.distance_squared(point) < tolerance_sq => {}
                _ => kept.push(point),
            }
        }
        while kept.len() > 1 && kept[kept.len() - 1].distance_squared(kept[0]) < tolerance_sq {
            kept.remove(0);
        }

        *ring = kept;
        original_len - ring.len()
    }

    fn remove_flat_corners(&self, ring: &mut Vec<Vec2>) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while ring.len() >= 3 && i < ring.len() {
            let n = ring.len();
            let prev = ring[(i + n - 1) % n];
            let current = ring[i];
            let next = ring[(i + 1) % n];

            if self.is_flat_corner(prev, current, next) {
                ring.remove(i);
                removed += 1;
                // the previous corner changed shape, look at it again
                i = i.saturating_sub(1);
            } else {
                i += 1;
            }
        }
        removed
    }

    fn is_flat_corner(&self, prev: Vec2, current: Vec2, next: Vec2) -> bool {
        let to_prev = (prev - current).normalize_or_zero();
        let to_next = (next - current).normalize_or_zero();
        if to_prev == Vec2::ZERO || to_next == Vec2::ZERO {
            return true;
        }
        to_prev.dot(to_next).abs() > self.config.angle_tolerance_cos
    }
}
