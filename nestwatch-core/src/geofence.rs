//! Circular no-fly-zone evaluation.
//!
//! Pure predicate — no state, no side effects. The zone boundary itself is
//! excluded: a position at exactly `radius` from the center is legal.

use crate::types::Point;

/// Nest coordinates in feed units.
pub const NEST_X: f64 = 250_000.0;
pub const NEST_Y: f64 = 250_000.0;

/// No-fly radius around the nest, same units as feed positions.
pub const NO_FLY_RADIUS: f64 = 100_000.0;

/// Open disk centered on a protected point.
#[derive(Debug, Clone, Copy)]
pub struct NoFlyZone {
    pub center: Point,
    pub radius: f64,
}

impl NoFlyZone {
    pub fn new(center: Point, radius: f64) -> Self {
        NoFlyZone { center, radius }
    }

    /// Euclidean distance from a position to the zone center.
    pub fn distance_to_center(&self, position: Point) -> f64 {
        position.distance_to(self.center)
    }

    /// True iff the position is strictly inside the zone.
    pub fn is_violation(&self, position: Point) -> bool {
        self.distance_to_center(position) < self.radius
    }
}

impl Default for NoFlyZone {
    fn default() -> Self {
        NoFlyZone::new(Point::new(NEST_X, NEST_Y), NO_FLY_RADIUS)
    }
}
