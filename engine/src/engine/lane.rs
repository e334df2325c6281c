// engine/src/engine/lane.rs
#![forbid(unsafe_code)]

use crate::engine::constants::{DEFAULT_LANE_WIDTH, DEFAULT_ROAD_LENGTH, DEFAULT_ROAD_START};

/// World position `[x, y]`: x runs along the road, y across it.
pub type Position = [f64; 2];

/**
 * A straight lane running along the x axis.
 *
 * Lane `i` is centred on `y = i * width`, so higher indices sit further right
 * in the driving direction. It spans `x` in `[start, start + length]`.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    pub index: usize,
    pub width: f64,
    pub start: f64,
    pub length: f64,
    pub center_y: f64,
    /// A forbidden lane is never reachable (e.g. closed for works).
    pub forbidden: bool,
}

impl Lane {
    pub fn new(index: usize, width: f64) -> Self {
        Self {
            index,
            width,
            start: DEFAULT_ROAD_START,
            length: DEFAULT_ROAD_LENGTH,
            center_y: index as f64 * width,
            forbidden: false,
        }
    }

    /// Build `count` adjacent lanes (at least one).
    pub fn straight_road(count: usize, width: f64) -> Vec<Lane> {
        let width = if width > 0.0 { width } else { DEFAULT_LANE_WIDTH };
        (0..count.max(1)).map(|i| Lane::new(i, width)).collect()
    }

    /// Returns (longitudinal, lateral) coordinates of `position` in the lane frame.
    #[inline]
    pub fn local_coordinates(&self, position: Position) -> (f64, f64) {
        (position[0], position[1] - self.center_y)
    }

    #[inline]
    pub fn position(&self, longitudinal: f64, lateral: f64) -> Position {
        [longitudinal, self.center_y + lateral]
    }

    #[inline]
    pub fn heading_at(&self, _longitudinal: f64) -> f64 {
        0.0
    }

    #[inline]
    fn spans(&self, longitudinal: f64) -> bool {
        (self.start..=self.start + self.length).contains(&longitudinal)
    }

    /// Whether a vehicle at `position` may move into this lane.
    pub fn is_reachable_from(&self, position: Position) -> bool {
        if self.forbidden {
            return false;
        }
        let (s, r) = self.local_coordinates(position);
        r.abs() <= 2.0 * self.width && self.spans(s)
    }

    #[inline]
    pub fn distance(&self, position: Position) -> f64 {
        self.local_coordinates(position).1.abs()
    }
}

/// Index of the lane whose centre line is closest to `position`.
pub fn closest_lane_index(lanes: &[Lane], position: Position) -> usize {
    let mut best = 0usize;
    let mut best_d = f64::INFINITY;
    for lane in lanes {
        let d = lane.distance(position);
        if d < best_d {
            best_d = d;
            best = lane.index;
        }
    }
    best
}
