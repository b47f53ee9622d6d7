// ACP speed/distance table and the per-segment elapsed time arithmetic.
// Rows are indexed by segment; row 0 is the start line and carries no speed.

use serde::{Deserialize, Serialize};

/// Which speed column drives a calculation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpeedBound {
    /// Slowest legal average; gives control close times.
    Minimum,
    /// Fastest legal average; gives control open times.
    Maximum,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct Segment {
    /// Cumulative distance at which this segment ends.
    pub boundary_km: f64,
    pub length_km: f64,
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
}

impl Segment {
    const fn new(boundary_km: f64, length_km: f64, min_speed_kmh: f64, max_speed_kmh: f64) -> Self {
        Self {
            boundary_km,
            length_km,
            min_speed_kmh,
            max_speed_kmh,
        }
    }

    pub fn speed(&self, bound: SpeedBound) -> f64 {
        match bound {
            SpeedBound::Minimum => self.min_speed_kmh,
            SpeedBound::Maximum => self.max_speed_kmh,
        }
    }
}

pub const SEGMENTS: [Segment; 6] = [
    Segment::new(0.0, 0.0, 0.0, 0.0),
    Segment::new(200.0, 200.0, 15.0, 34.0),
    Segment::new(400.0, 200.0, 15.0, 32.0),
    Segment::new(600.0, 200.0, 15.0, 30.0),
    Segment::new(1000.0, 400.0, 11.428, 28.0),
    Segment::new(1300.0, 300.0, 13.333, 26.0),
];

/// Number of boundaries strictly below `distance_km`.
///
/// A distance sitting exactly on a boundary belongs to the segment that ends
/// there, so `segment_index(200.0) == 1` while `segment_index(200.5) == 2`.
/// Distances past the last boundary return `SEGMENTS.len()`.
pub fn segment_index(distance_km: f64) -> usize {
    SEGMENTS
        .iter()
        .filter(|segment| distance_km > segment.boundary_km)
        .count()
}

/// Hours needed to cover `distance_km` at the selected speed bound.
///
/// Every fully traversed segment contributes `length / speed`; the segment the
/// distance falls in contributes the remainder at its own speed. Distances
/// beyond the final boundary keep using the final segment's speed.
pub fn elapsed_hours(distance_km: f64, bound: SpeedBound) -> f64 {
    let index = segment_index(distance_km).min(SEGMENTS.len() - 1);
    let current = &SEGMENTS[index];
    let speed = current.speed(bound);
    if speed == 0.0 {
        // sentinel row: at or before the start line
        return 0.0;
    }

    let full: f64 = SEGMENTS
        .iter()
        .take(index)
        .skip(1)
        .map(|segment| segment.length_km / segment.speed(bound))
        .sum();
    let partial = (distance_km - SEGMENTS[index - 1].boundary_km) / speed;
    full + partial
}
