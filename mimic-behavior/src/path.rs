//! Pointer trajectories along randomized cubic Bézier curves.

use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Fewest samples in a path, used for short hops.
pub const MIN_PATH_STEPS: usize = 10;
/// Most samples in a path, used for long sweeps.
pub const MAX_PATH_STEPS: usize = 100;
/// Pixels of straight-line distance per sample.
const PIXELS_PER_STEP: f64 = 10.0;

/// A 2D coordinate in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Number of samples for a move covering `distance` pixels.
pub fn path_steps(distance: f64) -> usize {
    let raw = (distance / PIXELS_PER_STEP).round();
    if raw.is_nan() {
        return MIN_PATH_STEPS;
    }
    (raw as usize).clamp(MIN_PATH_STEPS, MAX_PATH_STEPS)
}

/// Sample a curved trajectory from `start` to `end`.
///
/// The two interior control points are drawn independently per axis along
/// the start→end segment, which bends the curve asymmetrically. The last
/// sample is exactly `end`.
pub fn generate_path(start: Point, end: Point, rng: &mut dyn RandomSource) -> Vec<Point> {
    let c1 = control_point(start, end, rng);
    let c2 = control_point(start, end, rng);

    let steps = path_steps(start.distance_to(end));
    let mut points: Vec<Point> = (0..steps)
        .map(|i| {
            let t = i as f64 / (steps - 1) as f64;
            cubic_bezier(start, c1, c2, end, t)
        })
        .collect();

    if let Some(last) = points.last_mut() {
        *last = end;
    }
    points
}

fn control_point(start: Point, end: Point, rng: &mut dyn RandomSource) -> Point {
    let ux = rng.next_unit();
    let uy = rng.next_unit();
    Point::new(
        start.x + (end.x - start.x) * ux,
        start.y + (end.y - start.y) * uy,
    )
}

fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}
