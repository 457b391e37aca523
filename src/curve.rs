use crate::error::Error;
use crate::math;
use crate::orientation::Orientation;

use nalgebra as na;

/// Side of the curve a point falls on.
///
/// `Neutral` covers points on the curve itself or inside the gray zone; the
/// crossing logic treats it as an abstention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Negative,
    Neutral,
    Positive,
}

impl Side {
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Side::Negative => -1,
            Side::Neutral => 0,
            Side::Positive => 1,
        }
    }

    #[inline]
    pub fn is_neutral(self) -> bool {
        self == Side::Neutral
    }

    /// Applies a resolved orientation multiplier.
    #[inline]
    pub fn oriented(self, orientation: Orientation) -> Side {
        match (self, orientation) {
            (side, Orientation::Positive) => side,
            (Side::Positive, Orientation::Negative) => Side::Negative,
            (Side::Negative, Orientation::Negative) => Side::Positive,
            (Side::Neutral, Orientation::Negative) => Side::Neutral,
        }
    }
}

/// Open polyline the objects are counted against. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCurve {
    points: Vec<na::Point2<f32>>,
}

impl BoundaryCurve {
    pub fn new(points: Vec<na::Point2<f32>>) -> Result<Self, Error> {
        if points.len() < 2 {
            return Err(Error::Geometry(format!(
                "boundary curve needs at least 2 points, got {}",
                points.len()
            )));
        }

        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(Error::Geometry(
                "boundary curve contains a non-finite coordinate".into(),
            ));
        }

        Ok(Self { points })
    }

    pub fn from_pairs(pairs: &[[f32; 2]]) -> Result<Self, Error> {
        Self::new(pairs.iter().map(|&[x, y]| na::Point2::new(x, y)).collect())
    }

    #[inline]
    pub fn points(&self) -> &[na::Point2<f32>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn first(&self) -> na::Point2<f32> {
        self.points[0]
    }

    #[inline]
    pub fn last(&self) -> na::Point2<f32> {
        self.points[self.points.len() - 1]
    }

    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = (na::Point2<f32>, na::Point2<f32>)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Distance to the nearest segment, signed by the side of that segment.
    ///
    /// A point with a positive cross product against the segment direction
    /// gets sign -1, everything else +1. For the horizontal curve
    /// `(0,0) -> (100,0)` in image coordinates, points above the line (smaller
    /// y) are positive and points below are negative.
    pub fn signed_distance(&self, point: na::Point2<f32>) -> f32 {
        let mut min_dist = f32::INFINITY;
        let mut sign = 1.0;

        for (a, b) in self.segments() {
            let (proj, _) = math::project_onto_segment(point, a, b);
            let dist = na::distance(&point, &proj);

            if dist < min_dist {
                min_dist = dist;
                sign = if math::cross(b - a, point - a) > 0.0 {
                    -1.0
                } else {
                    1.0
                };
            }
        }

        min_dist * sign
    }

    /// Side of the curve, with `|distance| < gray_zone_width` reported as `Neutral`.
    ///
    /// A point lying exactly on the curve is always `Neutral`.
    pub fn classify_side(&self, point: na::Point2<f32>, gray_zone_width: f32) -> Side {
        let d = self.signed_distance(point);

        if d == 0.0 || d.abs() < gray_zone_width {
            Side::Neutral
        } else if d > 0.0 {
            Side::Positive
        } else {
            Side::Negative
        }
    }

    /// Oriented side of every point of a path, without a gray zone.
    /// `Negative` is the IN side.
    pub fn label_path(&self, points: &[na::Point2<f32>], orientation: Orientation) -> Vec<Side> {
        points
            .iter()
            .map(|p| self.classify_side(*p, 0.0).oriented(orientation))
            .collect()
    }

    /// Whether the straight path `prev -> cur` intersects any curve segment.
    pub fn crosses_path(&self, prev: na::Point2<f32>, cur: na::Point2<f32>) -> bool {
        self.segments()
            .any(|(a, b)| math::segments_intersect(prev, cur, a, b))
    }
}
