use crate::curve::BoundaryCurve;
use crate::error::Error;
use crate::math;
use crate::orientation::Orientation;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TANGENT_EPSILON: f32 = 1e-6;

/// Which way "IN" points relative to the camera.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InDirection {
    #[default]
    Auto,
    TowardCam,
    AwayFromCam,
    Left,
    Right,
}

impl InDirection {
    /// Orientation that makes the axis-extension region the IN side.
    ///
    /// The midpoint of the two extension points is classified against the
    /// curve and that side becomes the oriented-negative (IN) side, so the
    /// result follows the order the curve was drawn in. Without a frame size
    /// the far edges are derived from the curve's own extent. `None` for `Auto`.
    pub fn orientation_for(
        self,
        curve: &BoundaryCurve,
        frame_size: Option<(u32, u32)>,
    ) -> Option<Orientation> {
        let (width, height) = match frame_size {
            Some((w, h)) => (w as f32, h as f32),
            None => curve_extent(curve),
        };

        let [a, b] = extension(curve, self, width, height)?;
        let d = curve.signed_distance(na::center(&a, &b));

        if d > 0.0 {
            Some(Orientation::Negative)
        } else if d < 0.0 {
            Some(Orientation::Positive)
        } else {
            self.nominal_orientation()
        }
    }

    // camera-relative convention, used when the extension midpoint is on the curve
    fn nominal_orientation(self) -> Option<Orientation> {
        match self {
            InDirection::Auto => None,
            InDirection::TowardCam | InDirection::Left | InDirection::Right => {
                Some(Orientation::Positive)
            }
            InDirection::AwayFromCam => Some(Orientation::Negative),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InDirection::Auto => "auto",
            InDirection::TowardCam => "toward_cam",
            InDirection::AwayFromCam => "away_from_cam",
            InDirection::Left => "left",
            InDirection::Right => "right",
        }
    }
}

impl fmt::Display for InDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(InDirection::Auto),
            "toward_cam" => Ok(InDirection::TowardCam),
            "away_from_cam" => Ok(InDirection::AwayFromCam),
            "left" => Ok(InDirection::Left),
            "right" => Ok(InDirection::Right),
            other => Err(Error::Configuration(format!(
                "unknown IN_direction: {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionStrategy {
    /// Extend both endpoints to the frame edge in the given direction.
    AxisExtension(InDirection),
    /// Offset the curve along its normals; `None` builds a symmetric band.
    NormalOffset(Option<Orientation>),
}

/// How a cached inside region was built, persisted next to its polygon.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegionDiagnostics {
    pub method: String,
    pub region_depth: f32,
    pub num_points: usize,
    pub status: String,
}

/// Closed polygon interpreted as the "inside" of the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct InsideRegion {
    points: Vec<na::Point2<f32>>,
    strategy: RegionStrategy,
    depth: f32,
}

impl InsideRegion {
    #[inline]
    pub fn points(&self) -> &[na::Point2<f32>] {
        &self.points
    }

    #[inline]
    pub fn strategy(&self) -> RegionStrategy {
        self.strategy
    }

    /// Depth the region was requested with; unused by axis extension.
    #[inline]
    pub fn depth(&self) -> f32 {
        self.depth
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
    pub fn contains(&self, p: na::Point2<f32>) -> bool {
        math::in_polygon(p, &self.points)
    }

    pub fn to_pairs(&self) -> Vec<[f32; 2]> {
        self.points.iter().map(|p| [p.x, p.y]).collect()
    }

    pub fn diagnostics(&self) -> RegionDiagnostics {
        let (method, status) = match self.strategy {
            RegionStrategy::AxisExtension(direction) => {
                ("axis_extension", format!("ok ({})", direction))
            }
            RegionStrategy::NormalOffset(None) => ("normal_offset", "ok (symmetric)".to_string()),
            RegionStrategy::NormalOffset(Some(o)) => {
                ("normal_offset", format!("ok (orientation={:+})", o.sign()))
            }
        };

        RegionDiagnostics {
            method: method.to_string(),
            region_depth: self.depth,
            num_points: self.points.len(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBuilder {
    strategy: RegionStrategy,
    clip: bool,
}

impl RegionBuilder {
    pub fn new(strategy: RegionStrategy) -> Self {
        Self {
            strategy,
            clip: false,
        }
    }
}

/// The two points closing the polygon, last endpoint's first; `None` for `Auto`.
fn extension(
    curve: &BoundaryCurve,
    direction: InDirection,
    width: f32,
    height: f32,
) -> Option<[na::Point2<f32>; 2]> {
    let first = curve.first();
    let last = curve.last();

    // Walks back from the last endpoint so the polygon does not self-intersect.
    let points = match direction {
        InDirection::TowardCam => [
            na::Point2::new(last.x, height),
            na::Point2::new(first.x, height),
        ],
        InDirection::AwayFromCam => [na::Point2::new(last.x, 0.0), na::Point2::new(first.x, 0.0)],
        InDirection::Left => [na::Point2::new(0.0, last.y), na::Point2::new(0.0, first.y)],
        InDirection::Right => [na::Point2::new(width, last.y), na::Point2::new(width, first.y)],
        InDirection::Auto => return None,
    };

    Some(points)
}

/// Stand-in frame size reaching past the curve by its own extent.
fn curve_extent(curve: &BoundaryCurve) -> (f32, f32) {
    let (max_x, max_y) = curve
        .points()
        .iter()
        .fold((0.0f32, 0.0f32), |(x, y), p| (x.max(p.x), y.max(p.y)));
    let span = max_x.max(max_y).max(1.0);

    (max_x + span, max_y + span)
}

fn axis_extension(
    curve: &BoundaryCurve,
    direction: InDirection,
    (width, height): (u32, u32),
) -> Result<Vec<na::Point2<f32>>, Error> {
    let [to_last, to_first] = extension(curve, direction, width as f32, height as f32)
        .ok_or_else(|| {
            Error::Configuration("axis extension needs an explicit IN_direction, got auto".into())
        })?;

    let mut points = curve.points().to_vec();

    // An endpoint already on the edge needs no extension point.
    if to_last != curve.last() {
        points.push(to_last);
    }
    if to_first != curve.first() {
        points.push(to_first);
    }

    Ok(points)
}

/// Unit tangents by central differences, one-sided at the endpoints.
/// Degenerate spots borrow the closest valid tangent.
fn tangents(points: &[na::Point2<f32>]) -> Vec<na::Vector2<f32>> {
    let n = points.len();
    let raw: Vec<Option<na::Vector2<f32>>> = (0..n)
        .map(|i| {
            let (a, b) = if i == 0 {
                (points[0], points[1])
            } else if i == n - 1 {
                (points[n - 2], points[n - 1])
            } else {
                (points[i - 1], points[i + 1])
            };

            na::Unit::try_new(b - a, TANGENT_EPSILON).map(|u| u.into_inner())
        })
        .collect();

    let fallback = raw
        .iter()
        .flatten()
        .next()
        .copied()
        .unwrap_or_else(|| na::Vector2::new(1.0, 0.0));

    let mut prev = fallback;
    raw.into_iter()
        .map(|t| {
            let t = t.unwrap_or(prev);
            prev = t;
            t
        })
        .collect()
}

fn normal_offset(
    curve: &BoundaryCurve,
    orientation: Option<Orientation>,
    depth: f32,
) -> Vec<na::Point2<f32>> {
    let points = curve.points();

    // Left-hand normal in image coordinates; it points at the side where
    // `signed_distance` is negative.
    let normals: Vec<na::Vector2<f32>> = tangents(points)
        .into_iter()
        .map(|t| na::Vector2::new(-t.y, t.x))
        .collect();

    let offset = |sign: f32| -> Vec<na::Point2<f32>> {
        points
            .iter()
            .zip(&normals)
            .map(|(p, n)| p + n * (sign * depth))
            .collect()
    };

    let (near, far) = match orientation {
        Some(o) => (points.to_vec(), offset(o.as_f32())),
        None => (offset(1.0), offset(-1.0)),
    };

    near.into_iter().chain(far.into_iter().rev()).collect()
}

fn clip_to_frame(points: &mut [na::Point2<f32>], (width, height): (u32, u32)) {
    let max_x = (width as f32 - 1.0).max(0.0);
    let max_y = (height as f32 - 1.0).max(0.0);

    for p in points.iter_mut() {
        p.x = p.x.clamp(0.0, max_x);
        p.y = p.y.clamp(0.0, max_y);
    }
}
