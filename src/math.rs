use nalgebra as na;

// cross-product tolerance for pixel-scale f32 coordinates
const COLLINEAR_EPSILON: f32 = 1e-4;

/// z-component of the 2D cross product `a x b`.
#[inline]
pub fn cross(a: na::Vector2<f32>, b: na::Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Projects `p` onto the segment `[a, b]`, returning the projection and its
/// parameter `t` in `[0, 1]`. A degenerate segment projects onto `a`.
#[inline]
pub fn project_onto_segment(
    p: na::Point2<f32>,
    a: na::Point2<f32>,
    b: na::Point2<f32>,
) -> (na::Point2<f32>, f32) {
    let ab = b - a;
    let len2 = ab.norm_squared();

    if len2 == 0.0 {
        return (a, 0.0);
    }

    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);

    (a + ab * t, t)
}

#[inline]
fn orient(a: na::Point2<f32>, b: na::Point2<f32>, c: na::Point2<f32>) -> f32 {
    cross(b - a, c - a)
}

#[inline]
fn within_box(a: na::Point2<f32>, b: na::Point2<f32>, c: na::Point2<f32>) -> bool {
    a.x.min(c.x) <= b.x && b.x <= a.x.max(c.x) && a.y.min(c.y) <= b.y && b.y <= a.y.max(c.y)
}

/// Segment intersection test, touching and collinear overlaps included.
pub fn segments_intersect(
    p1: na::Point2<f32>,
    p2: na::Point2<f32>,
    q1: na::Point2<f32>,
    q2: na::Point2<f32>,
) -> bool {
    let o1 = orient(p1, p2, q1);
    let o2 = orient(p1, p2, q2);
    let o3 = orient(q1, q2, p1);
    let o4 = orient(q1, q2, p2);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    (o1.abs() < COLLINEAR_EPSILON && within_box(p1, q1, p2))
        || (o2.abs() < COLLINEAR_EPSILON && within_box(p1, q2, p2))
        || (o3.abs() < COLLINEAR_EPSILON && within_box(q1, p1, q2))
        || (o4.abs() < COLLINEAR_EPSILON && within_box(q1, p2, q2))
}

/// Even-odd point-in-polygon test. The polygon is implicitly closed.
pub fn in_polygon(p: na::Point2<f32>, poly: &[na::Point2<f32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = poly[0];
    let mut xints = 0.0;

    for i in 1..=n {
        let p2 = poly[i % n];

        if p.y > f32::min(p1.y, p2.y) && p.y <= f32::max(p1.y, p2.y) && p.x <= f32::max(p1.x, p2.x)
        {
            if (p1.y - p2.y).abs() > f32::EPSILON {
                xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            }

            if (p1.x - p2.x).abs() < f32::EPSILON || p.x <= xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}
