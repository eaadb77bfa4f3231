//! 2D geometry helpers shared by the obstacle registry and the resolver

use herbfall_core::Vec2;

/// Closest point to `p` on segment `ab`. A zero-length segment yields `a`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Point-in-triangle by the signs of the three edge cross products.
///
/// Works for either winding and needs no division. A degenerate (zero-area)
/// triangle has no interior and contains nothing.
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    if triangle_area2(a, b, c).abs() <= f32::EPSILON {
        return false;
    }
    let d1 = (b - a).cross(p - a);
    let d2 = (c - b).cross(p - b);
    let d3 = (a - c).cross(p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

pub fn triangle_centroid(a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    (a + b + c) / 3.0
}

/// Twice the signed area; zero for a degenerate triangle
pub fn triangle_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).cross(c - a)
}

/// Radius of the inscribed circle, 0 when degenerate
pub fn triangle_inradius(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let perimeter = a.distance(b) + b.distance(c) + c.distance(a);
    if perimeter <= f32::EPSILON {
        return 0.0;
    }
    triangle_area2(a, b, c).abs() / perimeter
}

/// Unit normal of edge `ab` pointing away from `interior`.
///
/// A zero-length edge has no direction of its own, so the normal falls back
/// to the direction from `interior` to the edge and then to screen-up.
pub fn edge_outward_normal(a: Vec2, b: Vec2, interior: Vec2) -> Vec2 {
    let edge = b - a;
    let midpoint = (a + b) * 0.5;
    if edge.length_squared() <= f32::EPSILON {
        return (midpoint - interior).normalize_or(Vec2::UP);
    }
    let n = edge.perp().normalize_or(Vec2::UP);
    if n.dot(midpoint - interior) < 0.0 {
        -n
    } else {
        n
    }
}

/// Clamp `p` into the axis-aligned box `[min, max]`
pub fn clamp_to_box(p: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(Vec2::new(5.0, 3.0), a, b), Vec2::new(5.0, 0.0));
        assert_eq!(closest_point_on_segment(Vec2::new(-4.0, 3.0), a, b), a);
        assert_eq!(closest_point_on_segment(Vec2::new(14.0, 3.0), a, b), b);
        assert_eq!(closest_point_on_segment(Vec2::new(14.0, 3.0), a, a), a);
    }

    #[test]
    fn point_in_triangle_either_winding() {
        let a = Vec2::new(400.0, 100.0);
        let b = Vec2::new(300.0, 250.0);
        let c = Vec2::new(500.0, 250.0);
        let inside = Vec2::new(400.0, 200.0);
        let outside = Vec2::new(300.0, 120.0);
        assert!(point_in_triangle(inside, a, b, c));
        assert!(point_in_triangle(inside, a, c, b));
        assert!(!point_in_triangle(outside, a, b, c));
    }

    #[test]
    fn degenerate_triangle_contains_nothing() {
        let a = Vec2::new(5.0, 5.0);
        assert!(!point_in_triangle(a, a, a, a));
        assert!(!point_in_triangle(Vec2::new(900.0, 0.0), a, a, a));
        let line = (Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0));
        assert!(!point_in_triangle(Vec2::new(0.5, 0.0), line.0, line.1, line.2));
    }

    #[test]
    fn degenerate_triangle_has_zero_inradius() {
        let a = Vec2::new(0.0, 0.0);
        assert_eq!(triangle_inradius(a, a, a), 0.0);
        let r = triangle_inradius(Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 3.0));
        assert!((r - 1.0).abs() < 1e-5);
    }

    #[test]
    fn outward_normal_points_away_from_interior() {
        let a = Vec2::new(300.0, 250.0);
        let b = Vec2::new(500.0, 250.0);
        let centroid = Vec2::new(400.0, 200.0);
        let n = edge_outward_normal(a, b, centroid);
        assert!((n.y - 1.0).abs() < 1e-6);
        assert!((edge_outward_normal(b, a, centroid).y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_length_edge_normal_is_finite() {
        let p = Vec2::new(5.0, 5.0);
        let n = edge_outward_normal(p, p, p);
        assert_eq!(n, Vec2::UP);
        let n = edge_outward_normal(p, p, Vec2::new(5.0, 0.0));
        assert!((n.y - 1.0).abs() < 1e-6);
    }
}
