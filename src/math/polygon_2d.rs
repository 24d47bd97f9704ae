use super::Point2;

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Point-in-polygon test using the winding number.
///
/// Returns `true` if the point is strictly inside; points on the boundary
/// may go either way.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    winding_number_2d(point, polygon) != 0
}

/// Winding number of `p` with respect to polygon `verts`.
///
/// Non-zero => inside, zero => outside.
fn winding_number_2d(p: &Point2, verts: &[Point2]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let v0 = verts[i];
        let v1 = verts[(i + 1) % n];

        if v0.y <= p.y {
            if v1.y > p.y && cross_2d(&v0, &v1, p) > 0.0 {
                winding += 1;
            }
        } else if v1.y <= p.y && cross_2d(&v0, &v1, p) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// 2D cross product of `(v1 - v0)` and `(p - v0)`.
#[inline]
fn cross_2d(v0: &Point2, v1: &Point2, p: &Point2) -> f64 {
    (v1.x - v0.x) * (p.y - v0.y) - (v1.y - v0.y) * (p.x - v0.x)
}

/// Centroid of a triangle.
#[must_use]
pub fn triangle_centroid(a: &Point2, b: &Point2, c: &Point2) -> Point2 {
    Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
}

/// Unsigned area of a triangle.
#[must_use]
pub fn triangle_area(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
}

/// Normalised shape quality `2 r_in / r_circ`: one for an equilateral
/// triangle, zero for a degenerate one.
#[must_use]
pub fn triangle_quality(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let (la, lb, lc) = ((b - c).norm(), (c - a).norm(), (a - b).norm());
    let s = 0.5 * (la + lb + lc);
    let product = la * lb * lc;
    if product <= 0.0 {
        return 0.0;
    }
    let area_sq = (s * (s - la) * (s - lb) * (s - lc)).max(0.0);
    (8.0 * area_sq / (s * product)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn unit_square() -> Vec<Point2> {
        vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&unit_square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = unit_square();
        pts.reverse();
        assert!((signed_area_2d(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[p(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area_2d(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn point_inside_and_outside() {
        let square = unit_square();
        assert!(point_in_polygon_2d(&p(0.5, 0.5), &square));
        assert!(!point_in_polygon_2d(&p(1.5, 0.5), &square));
        assert!(!point_in_polygon_2d(&p(0.5, -0.1), &square));
    }

    #[test]
    fn winding_is_orientation_independent() {
        let mut square = unit_square();
        square.reverse();
        assert!(point_in_polygon_2d(&p(0.25, 0.75), &square));
    }

    #[test]
    fn triangle_helpers() {
        let (a, b, c) = (p(0.0, 0.0), p(3.0, 0.0), p(0.0, 3.0));
        assert!((triangle_area(&a, &b, &c) - 4.5).abs() < TOLERANCE);
        let g = triangle_centroid(&a, &b, &c);
        assert!((g.x - 1.0).abs() < TOLERANCE && (g.y - 1.0).abs() < TOLERANCE);
    }
}
