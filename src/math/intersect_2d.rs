use super::{Point2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel (including collinear) segments return `None`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = da.x * db.y - da.y * db.x;
    if cross.abs() < TOLERANCE {
        return None;
    }

    let d = b0 - a0;
    let t = (d.x * db.y - d.y * db.x) / cross;
    let u = (d.x * da.y - d.y * da.x) / cross;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns `true` if any edge of closed polyline `a` crosses any edge of
/// closed polyline `b`.
#[must_use]
pub fn polylines_cross(a: &[Point2], b: &[Point2]) -> bool {
    let na = a.len();
    let nb = b.len();
    (0..na).any(|i| {
        let (a0, a1) = (&a[i], &a[(i + 1) % na]);
        (0..nb).any(|j| segment_segment_intersect_2d(a0, a1, &b[j], &b[(j + 1) % nb]).is_some())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn segment_segment_crossing() {
        let (pt, t, u) =
            segment_segment_intersect_2d(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0))
                .unwrap();
        assert!((pt.x - 1.0).abs() < TOLERANCE);
        assert!((pt.y - 1.0).abs() < TOLERANCE);
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn segment_segment_no_crossing() {
        assert!(segment_segment_intersect_2d(
            &p(0.0, 0.0),
            &p(1.0, 0.0),
            &p(0.0, 1.0),
            &p(1.0, 1.0)
        )
        .is_none());
    }

    #[test]
    fn nested_squares_do_not_cross() {
        let outer = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        let inner = [p(3.0, 3.0), p(7.0, 3.0), p(7.0, 7.0), p(3.0, 7.0)];
        assert!(!polylines_cross(&outer, &inner));
    }

    #[test]
    fn overlapping_squares_cross() {
        let a = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)];
        let b = [p(2.0, 2.0), p(6.0, 2.0), p(6.0, 6.0), p(2.0, 6.0)];
        assert!(polylines_cross(&a, &b));
    }
}
