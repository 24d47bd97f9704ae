use std::f64::consts::TAU;

use super::{rotate_vector, Point2, Vector2};

/// Returns the minimum distance from `p` to the line segment `a`–`b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return (p - a).norm();
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (p - (a + d * t)).norm()
}

/// Returns the distance from `p` to an elliptic arc.
///
/// The ellipse has `center`, semi-axes `rx`/`ry` along its local axes, and
/// is rotated by `rotation` radians. The arc spans `start + [0, sweep]` in
/// the ellipse's parametric angle.
///
/// The point is projected radially onto the ellipse, which is exact for
/// circles and a close approximation near the curve otherwise. If the
/// projection falls outside the arc range, the distance to the nearer arc
/// endpoint is returned instead.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn point_to_elliptic_arc_dist(
    p: &Point2,
    center: &Point2,
    rx: f64,
    ry: f64,
    rotation: f64,
    start: f64,
    sweep: f64,
) -> f64 {
    let local = rotate_vector(&(p - center), -rotation);
    let t = (local.y / ry).atan2(local.x / rx);

    if angle_in_arc_range(t, start, sweep) {
        let on_curve = Vector2::new(rx * t.cos(), ry * t.sin());
        return (local - on_curve).norm();
    }

    let end = start + sweep;
    let ep0 = Vector2::new(rx * start.cos(), ry * start.sin());
    let ep1 = Vector2::new(rx * end.cos(), ry * end.sin());
    (local - ep0).norm().min((local - ep1).norm())
}

/// Checks if an angle falls within an arc's angular range.
#[must_use]
pub fn angle_in_arc_range(angle: f64, start_angle: f64, sweep: f64) -> bool {
    let eps = 1e-10;
    if sweep.abs() >= TAU - eps {
        return true;
    }
    let mut delta = angle - start_angle;

    if sweep > 0.0 {
        while delta < -eps {
            delta += TAU;
        }
        while delta > TAU + eps {
            delta -= TAU;
        }
        delta >= -eps && delta <= sweep + eps
    } else {
        while delta > eps {
            delta -= TAU;
        }
        while delta < -TAU - eps {
            delta += TAU;
        }
        delta <= eps && delta >= sweep - eps
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    const TOL: f64 = 1e-10;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn segment_dist_perpendicular_projection() {
        let d = point_to_segment_dist(&p(1.0, 1.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_endpoint_closest() {
        let d = point_to_segment_dist(&p(-1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0));
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn segment_dist_degenerate() {
        let d = point_to_segment_dist(&p(3.0, 4.0), &p(0.0, 0.0), &p(0.0, 0.0));
        assert!((d - 5.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn circle_dist_is_exact() {
        let d = point_to_elliptic_arc_dist(&p(0.0, 2.0), &p(0.0, 0.0), 1.0, 1.0, 0.0, 0.0, TAU);
        assert!((d - 1.0).abs() < TOL, "d={d}");
    }

    #[test]
    fn point_on_ellipse_has_zero_distance() {
        let d = point_to_elliptic_arc_dist(&p(4.0, 0.0), &p(0.0, 0.0), 4.0, 2.0, 0.0, 0.0, TAU);
        assert!(d.abs() < TOL, "d={d}");
        let d = point_to_elliptic_arc_dist(&p(0.0, 2.0), &p(0.0, 0.0), 4.0, 2.0, 0.0, 0.0, TAU);
        assert!(d.abs() < TOL, "d={d}");
    }

    #[test]
    fn rotated_ellipse_distance() {
        // Major axis along y after a quarter turn.
        let d = point_to_elliptic_arc_dist(
            &p(0.0, 4.0),
            &p(0.0, 0.0),
            4.0,
            2.0,
            PI / 2.0,
            0.0,
            TAU,
        );
        assert!(d.abs() < 1e-9, "d={d}");
    }

    #[test]
    fn arc_dist_outside_range_uses_endpoints() {
        // Upper half circle; point below the centre.
        let d = point_to_elliptic_arc_dist(&p(0.0, -2.0), &p(0.0, 0.0), 1.0, 1.0, 0.0, 0.0, PI);
        assert!((d - 5.0_f64.sqrt()).abs() < 1e-9, "d={d}");
    }

    #[test]
    fn full_sweep_contains_every_angle() {
        assert!(angle_in_arc_range(-3.0, 0.0, TAU));
        assert!(angle_in_arc_range(1.0, 0.0, PI));
        assert!(!angle_in_arc_range(-1.0, 0.0, PI));
    }
}
