//! Bézier evaluation shared by the gait generator, the stance planner and the
//! scripted animations.
use super::vector::Vec3;

/// Point at `t` (clamped to `[0, 1]`) on the Bézier curve defined by `N` control points.
///
/// `N = 2` is plain linear interpolation; more points bend the curve toward the inner
/// control points without passing through them. Evaluated with de Casteljau's scheme
/// on a stack copy, so it never allocates.
pub fn bezier<const N: usize>(points: &[Vec3; N], t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    let mut work = *points;
    for level in 1..N {
        for i in 0..N - level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
    }
    work.first().copied().unwrap_or(Vec3::ZERO)
}

/// Maps `value` from `[from, to]` onto `[0, 1]`.
pub fn remap(value: f32, from: f32, to: f32) -> f32 {
    if libm::fabsf(to - from) <= f32::EPSILON {
        return 1.0;
    }
    (value - from) / (to - from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn two_points_is_linear() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, -20.0, 4.0);
        let mid = bezier(&[a, b], 0.25);
        assert_abs_diff_eq!(mid.x, 2.5);
        assert_abs_diff_eq!(mid.y, -5.0);
        assert_abs_diff_eq!(mid.z, 1.0);
    }

    #[test]
    fn endpoints_are_interpolated() {
        let pts = [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(50.0, 0.0, 90.0),
            Vec3::new(-4.0, 7.0, 30.0),
            Vec3::new(9.0, 9.0, 9.0),
            Vec3::new(-1.0, -2.0, -3.0),
        ];
        assert_eq!(bezier(&pts, 0.0), pts[0]);
        let end = bezier(&pts, 1.0);
        assert_abs_diff_eq!(end.x, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(end.y, -2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(end.z, -3.0, epsilon = 1e-5);
    }

    #[test]
    fn quadratic_midpoint_matches_bernstein_form() {
        let pts = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(50.0, 0.0, 50.0),
            Vec3::new(100.0, 0.0, 0.0),
        ];
        let mid = bezier(&pts, 0.5);
        // 0.25 * p0 + 0.5 * p1 + 0.25 * p2
        assert_abs_diff_eq!(mid.x, 50.0, epsilon = 1e-5);
        assert_abs_diff_eq!(mid.z, 25.0, epsilon = 1e-5);
    }

    #[test]
    fn parameter_outside_unit_interval_is_clamped() {
        let pts = [Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)];
        assert_eq!(bezier(&pts, -3.0), Vec3::ZERO);
        assert_eq!(bezier(&pts, 7.0), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn remap_degenerate_range() {
        assert_abs_diff_eq!(remap(0.75, 0.5, 1.0), 0.5);
        assert_abs_diff_eq!(remap(0.3, 0.3, 0.3), 1.0);
    }
}
