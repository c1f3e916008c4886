use super::RegionScanner;
use crate::models::{Region, Vector2};
use crate::utils::geometry::{intersect, right_angle_trueness, Matrix3, Ray2};
use std::f64::consts::FRAC_PI_2;

/// Forward and inverse transforms between image space and the fitted unit square
struct Fit {
    raw2fit: Matrix3,
    fit2raw: Matrix3,
}

/// Build the transforms taking `p00` to the origin, `p10` to (1, 0), `p11` to (1, 1) and
/// `p01` to (0, 1).
///
/// The inverse is assembled from the inverted steps in reverse order rather than by
/// inverting the matrix.
fn fit_quad(p00: Vector2, p10: Vector2, p11: Vector2, p01: Vector2) -> Option<Fit> {
    let v_ot = p01.sub(&p00);

    let tx = -p00.x;
    let ty = -p00.y;
    let mut m = Matrix3::translate(tx, ty);

    let phi = v_ot.x.atan2(v_ot.y);
    m = m * Matrix3::rotate(phi);

    let v = m.apply(p10)?;
    let shx = -v.y / v.x;
    m = m * Matrix3::shear(0.0, shx);

    let scx = 1.0 / v.x;
    m = m * Matrix3::scale(scx, 1.0);

    let scy = 1.0 / m.apply(p11)?.y;
    m = m * Matrix3::scale(1.0, scy);

    let skx = m.apply(p11)?.x;
    m = m * Matrix3::line_skew_side(1.0, skx, 1.0)?;

    let sky = m.apply(p01)?.y;
    let raw2fit = m * Matrix3::line_skew_top(sky, 1.0, 1.0)?;

    let fit2raw = Matrix3::line_skew_top_inv(sky, 1.0, 1.0)?
        * Matrix3::line_skew_side_inv(1.0, skx, 1.0)?
        * Matrix3::scale(1.0 / scx, 1.0 / scy)
        * Matrix3::shear(0.0, -shx)
        * Matrix3::rotate(-phi)
        * Matrix3::translate(-tx, -ty);

    Some(Fit { raw2fit, fit2raw })
}

impl RegionScanner<'_> {
    /// Recompute the region transforms from its known edges.
    ///
    /// Edges not located yet are stood in for by a line through the tentative calibration
    /// location, parallel to the opposite finder leg.
    pub(crate) fn update_xfrms(&self, reg: &mut Region) -> bool {
        if !(reg.left_known && reg.bottom_known) {
            return false;
        }

        let left = Ray2::from_angle(reg.left_loc.to_vector(), reg.left_angle);
        let bottom = Ray2::from_angle(reg.bottom_loc.to_vector(), reg.bottom_angle);
        let top = if reg.top_known {
            Ray2::from_angle(reg.top_loc.to_vector(), reg.top_angle)
        } else {
            Ray2::from_angle(reg.loc_t.to_vector(), reg.bottom_angle)
        };
        let right = if reg.right_known {
            Ray2::from_angle(reg.right_loc.to_vector(), reg.right_angle)
        } else {
            Ray2::from_angle(reg.loc_r.to_vector(), reg.left_angle)
        };

        let corners = (
            intersect(&left, &bottom),
            intersect(&bottom, &right),
            intersect(&right, &top),
            intersect(&top, &left),
        );
        let (Some(p00), Some(p10), Some(p11), Some(p01)) = corners else {
            return false;
        };

        self.update_corners(reg, p00, p10, p11, p01)
    }

    /// Accept the quadrilateral if it is a plausible symbol outline and store its transforms
    pub(crate) fn update_corners(
        &self,
        reg: &mut Region,
        p00: Vector2,
        p10: Vector2,
        p11: Vector2,
        p01: Vector2,
    ) -> bool {
        let x_max = (self.width - 1) as f64;
        let y_max = (self.height - 1) as f64;
        let inside = |p: Vector2| p.x >= 0.0 && p.y >= 0.0 && p.x <= x_max && p.y <= y_max;
        if !(inside(p00) && inside(p01) && inside(p10)) {
            return false;
        }

        let v_ot = p01.sub(&p00);
        let v_or = p10.sub(&p00);
        let v_tx = p11.sub(&p01);
        let v_rx = p11.sub(&p10);
        let (dim_ot, dim_or, dim_tx, dim_rx) = (v_ot.mag(), v_or.mag(), v_tx.mag(), v_rx.mag());

        if dim_ot <= 8.0 || dim_or <= 8.0 || dim_tx <= 8.0 || dim_rx <= 8.0 {
            return false;
        }

        // Opposite sides may differ by at most a factor of two
        let ratio = dim_ot / dim_rx;
        if ratio <= 0.5 || ratio >= 2.0 {
            return false;
        }
        let ratio = dim_or / dim_tx;
        if ratio <= 0.5 || ratio >= 2.0 {
            return false;
        }

        // Bowtie
        if v_or.cross(&v_rx) <= 0.0 || v_ot.cross(&v_tx) >= 0.0 {
            return false;
        }

        let square_devn = self.settings.square_devn;
        if right_angle_trueness(p00, p10, p11, FRAC_PI_2) <= square_devn
            || right_angle_trueness(p10, p11, p01, FRAC_PI_2) <= square_devn
        {
            return false;
        }

        match fit_quad(p00, p10, p11, p01) {
            Some(fit) => {
                reg.raw2fit = fit.raw2fit;
                reg.fit2raw = fit.fit2raw;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector2, b: Vector2) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    #[test]
    fn test_fit_axis_aligned_square() {
        let p00 = Vector2::new(10.0, 10.0);
        let p10 = Vector2::new(50.0, 10.0);
        let p11 = Vector2::new(50.0, 50.0);
        let p01 = Vector2::new(10.0, 50.0);
        let fit = fit_quad(p00, p10, p11, p01).unwrap();

        assert!(close(fit.raw2fit.apply(p00).unwrap(), Vector2::new(0.0, 0.0)));
        assert!(close(fit.raw2fit.apply(p10).unwrap(), Vector2::new(1.0, 0.0)));
        assert!(close(fit.raw2fit.apply(p11).unwrap(), Vector2::new(1.0, 1.0)));
        assert!(close(fit.raw2fit.apply(p01).unwrap(), Vector2::new(0.0, 1.0)));
        assert!(close(fit.fit2raw.apply(Vector2::new(0.5, 0.5)).unwrap(), Vector2::new(30.0, 30.0)));
    }

    #[test]
    fn test_fit_rotated_quad_round_trip() {
        let p00 = Vector2::new(40.0, 12.0);
        let p10 = Vector2::new(70.0, 38.0);
        let p11 = Vector2::new(44.0, 70.0);
        let p01 = Vector2::new(14.0, 42.0);
        let fit = fit_quad(p00, p10, p11, p01).unwrap();

        for (raw, unit) in [
            (p00, Vector2::new(0.0, 0.0)),
            (p10, Vector2::new(1.0, 0.0)),
            (p11, Vector2::new(1.0, 1.0)),
            (p01, Vector2::new(0.0, 1.0)),
        ] {
            assert!(close(fit.raw2fit.apply(raw).unwrap(), unit));
            assert!(close(fit.fit2raw.apply(unit).unwrap(), raw));
        }
    }
}
