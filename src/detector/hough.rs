use super::RegionScanner;
use crate::error::{DmtxError, Result};
use crate::models::Region;
use crate::models::region::BestLine;

/// Angular resolution of the line accumulator, in degrees
pub(crate) const HOUGH_RES: usize = 180;

/// cos(θ) for each whole degree, scaled by 256
#[rustfmt::skip]
pub(crate) const HOUGH_COS: [i32; HOUGH_RES] = [
    256, 256, 256, 256, 255, 255, 255, 254, 254, 253, 252, 251, 250, 249, 248,
    247, 246, 245, 243, 242, 241, 239, 237, 236, 234, 232, 230, 228, 226, 224,
    222, 219, 217, 215, 212, 210, 207, 204, 202, 199, 196, 193, 190, 187, 184,
    181, 178, 175, 171, 168, 165, 161, 158, 154, 150, 147, 143, 139, 136, 132,
    128, 124, 120, 116, 112, 108, 104, 100, 96, 92, 88, 83, 79, 75, 71,
    66, 62, 58, 53, 49, 44, 40, 36, 31, 27, 22, 18, 13, 9, 4,
    0, -4, -9, -13, -18, -22, -27, -31, -36, -40, -44, -49, -53, -58, -62,
    -66, -71, -75, -79, -83, -88, -92, -96, -100, -104, -108, -112, -116, -120, -124,
    -128, -132, -136, -139, -143, -147, -150, -154, -158, -161, -165, -168, -171, -175, -178,
    -181, -184, -187, -190, -193, -196, -199, -202, -204, -207, -210, -212, -215, -217, -219,
    -222, -224, -226, -228, -230, -232, -234, -236, -237, -239, -241, -242, -243, -245, -246,
    -247, -248, -249, -250, -251, -252, -253, -254, -254, -255, -255, -255, -256, -256, -256,
];
/// sin(θ) for each whole degree, scaled by 256
#[rustfmt::skip]
pub(crate) const HOUGH_SIN: [i32; HOUGH_RES] = [
    0, 4, 9, 13, 18, 22, 27, 31, 36, 40, 44, 49, 53, 58, 62,
    66, 71, 75, 79, 83, 88, 92, 96, 100, 104, 108, 112, 116, 120, 124,
    128, 132, 136, 139, 143, 147, 150, 154, 158, 161, 165, 168, 171, 175, 178,
    181, 184, 187, 190, 193, 196, 199, 202, 204, 207, 210, 212, 215, 217, 219,
    222, 224, 226, 228, 230, 232, 234, 236, 237, 239, 241, 242, 243, 245, 246,
    247, 248, 249, 250, 251, 252, 253, 254, 254, 255, 255, 255, 256, 256, 256,
    256, 256, 256, 256, 255, 255, 255, 254, 254, 253, 252, 251, 250, 249, 248,
    247, 246, 245, 243, 242, 241, 239, 237, 236, 234, 232, 230, 228, 226, 224,
    222, 219, 217, 215, 212, 210, 207, 204, 202, 199, 196, 193, 190, 187, 184,
    181, 178, 175, 171, 168, 165, 161, 158, 154, 150, 147, 143, 139, 136, 132,
    128, 124, 120, 116, 112, 108, 104, 100, 96, 92, 88, 83, 79, 75, 71,
    66, 62, 58, 53, 49, 44, 40, 36, 31, 27, 22, 18, 13, 9, 4,
];

/// Vote accumulator over 180 angles and 3 offset bins through a fixed origin
struct HoughAccumulator {
    votes: [[i32; HOUGH_RES]; 3],
    tested: [bool; HOUGH_RES],
    angle_best: usize,
    offset_best: usize,
}

impl HoughAccumulator {
    /// Accumulator skipping angles within 30 degrees of `avoid`
    fn new(avoid: Option<i32>) -> Self {
        let mut tested = [true; HOUGH_RES];
        if let Some(avoid) = avoid {
            let res = HOUGH_RES as i32;
            let min = (avoid + res / 6) % res;
            let max = (avoid - res / 6 + res) % res;
            for (i, t) in tested.iter_mut().enumerate() {
                let i = i as i32;
                *t = if min > max {
                    i > min || i < max
                } else {
                    i > min && i < max
                };
            }
        }
        Self {
            votes: [[0; HOUGH_RES]; 3],
            tested,
            angle_best: 0,
            offset_best: 0,
        }
    }

    /// Vote for every line through the origin passing within 1.5 px of (x_diff, y_diff)
    fn vote(&mut self, x_diff: i32, y_diff: i32) {
        for angle in 0..HOUGH_RES {
            if !self.tested[angle] {
                continue;
            }
            let dh = HOUGH_COS[angle] * y_diff - HOUGH_SIN[angle] * x_diff;
            if !(-384..=384).contains(&dh) {
                continue;
            }
            let offset = if dh > 128 {
                2
            } else if dh >= -128 {
                1
            } else {
                0
            };
            self.votes[offset][angle] += 1;
            if self.votes[offset][angle] > self.votes[self.offset_best][self.angle_best] {
                self.angle_best = angle;
                self.offset_best = offset;
            }
        }
    }

    fn apply(&self, line: &mut BestLine) {
        line.angle = self.angle_best as i32;
        line.h_offset = self.offset_best as i32;
        line.mag = self.votes[self.offset_best][self.angle_best];
    }
}

impl RegionScanner<'_> {
    /// Strongest straight segment of the continuous trail between `step0` and `step1`,
    /// travelling in `stream_dir`
    pub(crate) fn find_best_solid_line(
        &self,
        reg: &Region,
        step0: i32,
        step1: i32,
        stream_dir: i32,
        avoid: Option<i32>,
    ) -> Result<BestLine> {
        let (sign, mut trip_steps) = if step0 != 0 {
            if step0 > 0 {
                (1, (step1 - step0 + reg.steps_total) % reg.steps_total)
            } else {
                (-1, (step0 - step1 + reg.steps_total) % reg.steps_total)
            }
        } else if step1 != 0 {
            (if step1 > 0 { 1 } else { -1 }, step1.abs())
        } else {
            (1, reg.steps_total)
        };
        if step0 != 0 && trip_steps == 0 {
            trip_steps = reg.steps_total;
        }
        if sign != stream_dir {
            return Err(DmtxError::internal("line search against the stream direction"));
        }

        let mut follow = self.follow_seek(reg, step0)?;
        let origin = follow.loc;
        let mut line = BestLine {
            step_beg: step0,
            step_pos: step0,
            step_neg: step0,
            loc_beg: origin,
            loc_pos: origin,
            loc_neg: origin,
            ..Default::default()
        };

        let mut hough = HoughAccumulator::new(avoid);
        for _ in 0..trip_steps {
            hough.vote(follow.loc.x - origin.x, follow.loc.y - origin.y);
            follow = self.follow_step(reg, follow, sign)?;
        }
        hough.apply(&mut line);
        Ok(line)
    }

    /// Strongest straight segment of a gapped trail starting at `loc0`
    pub(crate) fn find_best_solid_line2(
        &self,
        loc0: crate::models::PixelLoc,
        trip_steps: i32,
        sign: i32,
        avoid: Option<i32>,
    ) -> Result<BestLine> {
        let mut follow = self.follow_seek_loc(loc0);
        let origin = follow.loc;
        let mut line = BestLine {
            loc_beg: origin,
            loc_pos: origin,
            loc_neg: origin,
            ..Default::default()
        };

        let mut hough = HoughAccumulator::new(avoid);
        for _ in 0..trip_steps {
            hough.vote(follow.loc.x - origin.x, follow.loc.y - origin.y);
            follow = self.follow_step2(follow, sign)?;
        }
        hough.apply(&mut line);
        Ok(line)
    }

    /// Extend `line` both ways along the trail while the trail stays within 3 px of it,
    /// recording the farthest pair of points and the wander seen before them
    pub(crate) fn find_travel_limits(&self, reg: &Region, line: &mut BestLine) -> Result<()> {
        let mut follow_pos = self.follow_seek(reg, line.step_beg)?;
        let mut follow_neg = follow_pos;
        let loc0 = follow_pos.loc;

        let cos = HOUGH_COS[line.angle as usize];
        let sin = HOUGH_SIN[line.angle as usize];

        let mut dist_sq_max = 0i64;
        let mut pos_max = follow_pos.loc;
        let mut neg_max = follow_pos.loc;

        let (mut pos_travel, mut neg_travel) = (0i32, 0i32);
        let (mut pos_wander, mut pos_min, mut pos_max_w, mut pos_min_lock, mut pos_max_lock) =
            (0i32, 0i32, 0i32, 0i32, 0i32);
        let (mut neg_wander, mut neg_min, mut neg_max_w, mut neg_min_lock, mut neg_max_lock) =
            (0i32, 0i32, 0i32, 0i32, 0i32);

        for i in 0..reg.steps_total / 2 {
            let pos_running = i < 10 || pos_wander.abs() < pos_travel.abs();
            let neg_running = i < 10 || neg_wander.abs() < neg_travel.abs();

            if pos_running {
                let x_diff = follow_pos.loc.x - loc0.x;
                let y_diff = follow_pos.loc.y - loc0.y;
                pos_travel = cos * x_diff + sin * y_diff;
                pos_wander = cos * y_diff - sin * x_diff;

                if (-3 * 256..=3 * 256).contains(&pos_wander) {
                    let dist_sq = follow_pos.loc.distance_squared(&neg_max);
                    if dist_sq > dist_sq_max {
                        pos_max = follow_pos.loc;
                        dist_sq_max = dist_sq;
                        line.step_pos = follow_pos.step;
                        line.loc_pos = follow_pos.loc;
                        pos_min_lock = pos_min;
                        pos_max_lock = pos_max_w;
                    }
                } else {
                    pos_min = pos_min.min(pos_wander);
                    pos_max_w = pos_max_w.max(pos_wander);
                }
            } else if !neg_running {
                break;
            }

            if neg_running {
                let x_diff = follow_neg.loc.x - loc0.x;
                let y_diff = follow_neg.loc.y - loc0.y;
                neg_travel = cos * x_diff + sin * y_diff;
                neg_wander = cos * y_diff - sin * x_diff;

                if (-3 * 256..3 * 256).contains(&neg_wander) {
                    let dist_sq = follow_neg.loc.distance_squared(&pos_max);
                    if dist_sq > dist_sq_max {
                        neg_max = follow_neg.loc;
                        dist_sq_max = dist_sq;
                        line.step_neg = follow_neg.step;
                        line.loc_neg = follow_neg.loc;
                        neg_min_lock = neg_min;
                        neg_max_lock = neg_max_w;
                    }
                } else {
                    neg_min = neg_min.min(neg_wander);
                    neg_max_w = neg_max_w.max(neg_wander);
                }
            }

            follow_pos = self.follow_step(reg, follow_pos, 1)?;
            follow_neg = self.follow_step(reg, follow_neg, -1)?;
        }

        line.devn = ((pos_max_lock - pos_min_lock).max(neg_max_lock - neg_min_lock) / 256) as f64;
        line.dist_sq = dist_sq_max;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_unit_circle() {
        for angle in 0..HOUGH_RES {
            let r2 = HOUGH_COS[angle] * HOUGH_COS[angle] + HOUGH_SIN[angle] * HOUGH_SIN[angle];
            assert!((r2 - 65536).abs() < 600, "angle {angle}");
        }
        assert_eq!(HOUGH_COS[90], 0);
        assert_eq!(HOUGH_SIN[90], 256);
    }

    #[test]
    fn test_accumulator_finds_horizontal_line() {
        let mut hough = HoughAccumulator::new(None);
        for x in 0..30 {
            hough.vote(x, 0);
        }
        let mut line = BestLine::default();
        hough.apply(&mut line);
        assert_eq!(line.angle, 0);
        assert_eq!(line.h_offset, 1);
        assert_eq!(line.mag, 30);
    }

    #[test]
    fn test_accumulator_avoid_window() {
        let mut hough = HoughAccumulator::new(Some(0));
        for x in 0..30 {
            hough.vote(x, 0);
        }
        let mut line = BestLine::default();
        hough.apply(&mut line);
        assert!(line.angle > 30 && line.angle < 150);
        assert!(line.mag < 30);

        let vertical = HoughAccumulator::new(Some(90));
        assert!(vertical.tested[0]);
        assert!(!vertical.tested[90]);
        assert!(!vertical.tested[60]);
        assert!(vertical.tested[59]);
    }
}
