use super::RegionScanner;
use super::trail::TrailMark;
use crate::error::{DmtxError, Result};
use crate::models::region::{BestLine, PointFlow};
use crate::models::{Region, SymbolShape};

/// Which finder leg a fitted line turned out to be, and which way the trail runs around it
struct Assignment {
    polarity: i32,
    left: BestLine,
    bottom: BestLine,
}

fn straight_enough(line: &BestLine) -> bool {
    line.dist_sq >= 100 && line.devn * 10.0 < (line.dist_sq as f64).sqrt()
}

impl RegionScanner<'_> {
    fn max_diagonal(&self) -> Option<i32> {
        let factor = match self.symbol_shape() {
            SymbolShape::Rect => 1.23,
            _ => 1.56,
        };
        self.settings
            .edge_max
            .map(|edge| (factor * edge as f64 + 0.5) as i32)
    }

    fn too_small(&self, reg: &Region) -> bool {
        let Some(edge_min) = self.settings.edge_min else {
            return false;
        };
        let scale_sq = self.scale * self.scale;
        let min_area = match self.symbol_shape() {
            SymbolShape::Square => edge_min * edge_min / scale_sq,
            _ => 2 * edge_min * edge_min / scale_sq,
        };
        let area = (reg.bound_max.x - reg.bound_min.x) * (reg.bound_max.y - reg.bound_min.y);
        area < min_area
    }

    /// Trace the edge through `begin` and fit the two finder legs to it.
    ///
    /// On success the region knows its polarity, both finder lines and a rough location on
    /// each calibration edge.
    pub(crate) fn orientation(&mut self, reg: &mut Region, begin: PointFlow) -> Result<bool> {
        let max_diagonal = self.max_diagonal();
        if !self.trail_blaze_continuous(reg, begin, max_diagonal)? || reg.steps_total < 40 {
            self.trail_clear(reg, TrailMark::Assigned)?;
            return Ok(false);
        }

        if self.too_small(reg) {
            self.trail_clear(reg, TrailMark::Assigned)?;
            return Ok(false);
        }

        let mut line1 = self.find_best_solid_line(reg, 0, 0, 1, None)?;
        if line1.mag < 5 {
            self.trail_clear(reg, TrailMark::Assigned)?;
            return Ok(false);
        }

        self.find_travel_limits(reg, &mut line1)?;
        if !straight_enough(&line1) {
            self.trail_clear(reg, TrailMark::Assigned)?;
            return Ok(false);
        }
        if line1.step_pos < line1.step_neg {
            return Err(DmtxError::internal("finder leg travel limits are reversed"));
        }

        let seek = self.follow_seek(reg, line1.step_pos + 5)?;
        let line2_pos = self.find_best_solid_line(reg, seek.step, line1.step_neg, 1, Some(line1.angle))?;
        let seek = self.follow_seek(reg, line1.step_neg - 5)?;
        let line2_neg =
            self.find_best_solid_line(reg, seek.step, line1.step_pos, -1, Some(line1.angle))?;
        if line2_pos.mag.max(line2_neg.mag) < 5 {
            return Ok(false);
        }

        let assignment = if line2_pos.mag > line2_neg.mag {
            let mut line2 = line2_pos;
            self.find_travel_limits(reg, &mut line2)?;
            if !straight_enough(&line2) {
                return Ok(false);
            }

            let cross = (line1.loc_pos.x - line1.loc_neg.x) * (line2.loc_pos.y - line2.loc_neg.y)
                - (line1.loc_pos.y - line1.loc_neg.y) * (line2.loc_pos.x - line2.loc_neg.x);
            if cross > 0 {
                reg.loc_r = line2.loc_pos;
                reg.step_r = line2.step_pos;
                reg.loc_t = line1.loc_neg;
                reg.step_t = line1.step_neg;
                Assignment { polarity: 1, left: line1, bottom: line2 }
            } else {
                reg.loc_r = line1.loc_neg;
                reg.step_r = line1.step_neg;
                reg.loc_t = line2.loc_pos;
                reg.step_t = line2.step_pos;
                Assignment { polarity: -1, left: line2, bottom: line1 }
            }
        } else {
            let mut line2 = line2_neg;
            self.find_travel_limits(reg, &mut line2)?;
            if !straight_enough(&line2) {
                return Ok(false);
            }

            let cross = (line1.loc_neg.x - line1.loc_pos.x) * (line2.loc_neg.y - line2.loc_pos.y)
                - (line1.loc_neg.y - line1.loc_pos.y) * (line2.loc_neg.x - line2.loc_pos.x);
            if cross > 0 {
                reg.loc_r = line2.loc_neg;
                reg.step_r = line2.step_neg;
                reg.loc_t = line1.loc_pos;
                reg.step_t = line1.step_pos;
                Assignment { polarity: -1, left: line1, bottom: line2 }
            } else {
                reg.loc_r = line1.loc_pos;
                reg.step_r = line1.step_pos;
                reg.loc_t = line2.loc_neg;
                reg.step_t = line2.step_neg;
                Assignment { polarity: 1, left: line2, bottom: line1 }
            }
        };

        reg.polarity = assignment.polarity;
        reg.left_loc = assignment.left.loc_beg;
        reg.left_angle = assignment.left.angle;
        reg.left_line = assignment.left;
        reg.bottom_loc = assignment.bottom.loc_beg;
        reg.bottom_angle = assignment.bottom.angle;
        reg.bottom_line = assignment.bottom;
        reg.left_known = true;
        reg.bottom_known = true;

        tracing::trace!(
            polarity = reg.polarity,
            left = reg.left_angle,
            bottom = reg.bottom_angle,
            "finder oriented"
        );
        Ok(true)
    }
}
