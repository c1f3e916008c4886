use super::RegionScanner;
use crate::error::Result;
use crate::models::{Region, SymbolShape, Vector2};
use crate::utils::bresenham::BresLine;

/// Calibration edge opposite one of the finder legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Dashed edge opposite the bottom finder leg
    Top,
    /// Dashed edge opposite the left finder leg
    Right,
}

impl RegionScanner<'_> {
    /// Trace the dashed calibration edge from its tentative location toward a point well
    /// inside the far corner, then fit a line to what was traced
    pub(crate) fn align_calib_edge(&mut self, reg: &mut Region, edge: Edge) -> Result<bool> {
        let Some(origin) = reg.fit2raw.apply(Vector2::new(0.0, 0.0)) else {
            return Ok(false);
        };
        let loc_origin = origin.to_pixel();

        let shape = self.symbol_shape();
        let (stream_dir, avoid, start, target) = match edge {
            Edge::Top => {
                let y = if shape == SymbolShape::Rect { 0.2 } else { 0.6 };
                (-reg.polarity, reg.left_line.angle, reg.loc_t, Vector2::new(0.8, y))
            }
            Edge::Right => {
                let x = if shape == SymbolShape::Square { 0.7 } else { 0.9 };
                (reg.polarity, reg.bottom_line.angle, reg.loc_r, Vector2::new(x, 0.8))
            }
        };

        let Some(target) = reg.fit2raw.apply(target) else {
            return Ok(false);
        };
        let follow = self.follow_seek_loc(start);
        let loc0 = follow.loc;
        let line = BresLine::new(loc0, target.to_pixel(), loc_origin);
        let steps = self.trail_blaze_gapped(reg, line, stream_dir)?;
        let best = self.find_best_solid_line2(loc0, steps, stream_dir, Some(avoid))?;

        match edge {
            Edge::Top => {
                reg.top_known = true;
                reg.top_angle = best.angle;
                reg.top_loc = best.loc_beg;
            }
            Edge::Right => {
                reg.right_known = true;
                reg.right_angle = best.angle;
                reg.right_loc = best.loc_beg;
            }
        }
        tracing::trace!(?edge, angle = best.angle, steps, "calibration edge aligned");
        Ok(true)
    }
}
