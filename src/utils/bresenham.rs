//! Integer line walker with an outward direction, used to guide calibration edge tracing

use crate::error::{DmtxError, Result};
use crate::models::PixelLoc;

/// Bresenham line from `loc0` to `loc1` that can also step perpendicular to itself,
/// away from a reference point known to lie inside the symbol
#[derive(Debug, Clone, Copy)]
pub struct BresLine {
    x_step: i32,
    y_step: i32,
    x_delta: i32,
    y_delta: i32,
    steep: bool,
    x_out: i32,
    y_out: i32,
    travel: i32,
    outward: i32,
    error: i32,
    loc: PixelLoc,
    loc0: PixelLoc,
    loc1: PixelLoc,
}

impl BresLine {
    /// Line from `loc0` to `loc1`; outward steps move away from `loc_inside`
    pub fn new(loc0: PixelLoc, loc1: PixelLoc, loc_inside: PixelLoc) -> Self {
        let x_step = if loc0.x < loc1.x { 1 } else { -1 };
        let y_step = if loc0.y < loc1.y { 1 } else { -1 };
        let x_delta = (loc1.x - loc0.x).abs();
        let y_delta = (loc1.y - loc0.y).abs();
        let steep = y_delta > x_delta;

        // Orient the reference vector up (steep) or left (shallow) so the cross product sign
        // picks the outward side consistently
        let (beg, end) = if steep {
            if loc0.y < loc1.y { (loc0, loc1) } else { (loc1, loc0) }
        } else if loc0.x > loc1.x {
            (loc0, loc1)
        } else {
            (loc1, loc0)
        };
        let cp = (end.x - beg.x) * (loc_inside.y - end.y) - (end.y - beg.y) * (loc_inside.x - end.x);
        let out = if cp > 0 { 1 } else { -1 };
        let (x_out, y_out) = if steep { (out, 0) } else { (0, out) };

        Self {
            x_step,
            y_step,
            x_delta,
            y_delta,
            steep,
            x_out,
            y_out,
            travel: 0,
            outward: 0,
            error: if steep { y_delta / 2 } else { x_delta / 2 },
            loc: loc0,
            loc0,
            loc1,
        }
    }

    /// Current location
    pub fn loc(&self) -> PixelLoc {
        self.loc
    }

    /// Start of the line
    pub fn loc0(&self) -> PixelLoc {
        self.loc0
    }

    /// End of the line
    pub fn loc1(&self) -> PixelLoc {
        self.loc1
    }

    /// Net steps taken along the line
    pub fn travel(&self) -> i32 {
        self.travel
    }

    /// Net steps taken outward
    pub fn outward(&self) -> i32 {
        self.outward
    }

    /// Advance to the line position closest to `target`, returning (travel, outward):
    /// the steps taken along the line and the remaining outward offset of `target`
    pub fn get_step(&mut self, target: PixelLoc) -> Result<(i32, i32)> {
        if self.steep {
            let travel = if self.y_step > 0 {
                target.y - self.loc.y
            } else {
                self.loc.y - target.y
            };
            self.step(travel, 0)?;
            let outward = if self.x_out > 0 {
                target.x - self.loc.x
            } else {
                self.loc.x - target.x
            };
            Ok((travel, outward))
        } else {
            let travel = if self.x_step > 0 {
                target.x - self.loc.x
            } else {
                self.loc.x - target.x
            };
            self.step(travel, 0)?;
            let outward = if self.y_out > 0 {
                target.y - self.loc.y
            } else {
                self.loc.y - target.y
            };
            Ok((travel, outward))
        }
    }

    /// Take one step along the line (`travel` in -1..=1) followed by `outward` steps outward
    pub fn step(&mut self, travel: i32, outward: i32) -> Result<()> {
        if travel.abs() >= 2 {
            return Err(DmtxError::internal("bresenham travel larger than one step"));
        }

        if travel > 0 {
            self.travel += 1;
            if self.steep {
                self.loc.y += self.y_step;
                self.error -= self.x_delta;
                if self.error < 0 {
                    self.loc.x += self.x_step;
                    self.error += self.y_delta;
                }
            } else {
                self.loc.x += self.x_step;
                self.error -= self.y_delta;
                if self.error < 0 {
                    self.loc.y += self.y_step;
                    self.error += self.x_delta;
                }
            }
        } else if travel < 0 {
            self.travel -= 1;
            if self.steep {
                self.loc.y -= self.y_step;
                self.error += self.x_delta;
                if self.error >= self.y_delta {
                    self.loc.x -= self.x_step;
                    self.error -= self.y_delta;
                }
            } else {
                self.loc.x -= self.x_step;
                self.error += self.y_delta;
                if self.error >= self.x_delta {
                    self.loc.y -= self.y_step;
                    self.error -= self.x_delta;
                }
            }
        }

        for _ in 0..outward {
            self.outward += 1;
            self.loc = self.loc.translate(self.x_out, self.y_out);
        }
        Ok(())
    }
}
