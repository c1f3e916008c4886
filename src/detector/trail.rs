use super::RegionScanner;
use super::flow::neighbor;
use crate::error::{DmtxError, Result};
use crate::models::region::PointFlow;
use crate::models::{PixelLoc, Region};
use crate::utils::bresenham::BresLine;

/// Cursor along a blazed trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Follow {
    /// Current location
    pub loc: PixelLoc,
    /// Signed step count from the trail start
    pub step: i32,
}

/// Cache bit cleared by [`RegionScanner::trail_clear`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailMark {
    /// Set while a trail is being blazed
    Visited,
    /// Set on every cell of a trail
    Assigned,
}

/// Octant of a unit step, indexed by `3 * dy + dx + 4`; 8 marks the zero step
const DIR_MAP: [u8; 9] = [0, 1, 2, 7, 8, 3, 6, 5, 4];

impl RegionScanner<'_> {
    /// Cursor at the start of the region's trail, advanced `seek` steps
    pub(crate) fn follow_seek(&self, reg: &Region, seek: i32) -> Result<Follow> {
        let mut follow = Follow {
            loc: reg.flow_begin.loc,
            step: 0,
        };
        let sign = if seek > 0 { 1 } else { -1 };
        let mut i = 0;
        while i != seek {
            follow = self.follow_step(reg, follow, sign)?;
            if follow.step.abs() > reg.steps_total {
                return Err(DmtxError::internal("follow ran past the end of the trail"));
            }
            i += sign;
        }
        Ok(follow)
    }

    /// Cursor at an arbitrary location of a gapped trail
    pub(crate) fn follow_seek_loc(&self, loc: PixelLoc) -> Follow {
        Follow { loc, step: 0 }
    }

    /// One step along a continuous trail, jumping from either end to the other
    pub(crate) fn follow_step(&self, reg: &Region, from: Follow, sign: i32) -> Result<Follow> {
        let factor = reg.steps_total + 1;
        let step_mod = if sign > 0 {
            (factor + from.step % factor) % factor
        } else {
            (factor - from.step % factor) % factor
        };

        let loc = if sign > 0 && step_mod == reg.jump_to_neg {
            reg.final_neg
        } else if sign < 0 && step_mod == reg.jump_to_pos {
            reg.final_pos
        } else {
            let cell = self
                .cache
                .get(from.loc)
                .ok_or_else(|| DmtxError::internal("trail left the cache"))?;
            let dir = if sign < 0 { cell.downstream } else { cell.upstream };
            let dir = dir.ok_or_else(|| DmtxError::internal("trail cell without direction"))?;
            neighbor(from.loc, dir)
        };

        Ok(Follow {
            loc,
            step: from.step + sign,
        })
    }

    /// One step along a gapped trail; the current cell must be assigned
    pub(crate) fn follow_step2(&self, from: Follow, sign: i32) -> Result<Follow> {
        let cell = self
            .cache
            .get(from.loc)
            .filter(|c| c.assigned)
            .ok_or_else(|| DmtxError::internal("gapped trail cell not assigned"))?;
        let dir = if sign < 0 { cell.downstream } else { cell.upstream };
        let dir = dir.ok_or_else(|| DmtxError::internal("gapped trail cell without direction"))?;
        Ok(Follow {
            loc: neighbor(from.loc, dir),
            step: from.step + sign,
        })
    }

    /// Follow the edge from `flow_begin` in both directions, recording the trail in the cache.
    ///
    /// Returns `Ok(false)` when the trail outgrew `max_diagonal`.
    pub(crate) fn trail_blaze_continuous(
        &mut self,
        reg: &mut Region,
        flow_begin: PointFlow,
        max_diagonal: Option<i32>,
    ) -> Result<bool> {
        let mut bound_min = flow_begin.loc;
        let mut bound_max = flow_begin.loc;
        let exceeded = |min: PixelLoc, max: PixelLoc| {
            max_diagonal.is_some_and(|d| max.x - min.x > d || max.y - min.y > d)
        };

        {
            let start = self
                .cache
                .get_mut(flow_begin.loc)
                .ok_or_else(|| DmtxError::internal("trail start outside the cache"))?;
            *start = Default::default();
            start.visited = true;
            start.assigned = true;
        }
        reg.flow_begin = flow_begin;

        let mut assigns = 0;
        for sign in [1, -1] {
            let mut flow = flow_begin;
            let mut steps = 0;
            loop {
                if exceeded(bound_min, bound_max) {
                    break;
                }

                let next = self.find_strongest_neighbor(&flow, sign);
                if next.mag < 50 {
                    break;
                }
                let arrive = next
                    .arrive
                    .ok_or_else(|| DmtxError::internal("neighbour flow without arrival"))?;

                if self.cache.get(next.loc).is_none_or(|c| c.visited) {
                    return Err(DmtxError::internal("trail blaze revisited a cell"));
                }

                if let Some(cell) = self.cache.get_mut(flow.loc) {
                    if sign < 0 {
                        cell.downstream = Some(arrive);
                    } else {
                        cell.upstream = Some(arrive);
                    }
                }
                if let Some(cell) = self.cache.get_mut(next.loc) {
                    *cell = Default::default();
                    if sign < 0 {
                        cell.upstream = Some((arrive + 4) % 8);
                    } else {
                        cell.downstream = Some((arrive + 4) % 8);
                    }
                    cell.visited = true;
                    cell.assigned = true;
                }

                assigns += 1;
                flow = next;

                if flow.loc.x > bound_max.x {
                    bound_max.x = flow.loc.x;
                } else if flow.loc.x < bound_min.x {
                    bound_min.x = flow.loc.x;
                }
                if flow.loc.y > bound_max.y {
                    bound_max.y = flow.loc.y;
                } else if flow.loc.y < bound_min.y {
                    bound_min.y = flow.loc.y;
                }
                steps += 1;
            }

            if sign > 0 {
                reg.final_pos = flow.loc;
                reg.jump_to_neg = steps;
            } else {
                reg.final_neg = flow.loc;
                reg.jump_to_pos = steps;
            }
        }
        reg.steps_total = reg.jump_to_pos + reg.jump_to_neg;
        reg.bound_min = bound_min;
        reg.bound_max = bound_max;

        let clears = self.trail_clear(reg, TrailMark::Visited)?;
        if assigns != clears - 1 {
            return Err(DmtxError::internal("trail clear count does not match blaze"));
        }

        Ok(!exceeded(bound_min, bound_max))
    }

    /// Walk the whole trail clearing `mark` from every cell; returns the cells cleared
    pub(crate) fn trail_clear(&mut self, reg: &Region, mark: TrailMark) -> Result<i32> {
        let mut clears = 0;
        let mut follow = self.follow_seek(reg, 0)?;
        while follow.step.abs() <= reg.steps_total {
            let cell = self
                .cache
                .get_mut(follow.loc)
                .ok_or_else(|| DmtxError::internal("trail left the cache"))?;
            let bit = match mark {
                TrailMark::Visited => &mut cell.visited,
                TrailMark::Assigned => &mut cell.assigned,
            };
            if !*bit {
                return Err(DmtxError::internal("trail cell lost its mark"));
            }
            *bit = false;
            follow = self.follow_step(reg, follow, 1)?;
            clears += 1;
        }
        Ok(clears)
    }

    /// Trace an edge that may be broken (a calibration pattern) along the guide `line`.
    ///
    /// While on the edge the strongest neighbour is followed as long as it keeps moving
    /// forward and outward; otherwise the guide line is advanced until an edge shows up
    /// again. Returns the number of cells recorded.
    pub(crate) fn trail_blaze_gapped(
        &mut self,
        reg: &Region,
        mut line: BresLine,
        stream_dir: i32,
    ) -> Result<i32> {
        let plane = reg.flow_begin.plane;
        let loc0 = line.loc();
        let mut flow = self.get_point_flow(plane, loc0, None);
        let dx = (line.loc1().x - line.loc0().x) as i64;
        let dy = (line.loc1().y - line.loc0().y) as i64;
        let dist_sq_max = dx * dx + dy * dy;
        let mut steps = 0;
        let mut on_edge = true;

        let mut before = loc0;
        match self.cache.get_mut(loc0) {
            Some(cell) => *cell = Default::default(),
            None => return Ok(0),
        }

        loop {
            if on_edge {
                let next = self.find_strongest_neighbor(&flow, stream_dir);
                if next.is_blank() {
                    break;
                }

                let mut probe = line;
                let (travel, outward) = probe.get_step(next.loc)?;
                if next.mag < 50 || outward < 0 || (outward == 0 && travel < 0) {
                    on_edge = false;
                } else {
                    line.step(travel, outward)?;
                    flow = next;
                }
            }

            if !on_edge {
                line.step(1, 0)?;
                flow = self.get_point_flow(plane, line.loc(), None);
                if flow.mag > 50 {
                    on_edge = true;
                }
            }

            let after = line.loc();
            if !self.cache.contains(after) {
                break;
            }

            let x_step = after.x - before.x;
            let y_step = after.y - before.y;
            if x_step.abs() > 1 || y_step.abs() > 1 {
                return Err(DmtxError::internal("gapped trail stepped more than one pixel"));
            }
            let step_dir = DIR_MAP[(3 * y_step + x_step + 4) as usize];
            if step_dir == 8 {
                return Err(DmtxError::internal("gapped trail did not move"));
            }

            if let Some(cell) = self.cache.get_mut(before) {
                cell.assigned = true;
                if stream_dir < 0 {
                    cell.downstream = Some(step_dir);
                } else {
                    cell.upstream = Some(step_dir);
                }
            }
            if let Some(cell) = self.cache.get_mut(after) {
                *cell = Default::default();
                if stream_dir < 0 {
                    cell.upstream = Some((step_dir + 4) % 8);
                } else {
                    cell.downstream = Some((step_dir + 4) % 8);
                }
            }

            let dist_sq = after.distance_squared(&loc0);
            before = after;
            steps += 1;

            if dist_sq >= dist_sq_max {
                break;
            }
        }

        tracing::trace!(steps, stream_dir, "gapped trail");
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::ScanSettings;
    use crate::models::SizeRequest;
    use crate::utils::image::{ImageView, PackOrder, PixelLayout};

    fn settings() -> ScanSettings {
        ScanSettings {
            edge_min: None,
            edge_max: None,
            square_devn: (50.0f64).to_radians().cos(),
            size_request: SizeRequest::ShapeAuto,
            edge_threshold: 10,
        }
    }

    /// 40x40 grayscale with a dark square at [10, 30) x [10, 30)
    fn dark_square() -> Vec<u8> {
        let mut data = vec![255u8; 1600];
        for row in 10..30 {
            for x in 10..30 {
                data[row * 40 + x] = 0;
            }
        }
        data
    }

    #[test]
    fn test_continuous_trail_round_trip() {
        let data = dark_square();
        let view = ImageView::new(&data, PixelLayout::new(40, 40, PackOrder::K8)).unwrap();
        let mut scanner = RegionScanner::new(view, 1, settings(), Vec::new());

        let seed = scanner.seek_edge(PixelLoc::new(9, 20));
        assert!(seed.mag > 0);

        let mut reg = Region::default();
        assert!(scanner.trail_blaze_continuous(&mut reg, seed, None).unwrap());
        assert!(reg.steps_total >= 40);
        assert!(reg.bound_max.x - reg.bound_min.x > 10);

        // Walking the full cycle returns to the start
        let end = scanner.follow_seek(&reg, reg.steps_total).unwrap();
        let back = scanner.follow_step(&reg, end, 1).unwrap();
        assert_eq!(back.loc, seed.loc);

        // Visited bits are gone, assigned bits remain until cleared
        assert!(!scanner.cache.get(seed.loc).unwrap().visited);
        assert!(scanner.cache.get(seed.loc).unwrap().assigned);
        let cleared = scanner.trail_clear(&reg, TrailMark::Assigned).unwrap();
        assert_eq!(cleared, reg.steps_total + 1);
        assert!(!scanner.cache.get(seed.loc).unwrap().assigned);
    }

    #[test]
    fn test_diagonal_limit() {
        let data = dark_square();
        let view = ImageView::new(&data, PixelLayout::new(40, 40, PackOrder::K8)).unwrap();
        let mut scanner = RegionScanner::new(view, 1, settings(), Vec::new());

        let seed = scanner.seek_edge(PixelLoc::new(9, 20));
        let mut reg = Region::default();
        assert!(!scanner.trail_blaze_continuous(&mut reg, seed, Some(5)).unwrap());
    }

    #[test]
    fn test_gapped_trail_steps_along_line() {
        let data = dark_square();
        let view = ImageView::new(&data, PixelLayout::new(40, 40, PackOrder::K8)).unwrap();
        let mut scanner = RegionScanner::new(view, 1, settings(), Vec::new());

        let reg = Region::default();
        let line = BresLine::new(PixelLoc::new(2, 2), PixelLoc::new(2, 20), PixelLoc::new(20, 20));
        let steps = scanner.trail_blaze_gapped(&reg, line, 1).unwrap();
        assert!(steps >= 18);

        // The recorded cells can be followed back from the start
        let mut follow = scanner.follow_seek_loc(PixelLoc::new(2, 2));
        for _ in 0..steps {
            follow = scanner.follow_step2(follow, 1).unwrap();
        }
        assert_eq!(follow.step, steps);
    }
}
