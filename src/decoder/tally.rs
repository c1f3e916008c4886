//! Module classification from a located region
//!
//! Each data region is walked along every row and column in all four directions. A walk
//! starts at the known border module and compares each module against the previous one;
//! modules nearer the known start weigh more. A module is on when its weighted votes reach
//! half of the maximum.

use crate::detector::RegionScanner;
use crate::error::{DmtxError, Result};
use crate::models::message::{MODULE_ASSIGNED, MODULE_OFF, MODULE_ON_RGB};
use crate::models::{Message, Region, SymbolSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TallyWalk {
    Up,
    Left,
    Down,
    Right,
}

/// Votes for one data region, indexed `[map_row][map_col]`
struct Tally {
    votes: Vec<i32>,
    width: usize,
}

impl Tally {
    fn new(width: usize, height: usize) -> Self {
        Self {
            votes: vec![0; width * height],
            width,
        }
    }

    fn add(&mut self, row: i32, col: i32, weight: i32) -> Result<()> {
        if row < 0 || col < 0 || col as usize >= self.width {
            return Err(DmtxError::internal("tally index out of range"));
        }
        let idx = row as usize * self.width + col as usize;
        let cell = self
            .votes
            .get_mut(idx)
            .ok_or_else(|| DmtxError::internal("tally index out of range"))?;
        *cell += weight;
        Ok(())
    }

    fn get(&self, row: usize, col: usize) -> i32 {
        self.votes[row * self.width + col]
    }
}

impl RegionScanner<'_> {
    /// Decide every data module of `reg` in colour `plane` and store it in `msg.array`
    pub(crate) fn populate_array(&self, reg: &Region, plane: usize, msg: &mut Message) -> Result<()> {
        let size = msg.size;
        let x_regions = size.horiz_data_regions();
        let y_regions = size.vert_data_regions();
        let map_width = size.data_region_cols();
        let map_height = size.data_region_rows();
        let weight_factor = 2 * (map_height + map_width + 2) as i32;

        for y_region in 0..y_regions {
            let y_origin = (y_region * (map_height + 2) + 1) as i32;
            for x_region in 0..x_regions {
                let x_origin = (x_region * (map_width + 2) + 1) as i32;
                let mut tally = Tally::new(map_width, map_height);
                for walk in [TallyWalk::Up, TallyWalk::Left, TallyWalk::Down, TallyWalk::Right] {
                    self.tally_module_jumps(reg, size, plane, &mut tally, x_origin, y_origin, walk)?;
                }

                for map_row in 0..map_height {
                    for map_col in 0..map_width {
                        let row = y_regions * map_height - (y_region * map_height + map_row) - 1;
                        let col = x_region * map_width + map_col;
                        let idx = row * x_regions * map_width + col;
                        let on = tally.get(map_row, map_col) as f64 / weight_factor as f64 >= 0.5;
                        let color = if on { MODULE_ON_RGB } else { MODULE_OFF };
                        msg.array[idx] = color | MODULE_ASSIGNED;
                    }
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn tally_module_jumps(
        &self,
        reg: &Region,
        size: SymbolSize,
        plane: usize,
        tally: &mut Tally,
        x_origin: i32,
        y_origin: i32,
        walk: TallyWalk,
    ) -> Result<()> {
        let map_width = size.data_region_cols() as i32;
        let map_height = size.data_region_rows() as i32;
        let travel_step = match walk {
            TallyWalk::Up | TallyWalk::Right => 1,
            TallyWalk::Left | TallyWalk::Down => -1,
        };
        let horizontal = matches!(walk, TallyWalk::Left | TallyWalk::Right);

        let (extent, line_start, line_stop, travel_start, travel_stop) = if horizontal {
            let (start, stop) = if travel_step == 1 {
                (x_origin - 1, x_origin + map_width)
            } else {
                (x_origin + map_width, x_origin - 1)
            };
            (map_width, y_origin, y_origin + map_height, start, stop)
        } else {
            let (start, stop) = if travel_step == 1 {
                (y_origin - 1, y_origin + map_height)
            } else {
                (y_origin + map_height, y_origin - 1)
            };
            (map_height, x_origin, x_origin + map_width, start, stop)
        };

        let dark_on_light = reg.off_color > reg.on_color;
        let jump_threshold = ((0.4 * (reg.off_color - reg.on_color) as f64 + 0.5) as i32).abs();
        let read = |line: i32, travel: i32| {
            let color = if horizontal {
                self.read_module_color(reg, size, line, travel, plane)
            } else {
                self.read_module_color(reg, size, travel, line, plane)
            };
            if dark_on_light {
                reg.off_color - color
            } else {
                color - reg.off_color
            }
        };

        for line in line_start..line_stop {
            let mut travel = travel_start;
            let mut t_module = read(line, travel);

            // The leading border module is known: solid finder, or the alternating
            // calibration pattern when walking back from the far side
            let mut on = travel_step == 1 || line & 1 == 0;
            let mut weight = extent;

            loop {
                travel += travel_step;
                if travel == travel_stop {
                    break;
                }
                let t_prev = t_module;
                t_module = read(line, travel);

                on = if on {
                    t_module >= t_prev - jump_threshold
                } else {
                    t_module > t_prev + jump_threshold
                };

                let (map_row, map_col) = if horizontal {
                    (line - y_origin, travel - x_origin)
                } else {
                    (travel - y_origin, line - x_origin)
                };
                if on {
                    tally.add(map_row, map_col, 2 * weight)?;
                }
                weight -= 1;
            }

            if weight != 0 {
                return Err(DmtxError::internal("tally weight did not run out"));
            }
        }
        Ok(())
    }
}
