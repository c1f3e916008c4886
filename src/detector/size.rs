use super::RegionScanner;
use crate::models::{Region, SymbolSize, Vector2};

/// Sample offsets within a module: centre plus four points 0.1 module away
const SAMPLE_X: [f64; 5] = [0.5, 0.4, 0.5, 0.6, 0.5];
const SAMPLE_Y: [f64; 5] = [0.5, 0.5, 0.4, 0.5, 0.6];

/// Direction of a jump tally walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TallyDir {
    Right,
    Up,
}

impl RegionScanner<'_> {
    /// Average colour of module (`symbol_row`, `symbol_col`) over five samples.
    ///
    /// Rows count up from the finder's bottom leg; row or column -1 and the symbol dimension
    /// address the quiet zone just outside. Samples falling outside the image count as 0.
    pub(crate) fn read_module_color(
        &self,
        reg: &Region,
        size: SymbolSize,
        symbol_row: i32,
        symbol_col: i32,
        plane: usize,
    ) -> i32 {
        let rows = size.rows() as f64;
        let cols = size.cols() as f64;
        let mut color = 0;
        for (sx, sy) in SAMPLE_X.iter().zip(SAMPLE_Y.iter()) {
            let p = Vector2::new(
                (symbol_col as f64 + sx) / cols,
                (symbol_row as f64 + sy) / rows,
            );
            let Some(p) = reg.fit2raw.apply(p) else {
                continue;
            };
            let loc = p.to_pixel();
            color += self.pixel(loc.x, loc.y, plane).unwrap_or(0);
        }
        color / 5
    }

    /// Count on/off transitions walking from (`x_start`, `y_start`) to the symbol edge.
    ///
    /// Walks starting just outside the symbol begin in the off state, all others in the on
    /// state. One of the start coordinates must be zero.
    pub(crate) fn count_jump_tally(
        &self,
        reg: &Region,
        size: SymbolSize,
        x_start: i32,
        y_start: i32,
        dir: TallyDir,
    ) -> i32 {
        debug_assert!(x_start == 0 || y_start == 0);
        let rows = size.rows() as i32;
        let cols = size.cols() as i32;
        let plane = reg.flow_begin.plane;
        let (x_inc, y_inc) = match dir {
            TallyDir::Right => (1, 0),
            TallyDir::Up => (0, 1),
        };

        let mut on = !(x_start == -1 || x_start == cols || y_start == -1 || y_start == rows);

        let dark_on_light = reg.off_color > reg.on_color;
        let jump_threshold = ((0.4 * (reg.on_color - reg.off_color) as f64 + 0.5) as i32).abs();
        let contrast = |color: i32| {
            if dark_on_light {
                reg.off_color - color
            } else {
                color - reg.off_color
            }
        };

        let mut t_module = contrast(self.read_module_color(reg, size, y_start, x_start, plane));
        let mut jumps = 0;
        let (mut x, mut y) = (x_start + x_inc, y_start + y_inc);
        while (dir == TallyDir::Right && x < cols) || (dir == TallyDir::Up && y < rows) {
            let t_prev = t_module;
            t_module = contrast(self.read_module_color(reg, size, y, x, plane));
            if on {
                if t_module < t_prev - jump_threshold {
                    jumps += 1;
                    on = false;
                }
            } else if t_module > t_prev + jump_threshold {
                jumps += 1;
                on = true;
            }
            x += x_inc;
            y += y_inc;
        }
        jumps
    }

    /// Pick the candidate size with the strongest calibration contrast, then confirm it
    /// by counting jumps along the border and the quiet zone around it
    pub(crate) fn find_size(&self, reg: &mut Region) -> bool {
        let plane = reg.flow_begin.plane;
        let mut best: Option<(SymbolSize, i32, i32, i32)> = None;

        for size in self.settings.size_request.candidates() {
            let rows = size.rows() as i32;
            let cols = size.cols() as i32;
            let (mut on_sum, mut off_sum) = (0, 0);

            for col in 0..cols {
                let color = self.read_module_color(reg, size, rows - 1, col, plane);
                if col & 1 != 0 {
                    off_sum += color;
                } else {
                    on_sum += color;
                }
            }
            for row in 0..rows {
                let color = self.read_module_color(reg, size, row, cols - 1, plane);
                if row & 1 != 0 {
                    off_sum += color;
                } else {
                    on_sum += color;
                }
            }

            let on_avg = on_sum * 2 / (rows + cols);
            let off_avg = off_sum * 2 / (rows + cols);
            let contrast = (on_avg - off_avg).abs();
            if contrast < 20 {
                continue;
            }
            if best.is_none_or(|(_, c, _, _)| contrast > c) {
                best = Some((size, contrast, on_avg, off_avg));
            }
        }

        let Some((size, contrast, on_avg, off_avg)) = best else {
            return false;
        };
        reg.size = Some(size);
        reg.on_color = on_avg;
        reg.off_color = off_avg;

        let rows = size.rows() as i32;
        let cols = size.cols() as i32;

        // Calibration bars alternate every module
        let jumps = self.count_jump_tally(reg, size, 0, rows - 1, TallyDir::Right);
        if (1 + jumps - cols).abs() > 2 {
            return self.reject(reg, "top calibration bar");
        }
        let jumps = self.count_jump_tally(reg, size, cols - 1, 0, TallyDir::Up);
        if (1 + jumps - rows).abs() > 2 {
            return self.reject(reg, "right calibration bar");
        }

        // Finder legs and the quiet zone around the symbol are solid
        let solid = [
            (0, 0, TallyDir::Right),
            (0, 0, TallyDir::Up),
            (0, -1, TallyDir::Right),
            (-1, 0, TallyDir::Up),
            (0, rows, TallyDir::Right),
            (cols, 0, TallyDir::Up),
        ];
        for (x, y, dir) in solid {
            if self.count_jump_tally(reg, size, x, y, dir) > 2 {
                return self.reject(reg, "solid border");
            }
        }

        tracing::trace!(%size, contrast, "symbol size resolved");
        true
    }

    fn reject(&self, reg: &mut Region, what: &'static str) -> bool {
        if crate::debug::debug_enabled() {
            tracing::debug!(what, size = ?reg.size, "size check failed");
        }
        reg.size = None;
        false
    }
}
