use crate::error::{DmtxError, Result};
use crate::models::PixelLoc;

/// Outcome of [`ScanGrid::pop_location`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStatus {
    /// Next seed location
    Good(PixelLoc),
    /// Every location down to the minimum extent has been produced
    End,
}

/// Seed enumerator that covers the search area with nested crosses of shrinking size.
///
/// The first cross spans the whole area through its centre; each following level halves
/// the extent and quadruples the number of crosses, so coarse structure is probed before
/// fine detail.
#[derive(Debug, Clone)]
pub struct ScanGrid {
    min_extent: i32,
    max_extent: i32,
    x_offset: i32,
    y_offset: i32,
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
    total: i32,
    extent: i32,
    jump_size: i32,
    pixel_total: i32,
    start_pos: i32,
    pixel_count: i32,
    x_center: i32,
    y_center: i32,
}

impl ScanGrid {
    /// Grid over the inclusive range `[x_min, x_max] x [y_min, y_max]`; crosses smaller than
    /// `scan_gap` are never visited
    pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32, scan_gap: i32) -> Result<Self> {
        let span = (x_max - x_min).max(y_max - y_min);
        if span < 1 {
            return Err(DmtxError::InvalidSettings("scan area must span at least two pixels"));
        }

        // Extents run 1, 3, 7, 15, ...; the top level must cover span + 1 points
        let mut extent = 1;
        let mut min_extent = 1;
        while extent < span + 1 {
            if extent <= scan_gap {
                min_extent = extent;
            }
            extent = (extent + 1) * 2 - 1;
        }
        if extent <= scan_gap {
            min_extent = extent;
        }
        let max_extent = extent;

        let mut grid = Self {
            min_extent,
            max_extent,
            x_offset: (x_min + x_max - max_extent) / 2,
            y_offset: (y_min + y_max - max_extent) / 2,
            x_min,
            x_max,
            y_min,
            y_max,
            total: 1,
            extent: max_extent,
            jump_size: 0,
            pixel_total: 0,
            start_pos: 0,
            pixel_count: 0,
            x_center: 0,
            y_center: 0,
        };
        grid.set_derived_fields();
        Ok(grid)
    }

    /// Number of crosses at the current level
    pub fn crosses_at_level(&self) -> i32 {
        self.total
    }

    /// Next in-range seed, or [`GridStatus::End`]
    pub fn pop_location(&mut self) -> GridStatus {
        loop {
            let status = self.grid_coordinates();
            self.pixel_count += 1;
            match status {
                Some(status) => return status,
                None => continue,
            }
        }
    }

    fn set_derived_fields(&mut self) {
        self.jump_size = self.extent + 1;
        self.pixel_total = 2 * self.extent - 1;
        self.start_pos = self.extent / 2;
        self.pixel_count = 0;
        self.x_center = self.start_pos;
        self.y_center = self.start_pos;
    }

    /// Location at the current cursor; `None` when it falls outside the search area
    fn grid_coordinates(&mut self) -> Option<GridStatus> {
        if self.pixel_count >= self.pixel_total {
            self.pixel_count = 0;
            self.x_center += self.jump_size;
        }
        if self.x_center > self.max_extent {
            self.x_center = self.start_pos;
            self.y_center += self.jump_size;
        }
        if self.y_center > self.max_extent {
            self.total *= 4;
            self.extent /= 2;
            self.set_derived_fields();
        }

        if self.extent == 0 || self.extent < self.min_extent {
            return Some(GridStatus::End);
        }

        let count = self.pixel_count;
        let (x, y) = if count == self.pixel_total - 1 {
            (self.x_center, self.y_center)
        } else {
            let half = self.pixel_total / 2;
            let quarter = half / 2;
            if count < half {
                let dx = if count < quarter { count - quarter } else { half - count };
                (self.x_center + dx, self.y_center)
            } else {
                let count = count - half;
                let dy = if count < quarter { count - quarter } else { half - count };
                (self.x_center, self.y_center + dy)
            }
        };

        let loc = PixelLoc::new(x + self.x_offset, y + self.y_offset);
        if loc.x < self.x_min || loc.x > self.x_max || loc.y < self.y_min || loc.y > self.y_max {
            return None;
        }
        Some(GridStatus::Good(loc))
    }
}

impl Iterator for ScanGrid {
    type Item = PixelLoc;

    fn next(&mut self) -> Option<PixelLoc> {
        match self.pop_location() {
            GridStatus::Good(loc) => Some(loc),
            GridStatus::End => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn visit_counts(grid: ScanGrid) -> HashMap<PixelLoc, usize> {
        let mut counts = HashMap::new();
        for loc in grid {
            *counts.entry(loc).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_full_coverage() {
        let grid = ScanGrid::new(0, 9, 0, 6, 1).unwrap();
        let counts = visit_counts(grid);
        assert_eq!(counts.len(), 70);
        assert!(counts.values().all(|&c| c == 1));
    }

    #[test]
    fn test_power_of_two_span() {
        // 8 columns: span of exactly 2^3 - 1
        let counts = visit_counts(ScanGrid::new(0, 7, 0, 7, 1).unwrap());
        assert_eq!(counts.len(), 64);
        assert!(counts.values().all(|&c| c == 1));
    }

    #[test]
    fn test_offset_region() {
        let counts = visit_counts(ScanGrid::new(5, 12, 20, 24, 1).unwrap());
        assert_eq!(counts.len(), 8 * 5);
        assert!(counts.keys().all(|l| (5..=12).contains(&l.x) && (20..=24).contains(&l.y)));
    }

    #[test]
    fn test_first_seed_is_centre() {
        let mut grid = ScanGrid::new(0, 100, 0, 100, 1).unwrap();
        let first = grid.next().unwrap();
        assert_eq!(first.y, 50);
    }

    #[test]
    fn test_scan_gap_skips_fine_levels() {
        let coarse = visit_counts(ScanGrid::new(0, 63, 0, 63, 8).unwrap()).len();
        let fine = visit_counts(ScanGrid::new(0, 63, 0, 63, 1).unwrap()).len();
        assert!(coarse < fine);
        assert_eq!(fine, 64 * 64);
    }

    #[test]
    fn test_degenerate_area_rejected() {
        assert!(ScanGrid::new(3, 3, 4, 4, 1).is_err());
    }
}
