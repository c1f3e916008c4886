use crate::error::Result;
use crate::models::PixelLoc;
use crate::utils::bresenham::BresLine;

/// Per-pixel scratch state of the edge tracer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheCell {
    /// Pixel belongs to the trail being blazed, or to an already decoded symbol
    pub visited: bool,
    /// Pixel is part of a kept trail
    pub assigned: bool,
    /// Octant the trail arrived from
    pub upstream: Option<u8>,
    /// Octant the trail continues toward
    pub downstream: Option<u8>,
}

impl CacheCell {
    /// Untouched cell
    pub fn is_empty(&self) -> bool {
        *self == CacheCell::default()
    }
}

/// Scratch cache covering the scaled image, one cell per pixel
#[derive(Debug, Clone, Default)]
pub struct Cache {
    width: i32,
    height: i32,
    cells: Vec<CacheCell>,
}

impl Cache {
    /// Wrap a cell buffer, resizing and clearing it for `width` x `height`
    pub fn from_cells(mut cells: Vec<CacheCell>, width: i32, height: i32) -> Self {
        cells.clear();
        cells.resize((width.max(0) * height.max(0)) as usize, CacheCell::default());
        Self {
            width,
            height,
            cells,
        }
    }

    /// Give back the cell buffer for reuse
    pub fn into_cells(self) -> Vec<CacheCell> {
        self.cells
    }

    fn index(&self, loc: PixelLoc) -> Option<usize> {
        if loc.x < 0 || loc.y < 0 || loc.x >= self.width || loc.y >= self.height {
            return None;
        }
        Some((loc.y * self.width + loc.x) as usize)
    }

    /// Whether `loc` lies inside the cache
    pub fn contains(&self, loc: PixelLoc) -> bool {
        self.index(loc).is_some()
    }

    /// Cell at `loc`
    pub fn get(&self, loc: PixelLoc) -> Option<&CacheCell> {
        self.index(loc).map(|i| &self.cells[i])
    }

    /// Mutable cell at `loc`
    pub fn get_mut(&mut self, loc: PixelLoc) -> Option<&mut CacheCell> {
        self.index(loc).map(|i| &mut self.cells[i])
    }

    /// Mark every cell inside the quadrilateral `p0 p1 p2 p3` as visited so no later seed
    /// starts inside an already decoded symbol
    pub fn fill_quad(&mut self, corners: [PixelLoc; 4]) -> Result<()> {
        let x_max = self.width - 1;
        let y_max = self.height - 1;
        let min_y = corners.iter().map(|p| p.y).fold(y_max, i32::min);
        let max_y = corners.iter().map(|p| p.y).fold(0, i32::max);
        if max_y < min_y {
            return Ok(());
        }

        let rows = (max_y - min_y + 1) as usize;
        let mut scan_min = vec![x_max; rows];
        let mut scan_max = vec![0; rows];

        for i in 0..4 {
            let (from, to) = (corners[i], corners[(i + 1) % 4]);
            let mut line = BresLine::new(from, to, PixelLoc::new(0, 0));
            while line.loc() != line.loc1() {
                let idx = (line.loc().y - min_y) as usize;
                scan_min[idx] = scan_min[idx].min(line.loc().x);
                scan_max[idx] = scan_max[idx].max(line.loc().x);
                line.step(1, 0)?;
            }
        }

        for y in min_y.max(0)..=max_y.min(y_max) {
            let idx = (y - min_y) as usize;
            for x in scan_min[idx].max(0)..=scan_max[idx].min(x_max) {
                if let Some(cell) = self.get_mut(PixelLoc::new(x, y)) {
                    cell.visited = true;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_bounds() {
        let mut cache = Cache::from_cells(Vec::new(), 4, 3);
        assert!(cache.get(PixelLoc::new(3, 2)).is_some());
        assert!(cache.get(PixelLoc::new(4, 0)).is_none());
        assert!(cache.get(PixelLoc::new(0, -1)).is_none());

        let cell = cache.get_mut(PixelLoc::new(1, 1)).unwrap();
        cell.upstream = Some(3);
        assert!(!cache.get(PixelLoc::new(1, 1)).unwrap().is_empty());
    }

    #[test]
    fn test_reused_cells_are_cleared() {
        let mut cache = Cache::from_cells(Vec::new(), 2, 2);
        cache.get_mut(PixelLoc::new(0, 0)).unwrap().visited = true;
        let reused = Cache::from_cells(cache.into_cells(), 3, 3);
        assert!(reused.get(PixelLoc::new(0, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_fill_quad_marks_interior() {
        let mut cache = Cache::from_cells(Vec::new(), 20, 20);
        let corners = [
            PixelLoc::new(2, 2),
            PixelLoc::new(12, 2),
            PixelLoc::new(12, 12),
            PixelLoc::new(2, 12),
        ];
        cache.fill_quad(corners).unwrap();
        assert!(cache.get(PixelLoc::new(7, 7)).unwrap().visited);
        assert!(cache.get(PixelLoc::new(2, 2)).unwrap().visited);
        assert!(!cache.get(PixelLoc::new(15, 7)).unwrap().visited);
        assert!(!cache.get(PixelLoc::new(7, 13)).unwrap().visited);
    }

    #[test]
    fn test_fill_quad_covers_last_row_and_column() {
        let mut cache = Cache::from_cells(Vec::new(), 20, 20);
        let corners = [
            PixelLoc::new(2, 2),
            PixelLoc::new(12, 2),
            PixelLoc::new(12, 12),
            PixelLoc::new(2, 12),
        ];
        cache.fill_quad(corners).unwrap();
        for i in 2..=12 {
            assert!(cache.get(PixelLoc::new(12, i)).unwrap().visited, "column at y={i}");
            assert!(cache.get(PixelLoc::new(i, 12)).unwrap().visited, "row at x={i}");
        }
        assert!(!cache.get(PixelLoc::new(13, 12)).unwrap().visited);
        assert!(!cache.get(PixelLoc::new(12, 13)).unwrap().visited);
    }

    #[test]
    fn test_fill_quad_clips_to_cache() {
        let mut cache = Cache::from_cells(Vec::new(), 10, 10);
        let corners = [
            PixelLoc::new(-5, -5),
            PixelLoc::new(15, -5),
            PixelLoc::new(15, 15),
            PixelLoc::new(-5, 15),
        ];
        cache.fill_quad(corners).unwrap();
        assert!(cache.get(PixelLoc::new(0, 0)).unwrap().visited);
        assert!(cache.get(PixelLoc::new(9, 9)).unwrap().visited);
    }
}
