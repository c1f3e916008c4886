/// Compact on/off grid of symbol modules, row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    cols: usize,
    rows: usize,
    data: Vec<u8>,
}

impl ModuleGrid {
    /// Create an all-off grid with given dimensions
    pub fn new(cols: usize, rows: usize) -> Self {
        let bytes_needed = (cols * rows).div_ceil(8);
        Self {
            cols,
            rows,
            data: vec![0; bytes_needed],
        }
    }

    /// Number of module columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of module rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Module at (col, row); out-of-range reads are off
    pub fn get(&self, col: usize, row: usize) -> bool {
        if col >= self.cols || row >= self.rows {
            return false;
        }
        let index = row * self.cols + col;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Set module at (col, row); out-of-range writes are ignored
    pub fn set(&mut self, col: usize, row: usize, value: bool) {
        if col >= self.cols || row >= self.rows {
            return;
        }
        let index = row * self.cols + col;
        let bit = 1 << (index % 8);
        if value {
            self.data[index / 8] |= bit;
        } else {
            self.data[index / 8] &= !bit;
        }
    }

    /// Count of on modules
    pub fn count_on(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Rows as vectors of booleans, top row first
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        (0..self.rows)
            .map(|row| (0..self.cols).map(|col| self.get(col, row)).collect())
            .collect()
    }

    /// Get raw packed data
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for ModuleGrid {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_grid() {
        let mut grid = ModuleGrid::new(18, 8);
        assert_eq!(grid.cols(), 18);
        assert_eq!(grid.rows(), 8);

        grid.set(17, 7, true);
        assert!(grid.get(17, 7));
        assert!(!grid.get(7, 17));
        assert_eq!(grid.count_on(), 1);

        grid.set(17, 7, false);
        assert_eq!(grid.count_on(), 0);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = ModuleGrid::new(10, 10);
        grid.set(10, 10, true);
        assert!(!grid.get(10, 10));
        assert_eq!(grid.to_rows().len(), 10);
    }
}
