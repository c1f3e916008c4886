//! ECC200 module placement
//!
//! Codewords are laid into the mapping matrix along diagonal sweeps, eight modules per
//! codeword in the "utah" shape. The walk is shared: cells already assigned are read back
//! into codewords, unassigned cells are written from them.

use crate::error::{DmtxError, Result};
use crate::models::message::{MODULE_ASSIGNED, MODULE_ON_RGB, MODULE_VISITED};
use crate::models::SymbolSize;

/// Standard utah shape relative to its anchor, bit 1 (MSB) first
const UTAH: [(i32, i32); 8] = [
    (-2, -2),
    (-2, -1),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (0, -2),
    (0, -1),
    (0, 0),
];

/// Cell of a corner shape; negative coordinates count back from the matrix end
type Corner = [(i32, i32); 8];

const CORNER_1: Corner = [(-1, 0), (-1, 1), (-1, 2), (0, -2), (0, -1), (1, -1), (2, -1), (3, -1)];
const CORNER_2: Corner = [(-3, 0), (-2, 0), (-1, 0), (0, -4), (0, -3), (0, -2), (0, -1), (1, -1)];
const CORNER_3: Corner = [(-3, 0), (-2, 0), (-1, 0), (0, -2), (0, -1), (1, -1), (2, -1), (3, -1)];
const CORNER_4: Corner = [(-1, 0), (-1, -1), (0, -3), (0, -2), (0, -1), (1, -3), (1, -2), (1, -1)];

struct Placement<'a> {
    modules: &'a mut [u8],
    codewords: &'a mut [u8],
    rows: i32,
    cols: i32,
    on_color: u8,
}

impl Placement<'_> {
    fn index(&self, row: i32, col: i32) -> usize {
        (row * self.cols + col) as usize
    }

    fn visited(&self, row: i32, col: i32) -> bool {
        self.modules[self.index(row, col)] & MODULE_VISITED != 0
    }

    /// Read or write one bit of codeword `chr`, wrapping coordinates that fall off the
    /// top or left edge around to the opposite side
    fn place_module(&mut self, mut row: i32, mut col: i32, chr: usize, mask: u8) -> Result<()> {
        if row < 0 {
            row += self.rows;
            col += 4 - ((self.rows + 4) % 8);
        }
        if col < 0 {
            col += self.cols;
            row += 4 - ((self.cols + 4) % 8);
        }
        if !(0..self.rows).contains(&row) || !(0..self.cols).contains(&col) {
            return Err(DmtxError::internal("module placement left the mapping matrix"));
        }
        let idx = self.index(row, col);
        let word = self
            .codewords
            .get_mut(chr)
            .ok_or_else(|| DmtxError::internal("module placement ran out of codewords"))?;

        let cell = &mut self.modules[idx];
        if *cell & MODULE_ASSIGNED != 0 {
            if *cell & self.on_color != 0 {
                *word |= mask;
            } else {
                *word &= !mask;
            }
        } else {
            if *word & mask != 0 {
                *cell |= self.on_color;
            }
            *cell |= MODULE_ASSIGNED;
        }
        *cell |= MODULE_VISITED;
        Ok(())
    }

    fn utah(&mut self, row: i32, col: i32, chr: usize) -> Result<()> {
        for (bit, (dr, dc)) in UTAH.iter().enumerate() {
            self.place_module(row + dr, col + dc, chr, 0x80 >> bit)?;
        }
        Ok(())
    }

    fn corner(&mut self, shape: &Corner, chr: usize) -> Result<()> {
        for (bit, &(r, c)) in shape.iter().enumerate() {
            let row = if r < 0 { self.rows + r } else { r };
            let col = if c < 0 { self.cols + c } else { c };
            self.place_module(row, col, chr, 0x80 >> bit)?;
        }
        Ok(())
    }
}

/// Walk the mapping matrix of `size`, reading assigned modules into `codewords` and writing
/// `codewords` into unassigned ones with `on_color`. Returns the number of codewords walked.
pub fn module_placement(
    modules: &mut [u8],
    codewords: &mut [u8],
    size: SymbolSize,
    on_color: u8,
) -> Result<usize> {
    if on_color & MODULE_ON_RGB == 0 {
        return Err(DmtxError::internal("module placement needs an on colour"));
    }
    let rows = size.mapping_rows() as i32;
    let cols = size.mapping_cols() as i32;
    if modules.len() != (rows * cols) as usize {
        return Err(DmtxError::internal("module array does not match symbol size"));
    }

    let mut p = Placement {
        modules,
        codewords,
        rows,
        cols,
        on_color,
    };

    let mut chr = 0usize;
    let mut row = 4;
    let mut col = 0;
    loop {
        if row == rows && col == 0 {
            p.corner(&CORNER_1, chr)?;
            chr += 1;
        } else if row == rows - 2 && col == 0 && cols % 4 != 0 {
            p.corner(&CORNER_2, chr)?;
            chr += 1;
        } else if row == rows - 2 && col == 0 && cols % 8 == 4 {
            p.corner(&CORNER_3, chr)?;
            chr += 1;
        } else if row == rows + 4 && col == 2 && cols % 8 == 0 {
            p.corner(&CORNER_4, chr)?;
            chr += 1;
        }

        // Up and to the right
        loop {
            if row < rows && col >= 0 && !p.visited(row, col) {
                p.utah(row, col, chr)?;
                chr += 1;
            }
            row -= 2;
            col += 2;
            if !(row >= 0 && col < cols) {
                break;
            }
        }
        row += 1;
        col += 3;

        // Down and to the left
        loop {
            if row >= 0 && col < cols && !p.visited(row, col) {
                p.utah(row, col, chr)?;
                chr += 1;
            }
            row += 2;
            col -= 2;
            if !(row < rows && col >= 0) {
                break;
            }
        }
        row += 3;
        col += 1;

        if !(row < rows || col < cols) {
            break;
        }
    }

    // Fixed pattern in the untouched bottom-right corner
    let last = (rows * cols - 1) as usize;
    if p.modules[last] & MODULE_VISITED == 0 {
        p.modules[last] |= on_color;
        p.modules[last - cols as usize - 1] |= on_color;
    }

    Ok(chr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cell_visited_once() {
        for size in SymbolSize::all() {
            let cells = size.mapping_rows() * size.mapping_cols();
            let mut modules = vec![0u8; cells];
            let mut code = vec![0xffu8; size.total_words()];
            let placed = module_placement(&mut modules, &mut code, size, MODULE_ON_RGB).unwrap();
            assert_eq!(placed, size.total_words(), "{size}");

            let unvisited = modules.iter().filter(|&&m| m & MODULE_VISITED == 0).count();
            assert!(unvisited == 0 || unvisited == 4, "{size}: {unvisited}");
        }
    }

    #[test]
    fn test_write_then_read_back() {
        let size = SymbolSize::from_dimensions(16, 48).unwrap();
        let original: Vec<u8> = (0..size.total_words()).map(|i| (i * 37 + 11) as u8).collect();
        let mut code = original.clone();
        let mut modules = vec![0u8; size.mapping_rows() * size.mapping_cols()];
        module_placement(&mut modules, &mut code, size, MODULE_ON_RGB).unwrap();

        // Reading a fresh copy of the written grid recovers the codewords
        let mut read_modules: Vec<u8> = modules
            .iter()
            .map(|&m| (m & MODULE_ON_RGB) | MODULE_ASSIGNED)
            .collect();
        let mut read = vec![0u8; size.total_words()];
        module_placement(&mut read_modules, &mut read, size, MODULE_ON_RGB).unwrap();
        assert_eq!(read, original);
    }

    #[test]
    fn test_corner_fill_pattern() {
        // 10x10: 8x8 mapping matrix, 64 cells for 8 codewords, nothing left over
        let size = SymbolSize::SQUARE_10X10;
        let mut modules = vec![0u8; 64];
        let mut code = vec![0u8; size.total_words()];
        module_placement(&mut modules, &mut code, size, MODULE_ON_RGB).unwrap();
        assert!(modules.iter().all(|&m| m & MODULE_VISITED != 0));

        // 12x12: 10x10 mapping matrix with 96 bits, the 2x2 corner is fixed
        let size = SymbolSize::from_dimensions(12, 12).unwrap();
        let mut modules = vec![0u8; 100];
        let mut code = vec![0u8; size.total_words()];
        module_placement(&mut modules, &mut code, size, MODULE_ON_RGB).unwrap();
        assert_eq!(modules[99] & MODULE_ON_RGB, MODULE_ON_RGB);
        assert_eq!(modules[88] & MODULE_ON_RGB, MODULE_ON_RGB);
        assert_eq!(modules[89] & MODULE_ON_RGB, 0);
        assert_eq!(modules[98] & MODULE_ON_RGB, 0);
    }
}
