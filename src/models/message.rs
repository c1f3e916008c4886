use super::symbol::SymbolSize;

/// Module is off in every plane
pub const MODULE_OFF: u8 = 0x00;
/// Module is on in the red plane
pub const MODULE_ON_RED: u8 = 0x01;
/// Module is on in the green plane
pub const MODULE_ON_GREEN: u8 = 0x02;
/// Module is on in the blue plane
pub const MODULE_ON_BLUE: u8 = 0x04;
/// Module is on in all planes
pub const MODULE_ON_RGB: u8 = 0x07;
/// Module value has been decided
pub const MODULE_ASSIGNED: u8 = 0x10;
/// Module has been consumed by the placement walk
pub const MODULE_VISITED: u8 = 0x20;
/// Module carries data (as opposed to a finder or calibration module)
pub const MODULE_DATA: u8 = 0x40;

/// Codewords and module states of one symbol
#[derive(Debug, Clone)]
pub struct Message {
    /// Symbol size this message is laid out for
    pub size: SymbolSize,
    /// Module flags, mapping rows x mapping cols, row 0 at the top of the mapping matrix
    pub array: Vec<u8>,
    /// Data codewords followed by interleaved error codewords
    pub code: Vec<u8>,
    /// Decoded output bytes
    pub output: Vec<u8>,
    /// Number of pad codewords found while decoding
    pub pad_count: usize,
}

impl Message {
    /// Empty message sized for `size`
    pub fn new(size: SymbolSize) -> Self {
        let array_len = size.mapping_rows() * size.mapping_cols();
        Self {
            size,
            array: vec![0; array_len],
            code: vec![0; size.total_words()],
            output: Vec::new(),
            pad_count: 0,
        }
    }

    /// Number of data codewords (without error words)
    pub fn data_words(&self) -> usize {
        self.size.data_words()
    }

    /// Module flags of the full symbol at (`symbol_row`, `symbol_col`), row 0 at the bottom.
    ///
    /// Finder and calibration modules are resolved from the symbol geometry and never carry
    /// [`MODULE_DATA`]. Data modules return the mapping array entry with [`MODULE_DATA`] set.
    pub fn symbol_module_status(&self, symbol_row: usize, symbol_col: usize) -> u8 {
        let region_rows = self.size.data_region_rows();
        let region_cols = self.size.data_region_cols();

        if symbol_row % (region_rows + 2) == 0 || symbol_col % (region_cols + 2) == 0 {
            return MODULE_ON_RGB;
        }

        if (symbol_row + 1) % (region_rows + 2) == 0 {
            return if symbol_col & 1 != 0 { MODULE_OFF } else { MODULE_ON_RGB };
        }

        if (symbol_col + 1) % (region_cols + 2) == 0 {
            return if symbol_row & 1 != 0 { MODULE_OFF } else { MODULE_ON_RGB };
        }

        let row_reverse = self.size.rows() - symbol_row - 1;
        let mapping_row = row_reverse - 1 - 2 * (row_reverse / (region_rows + 2));
        let mapping_col = symbol_col - 1 - 2 * (symbol_col / (region_cols + 2));
        self.array[mapping_row * self.size.mapping_cols() + mapping_col] | MODULE_DATA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_dimensions() {
        let msg = Message::new(SymbolSize::SQUARE_10X10);
        assert_eq!(msg.array.len(), 64);
        assert_eq!(msg.code.len(), 8);
        assert_eq!(msg.data_words(), 3);
    }

    #[test]
    fn test_finder_and_calibration_status() {
        let msg = Message::new(SymbolSize::SQUARE_10X10);
        // Bottom row and left column are solid
        for i in 0..10 {
            assert_eq!(msg.symbol_module_status(0, i), MODULE_ON_RGB);
            assert_eq!(msg.symbol_module_status(i, 0), MODULE_ON_RGB);
        }
        // Top row alternates starting on
        assert_eq!(msg.symbol_module_status(9, 2), MODULE_ON_RGB);
        assert_eq!(msg.symbol_module_status(9, 3), MODULE_OFF);
        // Right column alternates starting on at the bottom
        assert_eq!(msg.symbol_module_status(2, 9), MODULE_ON_RGB);
        assert_eq!(msg.symbol_module_status(3, 9), MODULE_OFF);
    }

    #[test]
    fn test_data_module_status_reads_array() {
        let mut msg = Message::new(SymbolSize::SQUARE_10X10);
        // Top-left data module of the symbol maps to mapping (0, 0)
        msg.array[0] = MODULE_ON_RGB;
        assert_eq!(msg.symbol_module_status(8, 1), MODULE_ON_RGB | MODULE_DATA);
        assert_eq!(msg.symbol_module_status(1, 1), MODULE_DATA);
    }

    #[test]
    fn test_multi_region_calibration() {
        // 32x32 has 2x2 regions of 14x14
        let size = SymbolSize::from_dimensions(32, 32).unwrap();
        let msg = Message::new(size);
        assert_eq!(msg.symbol_module_status(16, 5), MODULE_ON_RGB);
        assert_eq!(msg.symbol_module_status(15, 4), MODULE_ON_RGB);
        assert_eq!(msg.symbol_module_status(15, 5), MODULE_OFF);
        assert_eq!(msg.symbol_module_status(5, 16), MODULE_ON_RGB);
    }
}
