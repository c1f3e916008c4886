/// Module grids for rendering and placement
pub mod matrix;
/// Codeword buffers of one symbol being decoded
pub mod message;
/// Pixel and floating point coordinates
pub mod point;
/// Located symbol regions and their fitted lines
pub mod region;
/// Symbol size table and size requests
pub mod symbol;

pub use matrix::ModuleGrid;
pub use message::Message;
pub use point::{PixelLoc, Vector2};
pub use region::Region;
pub use symbol::{SizeRequest, SymbolShape, SymbolSize, find_correct_symbol_size};
