//! Reusable scratch cache buffers
//!
//! A decode session needs one cache cell per scaled pixel. Batch and repeated decodes hand
//! the buffer back here so the next session skips the allocation.

use crate::detector::cache::CacheCell;

/// Pool of scratch cache buffers
pub struct CachePool {
    buffers: Vec<Vec<CacheCell>>,
    capacity: usize,
}

impl CachePool {
    /// Create a pool sized for images up to 1080p
    pub fn new() -> Self {
        Self::with_capacity(1920 * 1080)
    }

    /// Create a pool whose fresh buffers reserve `capacity` cells
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffers: Vec::new(),
            capacity,
        }
    }

    /// Take a buffer able to hold at least `cells` entries (contents unspecified)
    pub fn take(&mut self, cells: usize) -> Vec<CacheCell> {
        match self.buffers.pop() {
            Some(mut buffer) => {
                if buffer.capacity() < cells {
                    buffer.reserve(cells.saturating_sub(buffer.len()));
                    self.capacity = self.capacity.max(cells);
                }
                buffer
            }
            None => {
                self.capacity = self.capacity.max(cells);
                Vec::with_capacity(self.capacity)
            }
        }
    }

    /// Return a buffer for later reuse
    pub fn give_back(&mut self, buffer: Vec<CacheCell>) {
        self.buffers.push(buffer);
    }

    /// Number of idle buffers
    pub fn idle(&self) -> usize {
        self.buffers.len()
    }

    /// Cell capacity of freshly allocated buffers
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all idle buffers
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

impl Default for CachePool {
    fn default() -> Self {
        Self::new()
    }
}
