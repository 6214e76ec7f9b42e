//! Scratch memory held back for the fatal path.
//!
//! Fatal faults are often out-of-memory conditions. Holding a reserve from
//! registration time and dropping it before fatal handling starts gives the
//! handlers some headroom to allocate in.

use std::collections::TryReserveError;

/// Pre-allocated buffer released exactly once before fatal handling.
#[derive(Debug, Default)]
pub struct MemoryReserve {
    buffer: Vec<u8>,
}

impl MemoryReserve {
    /// Allocates and touches `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error when the memory cannot be reserved.
    pub fn allocate(size: usize) -> Result<Self, TryReserveError> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size)?;
        // Writing every byte commits the pages instead of leaving them lazily
        // mapped.
        buffer.resize(size, 0);
        Ok(Self { buffer })
    }

    /// Number of bytes currently held.
    #[must_use]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` while bytes are held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Frees the reserve and returns how many bytes were released.
    pub fn release(&mut self) -> usize {
        let released = self.buffer.len();
        self.buffer = Vec::new();
        released
    }
}
