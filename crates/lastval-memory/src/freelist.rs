//! Free list of retired blocks.
//!
//! When a key is overwritten by a value larger than its block's capacity,
//! the old block is retired here. Retired blocks are handed out again on a
//! first-fit basis: the first block whose capacity covers the request is
//! removed whole. Oversized blocks are not split.

use crate::block::Block;
use lastval_common::page::ArenaOffset;

/// Registry of retired arena blocks.
#[derive(Debug, Default)]
pub struct FreeList {
    /// Retired blocks in retirement order.
    blocks: Vec<Block>,
    /// Sum of retired payload capacities.
    total_size: usize,
}

impl FreeList {
    /// Creates an empty free list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retires a block.
    pub fn add(&mut self, offset: ArenaOffset, capacity: usize) {
        self.blocks.push(Block::new(offset, capacity));
        self.total_size += capacity;
    }

    /// Removes and returns the first block that can hold `required` bytes.
    pub fn find_and_remove(&mut self, required: usize) -> Option<Block> {
        let index = self.blocks.iter().position(|block| block.fits(required))?;
        let block = self.blocks.remove(index);
        self.total_size -= block.capacity;
        tracing::trace!(offset = %block.offset, capacity = block.capacity, required, "reusing free block");
        Some(block)
    }

    /// Returns the sum of retired capacities.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Returns the number of retired blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block is retired.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Forgets every retired block.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.total_size = 0;
    }
}
