//! Stored block representation.
//!
//! Every value written to the arena is a block:
//!
//! ```text
//! +----------------------+ offset
//! | capacity: u32        |
//! +----------------------+ offset + 4
//! | payload              |  <- used size <= capacity
//! | (capacity bytes)     |
//! +----------------------+ offset + 4 + capacity
//! ```
//!
//! Capacity is fixed when the block is appended and never shrinks. The used
//! size is not stored; it is derived from the record layout on read.

use lastval_common::page::{ArenaOffset, BLOCK_PREFIX_SIZE};

/// Capacity prefix at the head of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Payload bytes reserved for this block.
    pub capacity: u32,
}

impl BlockHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = BLOCK_PREFIX_SIZE;

    /// Creates a new header.
    pub fn new(capacity: u32) -> Self {
        Self { capacity }
    }

    /// Serializes to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.capacity.to_le_bytes()
    }

    /// Deserializes from bytes.
    pub fn from_bytes(buf: &[u8]) -> Self {
        Self {
            capacity: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
        }
    }
}

/// A block located in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Offset of the block header.
    pub offset: ArenaOffset,
    /// Payload capacity in bytes.
    pub capacity: usize,
}

impl Block {
    /// Creates a block descriptor.
    pub fn new(offset: ArenaOffset, capacity: usize) -> Self {
        Self { offset, capacity }
    }

    /// Returns header plus payload bytes.
    #[inline]
    pub fn footprint(&self) -> usize {
        BlockHeader::SIZE + self.capacity
    }

    /// Returns true if a payload of `size` bytes fits this block.
    #[inline]
    pub fn fits(&self, size: usize) -> bool {
        size <= self.capacity
    }
}

/// Returns the capacity to reserve for a payload of `size` bytes.
///
/// The payload is inflated by `margin_percent` so a later, slightly larger
/// value for the same key still fits in place. The result never exceeds
/// `max_capacity`, so a block always fits a single page.
pub fn inflated_capacity(size: usize, margin_percent: u32, max_capacity: usize) -> usize {
    let margin = size * margin_percent as usize / 100;
    (size + margin).min(max_capacity).max(size)
}
