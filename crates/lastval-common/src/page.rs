//! Page geometry and arena offset addressing.

use serde::{Deserialize, Serialize};

/// Default page size in bytes (16 KB).
pub const DEFAULT_PAGE_SIZE: usize = 16 * 1024;

/// Smallest accepted page size after rounding.
pub const MIN_PAGE_SIZE: usize = 64;

/// Largest accepted page size after rounding (1 GB).
/// Page offsets and block capacities are stored as u32.
pub const MAX_PAGE_SIZE: usize = 1 << 30;

/// Bytes reserved at the head of every stored block for its capacity.
pub const BLOCK_PREFIX_SIZE: usize = 4;

/// Rounds `value` up to the next power of two. Zero rounds to one.
pub fn ceil_pow2(value: usize) -> usize {
    value.max(1).next_power_of_two()
}

/// Logical offset of a block inside the page arena.
///
/// Decomposes into a page index (high bits) and an offset within that page
/// (low bits); the split point is given by [`PageGeometry::bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ArenaOffset(pub u64);

impl ArenaOffset {
    /// First offset in the arena.
    pub const ZERO: ArenaOffset = ArenaOffset(0);

    /// Returns the offset advanced by the given number of bytes.
    pub fn advance(&self, bytes: usize) -> Self {
        Self(self.0 + bytes as u64)
    }
}

impl std::fmt::Display for ArenaOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Power-of-two page geometry.
///
/// All offset arithmetic is shift/mask based, so the page size is always a
/// power of two and never changes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    page_size: usize,
    bits: u32,
    mask: u64,
}

impl PageGeometry {
    /// Creates a geometry for the requested page size, rounded up to the next
    /// power of two.
    pub fn new(requested_page_size: usize) -> Self {
        let page_size = ceil_pow2(requested_page_size);
        Self {
            page_size,
            bits: page_size.trailing_zeros(),
            mask: (page_size - 1) as u64,
        }
    }

    /// Returns the page size in bytes.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns log2 of the page size.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns the mask selecting the in-page part of an offset.
    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Returns the largest payload that can be stored in one page.
    #[inline]
    pub fn max_record_size(&self) -> usize {
        self.page_size.saturating_sub(BLOCK_PREFIX_SIZE)
    }

    /// Returns the page index part of an offset.
    #[inline(always)]
    pub fn page_index(&self, offset: ArenaOffset) -> usize {
        (offset.0 >> self.bits) as usize
    }

    /// Returns the in-page part of an offset.
    #[inline(always)]
    pub fn page_offset(&self, offset: ArenaOffset) -> usize {
        (offset.0 & self.mask) as usize
    }

    /// Composes an offset from a page index and an in-page offset.
    #[inline(always)]
    pub fn offset_of(&self, page_index: usize, page_offset: usize) -> ArenaOffset {
        debug_assert!(page_offset < self.page_size);
        ArenaOffset(((page_index as u64) << self.bits) | page_offset as u64)
    }
}
