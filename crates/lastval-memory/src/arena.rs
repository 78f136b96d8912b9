//! Page arena for stored values.
//!
//! The arena is a growable list of fixed-size, power-of-two pages. Blocks
//! are appended at a monotonically increasing cursor; a block never spans
//! two pages. When a block does not fit the rest of the current page the
//! cursor skips to the start of the next page and the tail is abandoned.
//!
//! ```text
//! offset = (page_index << bits) | page_offset
//!
//!  page 0                      page 1
//! +------+------+-------+---+  +------+------------------+
//! | blk  | blk  | blk   |///|  | blk  |     (free)       |
//! +------+------+-------+---+  +------+------------------+
//!                       ^ abandoned tail  ^ append cursor
//! ```

use crate::block::{Block, BlockHeader};
use lastval_common::page::{ArenaOffset, PageGeometry};
use lastval_common::{LastValError, Result};

/// Page-based byte arena.
///
/// Pages are allocated on demand, exactly when the append cursor reaches the
/// page one past the current highest, and are only released all at once.
pub struct PageArena {
    /// Page size, shift and mask.
    geometry: PageGeometry,
    /// Pages by index.
    pages: Vec<Box<[u8]>>,
    /// Next append position.
    append_offset: ArenaOffset,
}

impl PageArena {
    /// Creates an empty arena. No page is allocated until the first append.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            append_offset: ArenaOffset::ZERO,
        }
    }

    /// Returns the arena geometry.
    #[inline]
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Returns the number of allocated pages.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the current append cursor.
    #[inline]
    pub fn append_offset(&self) -> ArenaOffset {
        self.append_offset
    }

    /// Returns the total bytes held by allocated pages.
    pub fn allocated_bytes(&self) -> usize {
        self.pages.len() * self.geometry.page_size()
    }

    /// Allocates a zeroed page and returns its index.
    ///
    /// Allocation failure is reported, never retried.
    pub fn allocate_page(&mut self) -> Result<usize> {
        let size = self.geometry.page_size();
        let mut page = Vec::new();
        page.try_reserve_exact(size)
            .map_err(|_| LastValError::AllocationFailed { size })?;
        page.resize(size, 0u8);

        self.pages
            .try_reserve(1)
            .map_err(|_| LastValError::AllocationFailed { size })?;
        self.pages.push(page.into_boxed_slice());

        let page_index = self.pages.len() - 1;
        tracing::trace!(page_index, page_size = size, "allocated arena page");
        Ok(page_index)
    }

    /// Appends a block with the given payload capacity and writes its header.
    ///
    /// Returns the new block. The payload itself is left for the caller.
    pub fn append_block(&mut self, capacity: usize) -> Result<Block> {
        let page_size = self.geometry.page_size();
        let footprint = BlockHeader::SIZE + capacity;
        if footprint > page_size {
            return Err(LastValError::RecordTooLarge {
                size: capacity,
                max: self.geometry.max_record_size(),
            });
        }

        let mut page_index = self.geometry.page_index(self.append_offset);
        let mut page_offset = self.geometry.page_offset(self.append_offset);

        if page_offset + footprint > page_size {
            page_index += 1;
            page_offset = 0;
        }

        debug_assert!(page_index <= self.pages.len());
        if page_index == self.pages.len() {
            self.allocate_page()?;
        }

        let offset = self.geometry.offset_of(page_index, page_offset);
        self.append_offset = offset.advance(footprint);

        let header = BlockHeader::new(capacity as u32);
        self.pages[page_index][page_offset..page_offset + BlockHeader::SIZE]
            .copy_from_slice(&header.to_bytes());

        tracing::trace!(%offset, capacity, "appended block");
        Ok(Block::new(offset, capacity))
    }

    /// Reads the header of the block at `offset`.
    pub fn header(&self, offset: ArenaOffset) -> Result<BlockHeader> {
        let (page_index, page_offset) = self.locate(offset, BlockHeader::SIZE)?;
        let page = &self.pages[page_index];
        Ok(BlockHeader::from_bytes(
            &page[page_offset..page_offset + BlockHeader::SIZE],
        ))
    }

    /// Returns the block stored at `offset`.
    pub fn block(&self, offset: ArenaOffset) -> Result<Block> {
        let header = self.header(offset)?;
        Ok(Block::new(offset, header.capacity as usize))
    }

    /// Returns the full payload region of the block at `offset`.
    pub fn payload(&self, offset: ArenaOffset) -> Result<&[u8]> {
        let capacity = self.header(offset)?.capacity as usize;
        let (page_index, page_offset) = self.locate(offset, BlockHeader::SIZE + capacity)?;
        let start = page_offset + BlockHeader::SIZE;
        Ok(&self.pages[page_index][start..start + capacity])
    }

    /// Returns the full payload region of the block at `offset` for writing.
    pub fn payload_mut(&mut self, offset: ArenaOffset) -> Result<&mut [u8]> {
        let capacity = self.header(offset)?.capacity as usize;
        let (page_index, page_offset) = self.locate(offset, BlockHeader::SIZE + capacity)?;
        let start = page_offset + BlockHeader::SIZE;
        Ok(&mut self.pages[page_index][start..start + capacity])
    }

    /// Releases every page and resets the append cursor.
    ///
    /// Offsets handed out before the release are invalid afterwards.
    pub fn release_all(&mut self) {
        self.pages = Vec::new();
        self.append_offset = ArenaOffset::ZERO;
    }

    /// Resolves `offset` to a page and checks that `len` bytes fit below
    /// the append cursor and inside the page.
    fn locate(&self, offset: ArenaOffset, len: usize) -> Result<(usize, usize)> {
        let page_index = self.geometry.page_index(offset);
        let page_offset = self.geometry.page_offset(offset);

        if page_index >= self.pages.len()
            || page_offset + len > self.geometry.page_size()
            || offset.advance(len) > self.append_offset
        {
            return Err(LastValError::OffsetOutOfBounds { offset: offset.0 });
        }

        Ok((page_index, page_offset))
    }
}
