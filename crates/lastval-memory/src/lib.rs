//! Memory management for the last-value store.
//!
//! This crate provides:
//! - Page arena with shift/mask offset addressing and append-only growth
//! - Block capacity prefix and growth-margin sizing
//! - First-fit free list of retired blocks

mod arena;
mod block;
mod freelist;

pub use arena::PageArena;
pub use block::{Block, BlockHeader, inflated_capacity};
pub use freelist::FreeList;
