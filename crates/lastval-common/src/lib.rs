//! Common types, errors, and configuration for the last-value store.
//!
//! This crate provides shared definitions used across all lastval components.

pub mod config;
pub mod error;
pub mod page;
pub mod types;

pub use config::StoreConfig;
pub use error::{LastValError, Result};
pub use page::{ArenaOffset, BLOCK_PREFIX_SIZE, DEFAULT_PAGE_SIZE, PageGeometry};
pub use types::ColumnType;
