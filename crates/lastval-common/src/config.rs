//! Configuration for the last-value store.

use crate::error::{LastValError, Result};
use crate::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE, PageGeometry};
use serde::{Deserialize, Serialize};

/// Default growth margin applied to appended blocks (10%).
pub const DEFAULT_GROWTH_MARGIN_PERCENT: u32 = 10;

/// Store configuration, fixed for the lifetime of one store instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Requested page size in bytes, rounded up to a power of two.
    pub page_size: usize,
    /// Extra capacity given to appended blocks so that a later, slightly
    /// larger value for the same key can be written in place.
    pub growth_margin_percent: u32,
    /// Aggregate free bytes required before retired blocks are searched for
    /// reuse. None uses the maximum record size.
    pub reuse_threshold: Option<usize>,
    /// Initial number of distinct keys to reserve room for.
    pub key_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            growth_margin_percent: DEFAULT_GROWTH_MARGIN_PERCENT,
            reuse_threshold: None,
            key_capacity: 0,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with the given page size and defaults
    /// for everything else.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Returns the page geometry derived from the requested page size.
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_size)
    }

    /// Returns the effective free-list reuse threshold in bytes.
    pub fn effective_reuse_threshold(&self) -> usize {
        self.reuse_threshold
            .unwrap_or_else(|| self.geometry().max_record_size())
    }

    /// Checks that the configuration describes a usable store.
    pub fn validate(&self) -> Result<()> {
        let rounded = self.page_size.checked_next_power_of_two();
        match rounded {
            Some(size) if (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size) => {}
            _ => {
                return Err(LastValError::InvalidParameter {
                    name: "page_size".to_string(),
                    value: self.page_size.to_string(),
                });
            }
        }

        if self.growth_margin_percent > 100 {
            return Err(LastValError::InvalidParameter {
                name: "growth_margin_percent".to_string(),
                value: self.growth_margin_percent.to_string(),
            });
        }

        Ok(())
    }
}
