//! Keyed slot map from encoded composite keys to stored payload offsets.
//!
//! Each distinct key owns exactly one slot. A slot holds the arena offset of
//! the key's current block. Keys are owned copies of the encoded key bytes,
//! so lookups compare by value.

use bytes::Bytes;
use lastval_common::{ArenaOffset, ColumnType};
use std::collections::HashMap;

/// Index of a slot inside the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u32);

/// Value slot of one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    /// Offset of the key's block in the arena.
    pub offset: ArenaOffset,
}

/// Map from encoded keys to value slots.
#[derive(Debug, Default)]
pub struct KeyedSlotMap {
    index: HashMap<Bytes, SlotId>,
    slots: Vec<Slot>,
    /// Declared key column types, in key order.
    key_types: Vec<ColumnType>,
}

impl KeyedSlotMap {
    pub fn new(key_types: Vec<ColumnType>) -> Self {
        Self::with_capacity(key_types, 0)
    }

    /// Creates a map sized for `capacity` keys.
    pub fn with_capacity(key_types: Vec<ColumnType>, capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            key_types,
        }
    }

    /// Returns the declared key column types.
    pub fn key_types(&self) -> &[ColumnType] {
        &self.key_types
    }

    /// Returns the slot for `key` if the key has been seen.
    #[inline]
    pub fn get_existing(&self, key: &[u8]) -> Option<SlotId> {
        self.index.get(key).copied()
    }

    /// Returns the slot for `key`, creating a zeroed slot on first sight.
    /// The flag is true when the slot was created by this call.
    pub fn get_or_create(&mut self, key: &[u8]) -> (SlotId, bool) {
        if let Some(&id) = self.index.get(key) {
            return (id, false);
        }
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(Slot::default());
        self.index.insert(Bytes::copy_from_slice(key), id);
        (id, true)
    }

    #[inline]
    pub fn offset(&self, id: SlotId) -> ArenaOffset {
        self.slots[id.0 as usize].offset
    }

    #[inline]
    pub fn set_offset(&mut self, id: SlotId, offset: ArenaOffset) {
        self.slots[id.0 as usize].offset = offset;
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every key and slot and their allocations.
    pub fn clear(&mut self) {
        self.index = HashMap::new();
        self.slots = Vec::new();
    }
}
