//! Stored value layout.
//!
//! The value of a key holds every non-key slave column, in slave order:
//!
//! ```text
//! +---------------------------------+-------------------------------------+
//! | fixed region                    | variable region                     |
//! | one slot per value column       | per STRING column, declared order:  |
//! | (1/2/4/8 bytes; STRING slots    |   u32 unit count + UTF-16 LE units  |
//! |  hold a payload-relative u32)   |                                     |
//! +---------------------------------+-------------------------------------+
//! ```
//!
//! Offsets are relative to the start of the payload, after the block's
//! capacity prefix.

use crate::chars::stored_str_size;
use crate::metadata::RecordMetadata;
use crate::record::Record;
use lastval_common::{ColumnType, LastValError, Result};

/// Fixed-region layout of a value, derived once per store.
#[derive(Debug, Clone)]
pub struct ValueLayout {
    /// Slave column index of each value column.
    value_indexes: Vec<usize>,
    value_types: Vec<ColumnType>,
    /// Payload offset of each value column's fixed slot.
    fixed_offsets: Vec<usize>,
    /// Value column positions of STRING columns, in declared order.
    string_columns: Vec<usize>,
    fixed_size: usize,
    metadata: RecordMetadata,
}

impl ValueLayout {
    /// Builds the layout for the non-key columns of `slave`.
    ///
    /// Fails if a value column is BINARY, or if the fixed region alone
    /// exceeds `max_record_size`.
    pub fn new(
        slave: &RecordMetadata,
        key_indexes: &[usize],
        max_record_size: usize,
    ) -> Result<Self> {
        let value_indexes: Vec<usize> = (0..slave.column_count())
            .filter(|index| !key_indexes.contains(index))
            .collect();

        let mut value_types = Vec::with_capacity(value_indexes.len());
        let mut fixed_offsets = Vec::with_capacity(value_indexes.len());
        let mut string_columns = Vec::new();
        let mut fixed_size = 0usize;

        for (position, &index) in value_indexes.iter().enumerate() {
            let column_type = slave.column_type(index);
            let width = column_type
                .slot_size()
                .ok_or(LastValError::UnsupportedType(column_type))?;
            if column_type == ColumnType::String {
                string_columns.push(position);
            }
            value_types.push(column_type);
            fixed_offsets.push(fixed_size);
            fixed_size += width;
        }

        if fixed_size > max_record_size {
            return Err(LastValError::RecordTooLarge {
                size: fixed_size,
                max: max_record_size,
            });
        }

        let metadata = slave.select(&value_indexes);
        Ok(Self {
            value_indexes,
            value_types,
            fixed_offsets,
            string_columns,
            fixed_size,
            metadata,
        })
    }

    /// Returns the payload size `record` needs.
    pub fn encoded_size<R: Record + ?Sized>(&self, record: &R) -> usize {
        self.string_columns
            .iter()
            .map(|&position| stored_str_size(record.get_str_len(self.value_indexes[position])))
            .fold(self.fixed_size, |size, var| size + var)
    }

    /// Returns the number of value columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.value_indexes.len()
    }

    /// Returns the slave column index of value column `col`.
    #[inline]
    pub fn value_index(&self, col: usize) -> usize {
        self.value_indexes[col]
    }

    #[inline]
    pub fn column_type(&self, col: usize) -> ColumnType {
        self.value_types[col]
    }

    /// Returns the payload offset of the fixed slot of value column `col`.
    #[inline]
    pub fn fixed_offset(&self, col: usize) -> usize {
        self.fixed_offsets[col]
    }

    #[inline]
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    /// Returns the value column positions holding strings.
    pub fn string_columns(&self) -> &[usize] {
        &self.string_columns
    }

    /// Returns the value schema.
    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }
}
