//! Writes slave records into block payloads.

use crate::chars::write_utf16;
use crate::layout::ValueLayout;
use crate::record::Record;
use lastval_common::ColumnType;

/// Encodes the value columns of a record following a [`ValueLayout`].
pub struct RecordEncoder<'a> {
    layout: &'a ValueLayout,
}

impl<'a> RecordEncoder<'a> {
    pub fn new(layout: &'a ValueLayout) -> Self {
        Self { layout }
    }

    /// Writes the value of `record` at the start of `dst` and returns the
    /// number of bytes written.
    ///
    /// # Panics
    /// Panics if `dst` is shorter than the record's encoded size.
    pub fn write<R: Record + ?Sized>(&self, record: &R, dst: &mut [u8]) -> usize {
        let layout = self.layout;

        for col in 0..layout.column_count() {
            let index = layout.value_index(col);
            let at = layout.fixed_offset(col);
            match layout.column_type(col) {
                ColumnType::Boolean => dst[at] = record.get_bool(index) as u8,
                ColumnType::Byte => dst[at] = record.get_byte(index) as u8,
                ColumnType::Short => put(dst, at, &record.get_short(index).to_le_bytes()),
                ColumnType::Int => put(dst, at, &record.get_int(index).to_le_bytes()),
                ColumnType::Long => put(dst, at, &record.get_long(index).to_le_bytes()),
                ColumnType::Float => put(dst, at, &record.get_float(index).to_le_bytes()),
                ColumnType::Double => put(dst, at, &record.get_double(index).to_le_bytes()),
                ColumnType::Date => put(dst, at, &record.get_date(index).to_le_bytes()),
                ColumnType::Symbol => put(dst, at, &record.get_sym_code(index).to_le_bytes()),
                // Slot filled below, once the variable offset is known.
                ColumnType::String => {}
                ColumnType::Binary => unreachable!("binary value column"),
            }
        }

        let mut var_offset = layout.fixed_size();
        for &col in layout.string_columns() {
            let at = layout.fixed_offset(col);
            put(dst, at, &(var_offset as u32).to_le_bytes());
            let value = record.get_str(layout.value_index(col));
            var_offset += write_utf16(&mut dst[var_offset..], value);
        }
        var_offset
    }
}

#[inline]
fn put(dst: &mut [u8], at: usize, bytes: &[u8]) {
    dst[at..at + bytes.len()].copy_from_slice(bytes);
}
