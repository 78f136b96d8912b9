//! Composite key encoding.
//!
//! A key is the concatenation of its columns' encodings in declared order:
//!
//! | Type                    | Encoding                                 |
//! |-------------------------|------------------------------------------|
//! | BOOLEAN, BYTE           | 1 byte                                   |
//! | SHORT                   | 2 bytes LE                               |
//! | INT                     | 4 bytes LE                               |
//! | FLOAT                   | 4 bytes LE (IEEE bits)                   |
//! | LONG, DATE              | 8 bytes LE                               |
//! | DOUBLE                  | 8 bytes LE (IEEE bits)                   |
//! | STRING, SYMBOL          | u32 LE unit count + UTF-16 LE units      |
//! | null SYMBOL             | u32::MAX                                 |
//!
//! Symbols are encoded by resolved text. Two sources may assign different
//! codes to the same string, so encoding codes would split one logical key.

use crate::record::Record;
use bytes::{BufMut, BytesMut};
use lastval_common::ColumnType;

/// Length marker for a null text key.
const NULL_TEXT: u32 = u32::MAX;

/// Reusable buffer for building encoded keys.
#[derive(Debug, Default)]
pub struct KeyWriter {
    buf: BytesMut,
}

impl KeyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Discards the current key, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Returns the encoded key.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn put_byte(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn put_short(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    pub fn put_int(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn put_long(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn put_float(&mut self, value: f32) {
        self.buf.put_u32_le(value.to_bits());
    }

    pub fn put_double(&mut self, value: f64) {
        self.buf.put_u64_le(value.to_bits());
    }

    pub fn put_str(&mut self, value: &str) {
        let len = value.encode_utf16().count();
        self.buf.reserve(4 + len * 2);
        self.buf.put_u32_le(len as u32);
        for unit in value.encode_utf16() {
            self.buf.put_u16_le(unit);
        }
    }

    pub fn put_null_str(&mut self) {
        self.buf.put_u32_le(NULL_TEXT);
    }
}

/// Key columns of one record shape, by index and declared type.
#[derive(Debug, Clone, Default)]
pub struct KeyColumns {
    indexes: Vec<usize>,
    types: Vec<ColumnType>,
}

impl KeyColumns {
    pub fn new(indexes: Vec<usize>, types: Vec<ColumnType>) -> Self {
        debug_assert_eq!(indexes.len(), types.len());
        Self { indexes, types }
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }

    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Returns true if `col` is one of the key columns.
    pub fn contains(&self, col: usize) -> bool {
        self.indexes.contains(&col)
    }

    /// Appends the key of `record` to `writer`.
    pub fn write<R: Record + ?Sized>(&self, record: &R, writer: &mut KeyWriter) {
        for (&col, column_type) in self.indexes.iter().zip(&self.types) {
            match column_type {
                ColumnType::Boolean => writer.put_bool(record.get_bool(col)),
                ColumnType::Byte => writer.put_byte(record.get_byte(col)),
                ColumnType::Short => writer.put_short(record.get_short(col)),
                ColumnType::Int => writer.put_int(record.get_int(col)),
                ColumnType::Long => writer.put_long(record.get_long(col)),
                ColumnType::Float => writer.put_float(record.get_float(col)),
                ColumnType::Double => writer.put_double(record.get_double(col)),
                ColumnType::Date => writer.put_long(record.get_date(col)),
                ColumnType::String => writer.put_str(record.get_str(col)),
                ColumnType::Symbol => match record.get_sym(col) {
                    Some(value) => writer.put_str(value),
                    None => writer.put_null_str(),
                },
                // Rejected when the store is built.
                ColumnType::Binary => unreachable!("binary key column"),
            }
        }
    }
}
