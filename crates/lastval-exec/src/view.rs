//! Zero-copy view over a stored value.
//!
//! A [`RecordView`] borrows the store that produced it, so it cannot be kept
//! across the next `put`, `get` or `close`. Column indexes address the value
//! schema (the slave's non-key columns), not the slave schema.

use crate::chars::{STR_LEN_SIZE, Utf16Str};
use crate::layout::ValueLayout;
use crate::metadata::RecordMetadata;
use crate::symbol::SymbolFacade;
use lastval_common::{ArenaOffset, LastValError, Result};
use std::collections::HashMap;

/// Typed read access to one stored value.
pub struct RecordView<'a> {
    payload: &'a [u8],
    address: ArenaOffset,
    layout: &'a ValueLayout,
    symbols: Option<&'a dyn SymbolFacade>,
    /// Value column index to slave symbol table index.
    sym_remap: &'a HashMap<usize, usize>,
    scratch: &'a mut String,
}

impl<'a> RecordView<'a> {
    pub(crate) fn new(
        payload: &'a [u8],
        address: ArenaOffset,
        layout: &'a ValueLayout,
        symbols: Option<&'a dyn SymbolFacade>,
        sym_remap: &'a HashMap<usize, usize>,
        scratch: &'a mut String,
    ) -> Self {
        Self {
            payload,
            address,
            layout,
            symbols,
            sym_remap,
            scratch,
        }
    }

    /// Returns the arena offset of the stored block.
    pub fn address(&self) -> ArenaOffset {
        self.address
    }

    /// Returns the payload capacity of the stored block.
    pub fn capacity(&self) -> usize {
        self.payload.len()
    }

    /// Returns the value schema.
    pub fn metadata(&self) -> &'a RecordMetadata {
        self.layout.metadata()
    }

    pub fn column_count(&self) -> usize {
        self.layout.column_count()
    }

    /// Storage row ids do not address this structure.
    pub fn row_id(&self) -> Option<u64> {
        None
    }

    #[inline]
    fn fixed<const N: usize>(&self, col: usize) -> [u8; N] {
        let at = self.layout.fixed_offset(col);
        let mut out = [0u8; N];
        out.copy_from_slice(&self.payload[at..at + N]);
        out
    }

    pub fn get_bool(&self, col: usize) -> bool {
        self.fixed::<1>(col)[0] == 1
    }

    pub fn get_byte(&self, col: usize) -> i8 {
        i8::from_le_bytes(self.fixed(col))
    }

    pub fn get_short(&self, col: usize) -> i16 {
        i16::from_le_bytes(self.fixed(col))
    }

    pub fn get_int(&self, col: usize) -> i32 {
        i32::from_le_bytes(self.fixed(col))
    }

    pub fn get_long(&self, col: usize) -> i64 {
        i64::from_le_bytes(self.fixed(col))
    }

    pub fn get_float(&self, col: usize) -> f32 {
        f32::from_le_bytes(self.fixed(col))
    }

    pub fn get_double(&self, col: usize) -> f64 {
        f64::from_le_bytes(self.fixed(col))
    }

    pub fn get_date(&self, col: usize) -> i64 {
        i64::from_le_bytes(self.fixed(col))
    }

    /// Returns the stored dictionary code of a symbol column.
    pub fn get_sym_code(&self, col: usize) -> i32 {
        i32::from_le_bytes(self.fixed(col))
    }

    /// Resolves a symbol column through the slave source's symbol table.
    ///
    /// Returns `Ok(None)` for a null or unknown code.
    pub fn get_sym(&self, col: usize) -> Result<Option<&'a str>> {
        let unbound = || LastValError::SymbolTableNotBound { column: col };
        let source_column = *self.sym_remap.get(&col).ok_or_else(unbound)?;
        let table = self
            .symbols
            .and_then(|facade| facade.symbol_table(source_column))
            .ok_or_else(unbound)?;
        Ok(table.value(self.get_sym_code(col)))
    }

    /// Returns the payload offset of the characters of string column `col`
    /// and their length in code units.
    fn str_bounds(&self, col: usize) -> (usize, usize) {
        let var_offset = u32::from_le_bytes(self.fixed(col)) as usize;
        let len_bytes = &self.payload[var_offset..var_offset + STR_LEN_SIZE];
        let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
        (var_offset + STR_LEN_SIZE, len as usize)
    }

    /// Returns the length of a string column in UTF-16 code units.
    pub fn get_str_len(&self, col: usize) -> usize {
        self.str_bounds(col).1
    }

    /// Returns a zero-copy window over a string column.
    pub fn get_flyweight_str(&self, col: usize) -> Utf16Str<'a> {
        let (start, len) = self.str_bounds(col);
        Utf16Str::new(&self.payload[start..start + len * 2])
    }

    /// Decodes a string column into the store's scratch buffer.
    ///
    /// The returned string is overwritten by the next call.
    pub fn get_str(&mut self, col: usize) -> &str {
        let chars = self.get_flyweight_str(col);
        self.scratch.clear();
        chars.write_into(self.scratch);
        self.scratch.as_str()
    }

    /// Appends a string column to `sink`.
    pub fn get_str_into(&self, col: usize, sink: &mut String) {
        self.get_flyweight_str(col).write_into(sink);
    }

    /// Binary columns are never stored.
    pub fn get_bin(&self, _col: usize) -> Result<&'a [u8]> {
        Err(LastValError::UnsupportedOperation("binary column read".to_string()))
    }

    /// Binary columns are never stored.
    pub fn get_bin_len(&self, _col: usize) -> Result<usize> {
        Err(LastValError::UnsupportedOperation("binary column length".to_string()))
    }
}

impl std::fmt::Debug for RecordView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordView")
            .field("address", &self.address)
            .field("capacity", &self.payload.len())
            .field("columns", &self.layout.column_count())
            .finish()
    }
}
