//! Record access consumed from the execution pipeline.

use crate::symbol::SymbolFacade;
use std::sync::Arc;

/// Read access to one row of a master or slave record stream.
///
/// Columns are addressed by index into the stream's metadata. Calling a
/// getter that does not match the column's declared type is a caller error.
pub trait Record {
    fn get_bool(&self, col: usize) -> bool;

    fn get_byte(&self, col: usize) -> i8;

    fn get_short(&self, col: usize) -> i16;

    fn get_int(&self, col: usize) -> i32;

    fn get_long(&self, col: usize) -> i64;

    fn get_float(&self, col: usize) -> f32;

    fn get_double(&self, col: usize) -> f64;

    /// Milliseconds since epoch.
    fn get_date(&self, col: usize) -> i64;

    fn get_str(&self, col: usize) -> &str;

    /// Length of a string column in UTF-16 code units.
    fn get_str_len(&self, col: usize) -> usize {
        self.get_str(col).encode_utf16().count()
    }

    /// Dictionary code of a symbol column.
    fn get_sym_code(&self, col: usize) -> i32;

    /// Resolved value of a symbol column, or None for a null symbol.
    fn get_sym(&self, col: usize) -> Option<&str>;
}

/// Pull-based, single-pass source of records.
pub trait RecordCursor {
    /// Returns the next record, or None when the source is exhausted.
    fn next_record(&mut self) -> Option<&dyn Record>;

    /// Returns the facade resolving this source's symbol columns.
    fn symbol_facade(&self) -> Arc<dyn SymbolFacade>;
}
