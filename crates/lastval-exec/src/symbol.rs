//! Symbol table facade for dictionary-coded columns.

/// Dictionary resolving symbol codes of one column.
pub trait SymbolTable {
    /// Returns the string for `code`, or None if the code is null or unknown.
    fn value(&self, code: i32) -> Option<&str>;

    /// Returns the number of distinct symbols.
    fn size(&self) -> usize;
}

/// Access to the symbol tables of a record source, by source column index.
pub trait SymbolFacade {
    fn symbol_table(&self, column: usize) -> Option<&dyn SymbolTable>;
}
