//! Column type identifiers for master and slave record shapes.

use serde::{Deserialize, Serialize};

/// Type of a column in a record schema.
///
/// Symbol columns are dictionary-coded strings: the record stores a 4-byte
/// code that resolves to text through a per-source symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColumnType {
    Boolean = 1,
    Byte = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
    /// Milliseconds since epoch, stored as a 64-bit integer.
    Date = 8,
    /// Dictionary-coded string, stored as a 4-byte code.
    Symbol = 9,
    /// Variable-length string of UTF-16 code units.
    String = 10,
    /// Unbounded binary blob. Not storable in a last-value store.
    Binary = 11,
}

impl ColumnType {
    /// Returns the width of this column's slot in the fixed region of a
    /// stored value, or None for unsupported types.
    ///
    /// String columns occupy a 4-byte slot holding the offset of their
    /// characters in the trailing variable region.
    pub fn slot_size(&self) -> Option<usize> {
        match self {
            ColumnType::Boolean | ColumnType::Byte => Some(1),
            ColumnType::Short => Some(2),
            ColumnType::Int | ColumnType::Float | ColumnType::Symbol => Some(4),
            ColumnType::Long | ColumnType::Double | ColumnType::Date => Some(8),
            ColumnType::String => Some(4),
            ColumnType::Binary => None,
        }
    }

    /// Returns true if values of this type have variable length.
    pub fn is_variable(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Binary)
    }

    /// Returns true if the key encoding of this type is its text.
    ///
    /// Symbols are keyed by their resolved string, never by their code, so
    /// a symbol key and a string key encode identically.
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Symbol)
    }

    /// Returns true if a master key of this type can match a slave key of
    /// type `other`.
    pub fn key_compatible(&self, other: ColumnType) -> bool {
        *self == other || (self.is_text() && other.is_text())
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Byte => "BYTE",
            ColumnType::Short => "SHORT",
            ColumnType::Int => "INT",
            ColumnType::Long => "LONG",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Date => "DATE",
            ColumnType::Symbol => "SYMBOL",
            ColumnType::String => "STRING",
            ColumnType::Binary => "BINARY",
        };
        write!(f, "{}", name)
    }
}
