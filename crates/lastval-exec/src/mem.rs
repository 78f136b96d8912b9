//! In-memory records, symbol tables and cursors.
//!
//! Used to feed a store from plain Rust values, mostly in tests.

use crate::record::{Record, RecordCursor};
use crate::symbol::{SymbolFacade, SymbolTable};
use lastval_common::ColumnType;
use std::collections::HashMap;
use std::sync::Arc;

/// A single typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Date(i64),
    /// Dictionary code with its resolved value (None for a null symbol).
    Symbol { code: i32, value: Option<String> },
    String(String),
}

impl Value {
    /// Interns `value` in `table` and returns the symbol value.
    pub fn symbol(table: &mut MemSymbolTable, value: &str) -> Value {
        Value::Symbol {
            code: table.intern(value),
            value: Some(value.to_string()),
        }
    }

    /// Returns a null symbol.
    pub fn null_symbol() -> Value {
        Value::Symbol {
            code: MemSymbolTable::NULL_CODE,
            value: None,
        }
    }

    /// Returns the column type this value belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Byte(_) => ColumnType::Byte,
            Value::Short(_) => ColumnType::Short,
            Value::Int(_) => ColumnType::Int,
            Value::Long(_) => ColumnType::Long,
            Value::Float(_) => ColumnType::Float,
            Value::Double(_) => ColumnType::Double,
            Value::Date(_) => ColumnType::Date,
            Value::Symbol { .. } => ColumnType::Symbol,
            Value::String(_) => ColumnType::String,
        }
    }
}

/// A record backed by a vector of values.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    values: Vec<Value>,
}

impl RowRecord {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn value(&self, col: usize, expected: ColumnType) -> &Value {
        let value = &self.values[col];
        if value.column_type() != expected {
            panic!(
                "column {} holds {}, read as {}",
                col,
                value.column_type(),
                expected
            );
        }
        value
    }
}

impl Record for RowRecord {
    fn get_bool(&self, col: usize) -> bool {
        match self.value(col, ColumnType::Boolean) {
            Value::Boolean(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_byte(&self, col: usize) -> i8 {
        match self.value(col, ColumnType::Byte) {
            Value::Byte(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_short(&self, col: usize) -> i16 {
        match self.value(col, ColumnType::Short) {
            Value::Short(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_int(&self, col: usize) -> i32 {
        match self.value(col, ColumnType::Int) {
            Value::Int(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_long(&self, col: usize) -> i64 {
        match self.value(col, ColumnType::Long) {
            Value::Long(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_float(&self, col: usize) -> f32 {
        match self.value(col, ColumnType::Float) {
            Value::Float(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_double(&self, col: usize) -> f64 {
        match self.value(col, ColumnType::Double) {
            Value::Double(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_date(&self, col: usize) -> i64 {
        match self.value(col, ColumnType::Date) {
            Value::Date(v) => *v,
            _ => unreachable!(),
        }
    }

    fn get_str(&self, col: usize) -> &str {
        match self.value(col, ColumnType::String) {
            Value::String(v) => v,
            _ => unreachable!(),
        }
    }

    fn get_sym_code(&self, col: usize) -> i32 {
        match self.value(col, ColumnType::Symbol) {
            Value::Symbol { code, .. } => *code,
            _ => unreachable!(),
        }
    }

    fn get_sym(&self, col: usize) -> Option<&str> {
        match self.value(col, ColumnType::Symbol) {
            Value::Symbol { value, .. } => value.as_deref(),
            _ => unreachable!(),
        }
    }
}

/// Interning symbol table.
#[derive(Debug, Clone, Default)]
pub struct MemSymbolTable {
    values: Vec<String>,
    codes: HashMap<String, i32>,
}

impl MemSymbolTable {
    /// Code of a null symbol.
    pub const NULL_CODE: i32 = -1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the code for `value`, assigning the next code on first sight.
    pub fn intern(&mut self, value: &str) -> i32 {
        if let Some(&code) = self.codes.get(value) {
            return code;
        }
        let code = self.values.len() as i32;
        self.values.push(value.to_string());
        self.codes.insert(value.to_string(), code);
        code
    }
}

impl SymbolTable for MemSymbolTable {
    fn value(&self, code: i32) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|index| self.values.get(index))
            .map(String::as_str)
    }

    fn size(&self) -> usize {
        self.values.len()
    }
}

/// Symbol tables keyed by source column index.
#[derive(Debug, Clone, Default)]
pub struct MemSymbolFacade {
    tables: HashMap<usize, MemSymbolTable>,
}

impl MemSymbolFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table for `column`, creating it if needed.
    pub fn table_mut(&mut self, column: usize) -> &mut MemSymbolTable {
        self.tables.entry(column).or_default()
    }
}

impl SymbolFacade for MemSymbolFacade {
    fn symbol_table(&self, column: usize) -> Option<&dyn SymbolTable> {
        self.tables
            .get(&column)
            .map(|table| table as &dyn SymbolTable)
    }
}

/// Cursor over a vector of rows.
pub struct VecRecordCursor {
    rows: Vec<RowRecord>,
    position: usize,
    facade: Arc<MemSymbolFacade>,
}

impl VecRecordCursor {
    pub fn new(rows: Vec<RowRecord>, facade: Arc<MemSymbolFacade>) -> Self {
        Self {
            rows,
            position: 0,
            facade,
        }
    }

    /// Rewinds to the first row.
    pub fn to_top(&mut self) {
        self.position = 0;
    }
}

impl RecordCursor for VecRecordCursor {
    fn next_record(&mut self) -> Option<&dyn Record> {
        let row = self.rows.get(self.position)?;
        self.position += 1;
        Some(row as &dyn Record)
    }

    fn symbol_facade(&self) -> Arc<dyn SymbolFacade> {
        self.facade.clone()
    }
}
