//! Result-set rows and the positioned row source.

use crate::error::{ContractViolationKind, ConversionError, Error, Result};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
///
/// Wrapped in `Arc` so every row from the same query shares one copy.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column aliases in select order
    names: Vec<String>,
    /// Alias -> index mapping for O(1) lookup
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column aliases.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by alias.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get the alias of a column by index.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Check if a column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get all column aliases.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row of raw column values.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values in select order
    values: Vec<Value>,
    /// Shared column metadata
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with shared column metadata.
    pub fn new(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column alias.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get the shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }
}

/// A positioned cursor over a flat result set.
///
/// This is the engine's only interaction with the active result set. The
/// protocol is strict: `read` is valid only between a successful `advance`
/// (one that returned `true`) and the next call to `advance`.
pub trait RowSource {
    /// Advance to the next row. Returns `false` when the cursor is exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Read a raw column value from the current row by alias.
    fn read(&self, alias: &str) -> Result<&Value>;
}

/// An in-memory [`RowSource`] over buffered rows.
///
/// Used by tests and by callers that already hold the full result set.
#[derive(Debug)]
pub struct VecRowSource {
    columns: Arc<ColumnInfo>,
    rows: Vec<Vec<Value>>,
    /// Index of the current row; `None` before the first `advance` and after
    /// exhaustion.
    position: Option<usize>,
    started: bool,
}

impl VecRowSource {
    /// Create a source from column aliases and row values.
    pub fn new(columns: Vec<&str>, rows: Vec<Vec<Value>>) -> Self {
        let columns = Arc::new(ColumnInfo::new(
            columns.into_iter().map(String::from).collect(),
        ));
        Self {
            columns,
            rows,
            position: None,
            started: false,
        }
    }

    /// The shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }
}

impl RowSource for VecRowSource {
    fn advance(&mut self) -> Result<bool> {
        let next = if self.started {
            match self.position {
                Some(i) => i + 1,
                // Already exhausted; stay exhausted.
                None => return Ok(false),
            }
        } else {
            self.started = true;
            0
        };
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = None;
            Ok(false)
        }
    }

    fn read(&self, alias: &str) -> Result<&Value> {
        let Some(pos) = self.position else {
            return Err(Error::contract(
                ContractViolationKind::CursorProtocol,
                if self.started {
                    "read after cursor exhaustion"
                } else {
                    "read before first advance"
                },
            ));
        };
        let index = self.columns.index_of(alias).ok_or_else(|| {
            Error::Conversion(ConversionError {
                expected: "known column alias",
                actual: format!("unknown alias '{alias}'"),
                column: Some(alias.to_string()),
            })
        })?;
        Ok(&self.rows[pos][index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> VecRowSource {
        VecRowSource::new(
            vec!["id", "name"],
            vec![
                vec![Value::BigInt(1), Value::Text("Alice".into())],
                vec![Value::BigInt(2), Value::Text("Bob".into())],
            ],
        )
    }

    #[test]
    fn cursor_walks_rows_in_order() {
        let mut src = source();
        assert!(src.advance().unwrap());
        assert_eq!(src.read("id").unwrap(), &Value::BigInt(1));
        assert_eq!(src.read("name").unwrap(), &Value::Text("Alice".into()));
        assert!(src.advance().unwrap());
        assert_eq!(src.read("id").unwrap(), &Value::BigInt(2));
        assert!(!src.advance().unwrap());
        // Exhausted cursors stay exhausted.
        assert!(!src.advance().unwrap());
    }

    #[test]
    fn read_before_advance_is_a_contract_violation() {
        let src = source();
        let err = src.read("id").unwrap_err();
        assert_eq!(
            err.contract_kind(),
            Some(ContractViolationKind::CursorProtocol)
        );
    }

    #[test]
    fn read_after_exhaustion_is_a_contract_violation() {
        let mut src = VecRowSource::new(vec!["id"], vec![vec![Value::BigInt(1)]]);
        assert!(src.advance().unwrap());
        assert!(!src.advance().unwrap());
        let err = src.read("id").unwrap_err();
        assert_eq!(
            err.contract_kind(),
            Some(ContractViolationKind::CursorProtocol)
        );
    }

    #[test]
    fn unknown_alias_is_a_conversion_error() {
        let mut src = source();
        src.advance().unwrap();
        assert!(matches!(
            src.read("missing").unwrap_err(),
            Error::Conversion(_)
        ));
    }

    #[test]
    fn empty_source_is_immediately_exhausted() {
        let mut src = VecRowSource::new(vec!["id"], vec![]);
        assert!(!src.advance().unwrap());
    }

    #[test]
    fn rows_share_column_info() {
        let columns = Arc::new(ColumnInfo::new(vec!["a".into(), "b".into()]));
        let row1 = Row::new(Arc::clone(&columns), vec![Value::Int(1), Value::Int(2)]);
        let row2 = Row::new(Arc::clone(&columns), vec![Value::Int(3), Value::Int(4)]);
        assert!(Arc::ptr_eq(&row1.column_info(), &row2.column_info()));
        assert_eq!(row1.get_by_name("b"), Some(&Value::Int(2)));
        assert_eq!(row2.get(0), Some(&Value::Int(3)));
        assert_eq!(columns.index_of("a"), Some(0));
        assert_eq!(columns.name_at(1), Some("b"));
        assert!(!columns.contains("c"));
    }
}
