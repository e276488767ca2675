//! Owned result rows.

use std::fmt;
use std::sync::Arc;

use super::cursor::ResultSummary;
use crate::value::Value;

/// One row, detached from the session that produced it.
///
/// Rows of one result share their column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// Create a record. `keys` and `values` line up by index.
    pub fn new(keys: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// Column names.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by column name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let index = self.keys.iter().position(|k| k == key)?;
        self.values.get(index)
    }

    /// Value by column index.
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Take the values out.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.keys.iter().zip(&self.values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::iter::Zip<std::slice::Iter<'a, String>, std::slice::Iter<'a, Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter().zip(self.values.iter())
    }
}

/// Everything a query returned.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows in server order
    pub records: Vec<Record>,
    /// Final summary
    pub summary: ResultSummary,
}

impl QueryResult {
    /// The only row, if exactly one came back.
    pub fn single(&self) -> Option<&Record> {
        match self.records.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
