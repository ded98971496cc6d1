//! Tabular artifact model.
//!
//! A [`Table`] is the only value that crosses the candidate boundary:
//! capabilities consume and produce tables, stages validate them, and the
//! anti-cheat analyzer serializes them into a canonical literal form.
//! Tables are rectangular (every row has one cell per column) and are
//! never mutated after a stage produces them; downstream stages work on
//! independent clones.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// One tabular value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Stable textual key, used for duplicate detection and grouping.
    pub fn canonical(&self) -> String {
        match self {
            Cell::Null => "∅".to_string(),
            Cell::Int(v) => format!("i:{v}"),
            Cell::Float(v) => format!("f:{v}"),
            Cell::Str(v) => format!("s:{v}"),
        }
    }

    /// JSON value for the canonical row serialization.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Null => serde_json::Value::Null,
            Cell::Int(v) => serde_json::json!(v),
            Cell::Float(v) => serde_json::json!(v),
            Cell::Str(v) => serde_json::json!(v),
        }
    }

    /// Parse one delimited field: empty → Null, then integer, then float,
    /// then plain text.
    pub fn infer(field: &str) -> Cell {
        let field = field.trim();
        if field.is_empty() {
            return Cell::Null;
        }
        if let Ok(v) = field.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = field.parse::<f64>() {
            return Cell::Float(v);
        }
        Cell::Str(field.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Null => write!(f, ""),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Str(v) => write!(f, "{v}"),
        }
    }
}

/// Rows × named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; the rectangular invariant is enforced here.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), HarnessError> {
        if row.len() != self.columns.len() {
            return Err(HarnessError::Validation(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn row(&self, idx: usize) -> Option<&[Cell]> {
        self.rows.get(idx).map(|r| r.as_slice())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Total count of missing-value cells across the whole table.
    pub fn null_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|c| c.is_null())
            .count()
    }

    /// Count of rows that fully duplicate an earlier row.
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        for row in &self.rows {
            let key = row
                .iter()
                .map(Cell::canonical)
                .collect::<Vec<_>>()
                .join("|");
            if !seen.insert(key) {
                duplicates += 1;
            }
        }
        duplicates
    }

    /// Rows as a JSON array of objects with sorted keys (serde_json's map
    /// is ordered). This is the canonical serialization used both for
    /// artifact fingerprints and for the anti-cheat literal comparison.
    pub fn to_json_rows(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), cell.to_json());
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    /// Content hash of the canonical serialization.
    pub fn fingerprint(&self) -> String {
        format!("blake3:{}", blake3::hash(self.to_json_rows().to_string().as_bytes()))
    }

    /// Read a simple comma-delimited file: first line is the header, no
    /// quoting support. Empty fields become [`Cell::Null`].
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Table, HarnessError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| HarnessError::Load(format!("cannot read {}: {e}", path.display())))?;
        Self::from_csv_str(&text)
            .map_err(|e| HarnessError::Load(format!("{}: {e}", path.display())))
    }

    /// Parse delimited text; see [`Table::from_csv_path`].
    pub fn from_csv_str(text: &str) -> Result<Table, HarnessError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| HarnessError::Load("empty data file".to_string()))?;
        let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();
        let mut table = Table::new(columns);
        for (idx, line) in lines.enumerate() {
            let row: Vec<Cell> = line.split(',').map(Cell::infer).collect();
            if row.len() != table.columns.len() {
                return Err(HarnessError::Load(format!(
                    "row {} has {} fields, expected {}",
                    idx + 1,
                    row.len(),
                    table.columns.len()
                )));
            }
            table.rows.push(row);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_csv() -> &'static str {
        "CustomerID,Product,Quantity,Amount\n\
         1,Widget,2,100.0\n\
         1,Widget,2,100.0\n\
         3,Doohickey,3,\n"
    }

    #[test]
    fn test_csv_parse_infers_types() {
        let t = Table::from_csv_str(sample_csv()).unwrap();
        assert_eq!(t.columns(), ["CustomerID", "Product", "Quantity", "Amount"]);
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.cell(0, "CustomerID"), Some(&Cell::Int(1)));
        assert_eq!(t.cell(0, "Product"), Some(&Cell::Str("Widget".to_string())));
        assert_eq!(t.cell(0, "Amount"), Some(&Cell::Float(100.0)));
        assert_eq!(t.cell(2, "Amount"), Some(&Cell::Null));
    }

    #[test]
    fn test_null_and_duplicate_counts() {
        let t = Table::from_csv_str(sample_csv()).unwrap();
        assert_eq!(t.null_count(), 1);
        assert_eq!(t.duplicate_row_count(), 1);
    }

    #[test]
    fn test_ragged_row_is_a_load_error() {
        let err = Table::from_csv_str("A,B\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, HarnessError::Load(_)));
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_push_row_enforces_shape() {
        let mut t = Table::new(vec!["A", "B"]);
        assert!(t.push_row(vec![Cell::Int(1), Cell::Int(2)]).is_ok());
        assert!(t.push_row(vec![Cell::Int(1)]).is_err());
    }

    #[test]
    fn test_canonical_rows_have_sorted_keys() {
        let mut t = Table::new(vec!["Zeta", "Alpha"]);
        t.push_row(vec![Cell::Int(1), Cell::Str("x".to_string())])
            .unwrap();
        let json = t.to_json_rows().to_string();
        assert_eq!(json, r#"[{"Alpha":"x","Zeta":1}]"#);
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let a = Table::from_csv_str(sample_csv()).unwrap();
        let b = Table::from_csv_str(sample_csv()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        let c = Table::from_csv_str("A\n1\n").unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
