//! Stateless structural predicates over tabular artifacts.
//!
//! Each predicate returns `Ok(())` or a `VALIDATE/` error carrying the
//! reason; the runner composes the per-stage subset and fails the stage
//! on the first violated predicate.

use tvh_core::{HarnessError, Table};

/// Required column superset for the merged artifact.
pub const MERGED_COLUMNS: [&str; 7] = [
    "CustomerID",
    "Product",
    "Quantity",
    "Amount",
    "CustomerName",
    "MembershipLevel",
    "TotalAmount",
];

/// Required columns for the aggregate artifact.
pub const TOTALS_COLUMNS: [&str; 2] = ["MembershipLevel", "TotalSpent"];

pub fn has_no_nulls(table: &Table) -> Result<(), HarnessError> {
    let nulls = table.null_count();
    if nulls > 0 {
        return Err(HarnessError::Validation(format!(
            "nulls remain after cleaning ({nulls} missing-value cells)"
        )));
    }
    Ok(())
}

pub fn has_no_duplicate_rows(table: &Table) -> Result<(), HarnessError> {
    let duplicates = table.duplicate_row_count();
    if duplicates > 0 {
        return Err(HarnessError::Validation(format!(
            "duplicates still present after cleaning ({duplicates} rows)"
        )));
    }
    Ok(())
}

pub fn has_columns(table: &Table, required: &[&str]) -> Result<(), HarnessError> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        return Err(HarnessError::Validation(format!(
            "expected columns missing: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

pub fn is_non_empty(table: &Table) -> Result<(), HarnessError> {
    if table.n_rows() == 0 {
        return Err(HarnessError::Validation("result table is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvh_core::Cell;

    fn table_with_null() -> Table {
        let mut t = Table::new(vec!["A", "B"]);
        t.push_row(vec![Cell::Int(1), Cell::Null]).unwrap();
        t
    }

    #[test]
    fn test_has_no_nulls() {
        assert!(has_no_nulls(&table_with_null()).is_err());
        let mut clean = Table::new(vec!["A"]);
        clean.push_row(vec![Cell::Int(1)]).unwrap();
        assert!(has_no_nulls(&clean).is_ok());
    }

    #[test]
    fn test_has_no_duplicate_rows() {
        let mut t = Table::new(vec!["A"]);
        t.push_row(vec![Cell::Int(1)]).unwrap();
        t.push_row(vec![Cell::Int(1)]).unwrap();
        let err = has_no_duplicate_rows(&t).unwrap_err();
        assert!(err.to_string().contains("duplicates"));
    }

    #[test]
    fn test_has_columns_reports_missing_names() {
        let t = Table::new(vec!["CustomerID", "Product"]);
        let err = has_columns(&t, &MERGED_COLUMNS).unwrap_err();
        assert!(err.to_string().contains("TotalAmount"));
        assert!(has_columns(&t, &["CustomerID"]).is_ok());
    }

    #[test]
    fn test_is_non_empty() {
        assert!(is_non_empty(&Table::new(vec!["A"])).is_err());
        assert!(is_non_empty(&table_with_null()).is_ok());
    }
}
