//! Bundled sample candidates.
//!
//! These play the role of submitted implementations: `reference` is a
//! data-driven solution, `hardcoded` returns a constant aggregate (the
//! behavior the anti-cheat heuristic exists to catch) and `no_aggregate`
//! omits one required capability. Their source-of-record files live under
//! `testing/fixtures/candidates/`. The harness itself never depends on
//! the domain logic in here being correct.

use std::collections::{BTreeMap, HashMap, HashSet};

use tvh_core::{Cell, HarnessError, Table};

use crate::registry::{capability, CandidateRegistry, CapArg, Capability, CapabilityMap};

/// Register every bundled candidate.
pub fn register(registry: &mut CandidateRegistry) {
    registry.register("reference", reference_capabilities);
    registry.register("hardcoded", hardcoded_capabilities);
    registry.register("no_aggregate", no_aggregate_capabilities);
}

fn missing_arg(op: &str) -> HarnessError {
    HarnessError::Fault(format!("{op}: missing argument"))
}

fn base_capabilities() -> CapabilityMap {
    let mut caps = CapabilityMap::new();
    caps.insert(
        Capability::LoadCustomers,
        capability(|args: &[CapArg]| {
            let path = args.first().ok_or_else(|| missing_arg("load_customers"))?.as_path()?;
            Table::from_csv_path(path)
        }),
    );
    caps.insert(
        Capability::LoadTransactions,
        capability(|args: &[CapArg]| {
            let path = args
                .first()
                .ok_or_else(|| missing_arg("load_transactions"))?
                .as_path()?;
            Table::from_csv_path(path)
        }),
    );
    caps.insert(
        Capability::CleanTransactions,
        capability(|args: &[CapArg]| {
            let data = args
                .first()
                .ok_or_else(|| missing_arg("clean_transaction_data"))?
                .as_table()?;
            clean_transaction_data(data)
        }),
    );
    caps.insert(
        Capability::MergeData,
        capability(|args: &[CapArg]| {
            let transactions = args.first().ok_or_else(|| missing_arg("merge_data"))?.as_table()?;
            let customers = args.get(1).ok_or_else(|| missing_arg("merge_data"))?.as_table()?;
            merge_data(transactions, customers)
        }),
    );
    caps
}

pub fn reference_capabilities() -> Result<CapabilityMap, HarnessError> {
    let mut caps = base_capabilities();
    caps.insert(
        Capability::TotalByMembership,
        capability(|args: &[CapArg]| {
            let merged = args
                .first()
                .ok_or_else(|| missing_arg("calculate_total_by_membership"))?
                .as_table()?;
            calculate_total_by_membership(merged)
        }),
    );
    Ok(caps)
}

pub fn hardcoded_capabilities() -> Result<CapabilityMap, HarnessError> {
    let mut caps = base_capabilities();
    caps.insert(
        Capability::TotalByMembership,
        capability(|_args: &[CapArg]| hardcoded_totals()),
    );
    Ok(caps)
}

fn no_aggregate_capabilities() -> Result<CapabilityMap, HarnessError> {
    Ok(base_capabilities())
}

/// Drop rows with missing values, then drop fully-duplicate rows.
fn clean_transaction_data(data: &Table) -> Result<Table, HarnessError> {
    let mut out = Table::new(data.columns().to_vec());
    let mut seen = HashSet::new();
    for row in data.rows() {
        if row.iter().any(Cell::is_null) {
            continue;
        }
        let key = row.iter().map(Cell::canonical).collect::<Vec<_>>().join("|");
        if !seen.insert(key) {
            continue;
        }
        out.push_row(row.to_vec())?;
    }
    Ok(out)
}

fn column(table: &Table, name: &str) -> Result<usize, HarnessError> {
    table
        .column_index(name)
        .ok_or_else(|| HarnessError::Fault(format!("input table missing column '{name}'")))
}

/// Inner join of transactions with customers on CustomerID, plus a
/// computed TotalAmount = Quantity * Amount.
fn merge_data(transactions: &Table, customers: &Table) -> Result<Table, HarnessError> {
    let cust_id = column(customers, "CustomerID")?;
    let cust_name = column(customers, "CustomerName")?;
    let cust_level = column(customers, "MembershipLevel")?;
    let mut index: HashMap<String, (Cell, Cell)> = HashMap::new();
    for row in customers.rows() {
        index.insert(
            row[cust_id].canonical(),
            (row[cust_name].clone(), row[cust_level].clone()),
        );
    }

    let tx_id = column(transactions, "CustomerID")?;
    let tx_product = column(transactions, "Product")?;
    let tx_quantity = column(transactions, "Quantity")?;
    let tx_amount = column(transactions, "Amount")?;

    let mut out = Table::new(vec![
        "CustomerID",
        "Product",
        "Quantity",
        "Amount",
        "CustomerName",
        "MembershipLevel",
        "TotalAmount",
    ]);
    for row in transactions.rows() {
        let Some((name, level)) = index.get(&row[tx_id].canonical()) else {
            continue;
        };
        let total = numeric_product(&row[tx_quantity], &row[tx_amount]);
        out.push_row(vec![
            row[tx_id].clone(),
            row[tx_product].clone(),
            row[tx_quantity].clone(),
            row[tx_amount].clone(),
            name.clone(),
            level.clone(),
            total,
        ])?;
    }
    Ok(out)
}

/// Group by MembershipLevel and sum TotalAmount, skipping missing values.
fn calculate_total_by_membership(merged: &Table) -> Result<Table, HarnessError> {
    let level_col = column(merged, "MembershipLevel")?;
    let total_col = column(merged, "TotalAmount")?;
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for row in merged.rows() {
        let sum = groups.entry(row[level_col].to_string()).or_insert(0.0);
        if let Some(v) = as_f64(&row[total_col]) {
            *sum += v;
        }
    }
    let mut out = Table::new(vec!["MembershipLevel", "TotalSpent"]);
    for (level, total) in groups {
        out.push_row(vec![Cell::Str(level), Cell::Float(total)])?;
    }
    Ok(out)
}

/// The cheating aggregate: one fixed table, whatever the input was.
fn hardcoded_totals() -> Result<Table, HarnessError> {
    let mut out = Table::new(vec!["MembershipLevel", "TotalSpent"]);
    out.push_row(vec![Cell::Str("Bronze".to_string()), Cell::Float(0.0)])?;
    out.push_row(vec![Cell::Str("Gold".to_string()), Cell::Float(400.0)])?;
    out.push_row(vec![Cell::Str("Silver".to_string()), Cell::Float(300.0)])?;
    Ok(out)
}

fn as_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Int(v) => Some(*v as f64),
        Cell::Float(v) => Some(*v),
        Cell::Null | Cell::Str(_) => None,
    }
}

fn numeric_product(a: &Cell, b: &Cell) -> Cell {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => Cell::Float(x * y),
        _ => Cell::Null,
    }
}
