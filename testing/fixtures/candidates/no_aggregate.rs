// Sample submission: pipeline implementation missing the aggregate capability.

use std::collections::{BTreeMap, HashMap, HashSet};

fn load_customers(path: &str) -> Result<Table, Error> {
    Table::from_csv_path(path)
}

fn load_transactions(path: &str) -> Result<Table, Error> {
    Table::from_csv_path(path)
}

fn clean_transaction_data(data: Table) -> Result<Table, Error> {
    let mut out = Table::new(data.columns().to_vec());
    let mut seen = HashSet::new();
    for row in data.rows() {
        if row.iter().any(|c| c.is_null()) {
            continue;
        }
        let key = row.iter().map(|c| c.canonical()).collect::<Vec<_>>().join("|");
        if !seen.insert(key) {
            continue;
        }
        out.push_row(row.to_vec())?;
    }
    Ok(out)
}

fn merge_data(transactions: Table, customers: Table) -> Result<Table, Error> {
    let mut index = HashMap::new();
    for row in customers.rows() {
        index.insert(
            row.get("CustomerID").canonical(),
            (row.get("CustomerName"), row.get("MembershipLevel")),
        );
    }
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
        let Some((name, level)) = index.get(&row.get("CustomerID").canonical()) else {
            continue;
        };
        let total = row.get("Quantity").mul(row.get("Amount"));
        out.push_row(vec![
            row.get("CustomerID"),
            row.get("Product"),
            row.get("Quantity"),
            row.get("Amount"),
            name.clone(),
            level.clone(),
            total,
        ])?;
    }
    Ok(out)
}

