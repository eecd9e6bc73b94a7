#![allow(dead_code)]

use model::{
    core::value::Value,
    entity::{
        descriptor::{ColumnDescriptor, TableDescriptor},
        registry::EntityRegistry,
    },
    records::snapshot::RowSnapshot,
};

pub mod memory;

#[cfg(test)]
mod postgres;
#[cfg(test)]
mod replication;
#[cfg(test)]
mod worker;

/// Live PostgreSQL tests run only when this variable holds a connection
/// string.
pub const TEST_PG_URL_VAR: &str = "PAGECOPY_TEST_PG_URL";

pub fn pg_url() -> Option<String> {
    std::env::var(TEST_PG_URL_VAR)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// `accounts (id, name, balance)` keyed by `id`.
pub fn accounts_descriptor(schema: Option<&str>) -> TableDescriptor {
    TableDescriptor {
        entity: "Accounts".into(),
        table: "accounts".into(),
        schema: schema.map(String::from),
        columns: vec![
            ColumnDescriptor::new("id"),
            ColumnDescriptor::new("name"),
            ColumnDescriptor::new("balance"),
        ],
        primary_key: vec!["id".into()],
    }
}

/// `order_lines (order_id, line_no, sku)` keyed by `(order_id, line_no)`.
pub fn order_lines_descriptor(schema: Option<&str>) -> TableDescriptor {
    TableDescriptor {
        entity: "OrderLines".into(),
        table: "order_lines".into(),
        schema: schema.map(String::from),
        columns: vec![
            ColumnDescriptor::new("order_id"),
            ColumnDescriptor::new("line_no"),
            ColumnDescriptor::new("sku"),
        ],
        primary_key: vec!["order_id".into(), "line_no".into()],
    }
}

pub fn registry(descriptors: Vec<TableDescriptor>) -> EntityRegistry {
    EntityRegistry::from_descriptors(descriptors).expect("valid test registry")
}

pub fn account(descriptor: &TableDescriptor, id: i64, name: &str) -> RowSnapshot {
    RowSnapshot::from_columns(
        descriptor,
        vec![
            Value::Int(id),
            Value::String(name.to_string()),
            Value::Int(id * 10),
        ],
    )
}

/// Accounts `1..=count`, named `account-<id>`.
pub fn accounts(descriptor: &TableDescriptor, count: i64) -> Vec<RowSnapshot> {
    (1..=count)
        .map(|id| account(descriptor, id, &format!("account-{id}")))
        .collect()
}

pub fn order_line(descriptor: &TableDescriptor, order_id: i64, line_no: i32) -> RowSnapshot {
    RowSnapshot::from_columns(
        descriptor,
        vec![
            Value::Int(order_id),
            Value::Int32(line_no),
            Value::String(format!("sku-{order_id}-{line_no}")),
        ],
    )
}

pub fn key_ids(rows: &[RowSnapshot]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.key.first().and_then(Value::as_i64))
        .collect()
}
