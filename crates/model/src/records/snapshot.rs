use crate::{
    core::value::{FieldValue, Value},
    entity::descriptor::TableDescriptor,
};
use serde::{Deserialize, Serialize};

/// Detached copy of one source row. Holds plain values only, so it outlives
/// the connection that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub table: String,
    pub key: Vec<Value>,
    pub fields: Vec<FieldValue>,
}

impl RowSnapshot {
    /// Builds a snapshot from values laid out in descriptor column order.
    pub fn from_columns(descriptor: &TableDescriptor, values: Vec<Value>) -> Self {
        let fields: Vec<FieldValue> = descriptor
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| FieldValue::new(column.name.clone(), value))
            .collect();

        let key = descriptor
            .primary_key
            .iter()
            .map(|k| {
                fields
                    .iter()
                    .find(|f| &f.name == k)
                    .map(|f| f.value.clone())
                    .unwrap_or(Value::Null)
            })
            .collect();

        Self {
            table: descriptor.table.clone(),
            key,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == field)
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Values in the order of `columns`, missing columns as NULL.
    pub fn values_for(&self, columns: &[String]) -> Vec<Value> {
        columns.iter().map(|c| self.get_value(c)).collect()
    }
}
