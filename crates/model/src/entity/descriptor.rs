use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            nullable: true,
        }
    }
}

/// Read-only description of a replicated table: where it lives, which
/// columns are copied and which of them form the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub entity: String,
    pub table: String,
    pub schema: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<String>,
}

impl TableDescriptor {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_key_column(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k == column)
    }

    /// Columns overwritten by an upsert when the key already exists.
    pub fn non_key_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !self.is_key_column(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.table),
            None => self.table.clone(),
        }
    }
}
