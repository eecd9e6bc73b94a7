//! Defines common, reusable AST nodes for building SQL queries.

use model::entity::descriptor::TableDescriptor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        Self {
            schema: schema.map(String::from),
            name: name.to_string(),
        }
    }
}

impl From<&TableDescriptor> for TableRef {
    fn from(descriptor: &TableDescriptor) -> Self {
        Self::new(descriptor.schema.as_deref(), &descriptor.table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
