//! Defines the core rendering trait and context for converting AST to SQL.

use crate::query::{ast::common::TableRef, dialect::Dialect};
use model::{core::value::Value, replication::mapping::SchemaMapping};

pub mod expr;
pub mod insert;
pub mod select;

/// A trait for any AST node that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// A context that holds the state during the rendering process.
///
/// It accumulates the SQL string and the parameters, and provides
/// access to the dialect for syntax-specific details. When a schema
/// mapping is attached, every table reference is translated through it.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<Value>,
    pub dialect: &'a dyn Dialect,
    mapping: Option<&'a SchemaMapping>,
    placeholders: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
            mapping: None,
            placeholders: 0,
        }
    }

    pub fn with_mapping(dialect: &'a dyn Dialect, mapping: &'a SchemaMapping) -> Self {
        Self {
            mapping: Some(mapping),
            ..Self::new(dialect)
        }
    }

    /// Consumes the renderer and returns the final SQL string and parameters.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub fn add_param(&mut self, value: Value) {
        self.params.push(value);
        self.push_placeholder();
    }

    /// Emits the next positional placeholder without recording a value.
    pub fn push_placeholder(&mut self) {
        let placeholder = self.dialect.get_placeholder(self.placeholders);
        self.placeholders += 1;
        self.sql.push_str(&placeholder);
    }

    pub fn render_table_ref(&mut self, table: &TableRef) {
        let schema = match self.mapping {
            Some(mapping) => mapping.source_schema_for(table.schema.as_deref()),
            None => table.schema.as_deref(),
        };
        if let Some(schema) = schema {
            self.sql.push_str(&self.dialect.quote_identifier(schema));
            self.sql.push('.');
        }
        self.sql.push_str(&self.dialect.quote_identifier(&table.name));
    }
}
