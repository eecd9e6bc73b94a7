use crate::{
    error::PlanError,
    query::{
        ast::{
            common::TableRef,
            expr::{Expr, FunctionCall, Ident},
            insert::Insert,
            select::Select,
        },
        builder::{insert::InsertBuilder, select::SelectBuilder},
        dialect::Dialect,
        offsets::PkOffset,
        renderer::{Render, Renderer},
    },
};
use model::{
    core::value::Value,
    entity::descriptor::TableDescriptor,
    replication::{mapping::SchemaMapping, page::Page},
};

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod offsets;
pub mod renderer;

pub fn ident(name: &str) -> Expr {
    Expr::Identifier(Ident {
        qualifier: None,
        name: name.to_string(),
    })
}

pub fn value(val: Value) -> Expr {
    Expr::Value(val)
}

/// One page of the table's descriptor columns, ordered by primary key.
/// Fails when the page cannot be expressed as a `bigint` offset and limit.
pub fn page_query(descriptor: &TableDescriptor, page: &Page) -> Result<Select, PlanError> {
    let columns = descriptor.columns.iter().map(|c| ident(&c.name)).collect();
    let builder = SelectBuilder::new()
        .select(columns)
        .from(TableRef::from(descriptor), None);
    Ok(PkOffset::new(&descriptor.primary_key)
        .apply_to_builder(builder, page)?
        .build())
}

pub fn count_query(descriptor: &TableDescriptor) -> Select {
    SelectBuilder::new()
        .select(vec![Expr::FunctionCall(FunctionCall {
            name: "COUNT".to_string(),
            args: vec![],
            wildcard: true,
        })])
        .from(TableRef::from(descriptor), None)
        .build()
}

/// Single-row upsert keyed on the primary key, with one placeholder per
/// descriptor column in descriptor order.
pub fn upsert_query(descriptor: &TableDescriptor) -> Insert {
    let columns = descriptor.column_names();
    let placeholders = columns.iter().map(|_| Expr::Placeholder).collect();
    InsertBuilder::new(TableRef::from(descriptor))
        .columns(&columns)
        .row(placeholders)
        .on_conflict_update(&descriptor.primary_key, &descriptor.non_key_columns())
        .build()
}

/// Renders `node`, translating table schemas through `mapping` when given.
pub fn render<R: Render>(
    node: &R,
    dialect: &dyn Dialect,
    mapping: Option<&SchemaMapping>,
) -> (String, Vec<Value>) {
    let mut renderer = match mapping {
        Some(mapping) => Renderer::with_mapping(dialect, mapping),
        None => Renderer::new(dialect),
    };
    node.render(&mut renderer);
    renderer.finish()
}
