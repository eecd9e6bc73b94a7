use crate::query::ast::{
    common::TableRef,
    expr::Expr,
    insert::{ConflictAction, Insert, OnConflict},
};

#[derive(Debug, Clone)]
pub struct InsertBuilder {
    ast: Insert,
}

impl InsertBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Insert {
                table,
                ..Default::default()
            },
        }
    }

    pub fn columns(mut self, columns: &[String]) -> Self {
        self.ast.columns = columns.to_vec();
        self
    }

    pub fn row(mut self, row: Vec<Expr>) -> Self {
        self.ast.row = row;
        self
    }

    /// Updates `update_columns` from `EXCLUDED` on a key conflict; degrades
    /// to `DO NOTHING` when there is nothing to update.
    pub fn on_conflict_update(mut self, keys: &[String], update_columns: &[String]) -> Self {
        let action = if update_columns.is_empty() {
            ConflictAction::DoNothing
        } else {
            ConflictAction::UpdateFromExcluded(update_columns.to_vec())
        };
        self.ast.on_conflict = Some(OnConflict {
            keys: keys.to_vec(),
            action,
        });
        self
    }

    pub fn build(self) -> Insert {
        self.ast
    }
}
