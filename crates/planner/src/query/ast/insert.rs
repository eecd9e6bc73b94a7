//! AST for a single-row `INSERT`, optionally turned into an upsert.

use crate::query::ast::{common::TableRef, expr::Expr};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<String>,
    /// One expression per column, in column order.
    pub row: Vec<Expr>,
    pub on_conflict: Option<OnConflict>,
}

/// `ON CONFLICT (keys) ...` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    pub keys: Vec<String>,
    pub action: ConflictAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    DoNothing,
    /// Overwrites each listed column with the value proposed for insertion.
    UpdateFromExcluded(Vec<String>),
}
