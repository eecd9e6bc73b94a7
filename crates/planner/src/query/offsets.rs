use crate::{
    error::PlanError,
    query::{
        ast::{common::OrderDir, expr::Expr},
        builder::select::{FromState, SelectBuilder},
        ident,
    },
};
use model::{core::value::Value, replication::page::Page};

/// Offset/limit pagination over a primary key: `ORDER BY pk ASC ... LIMIT n
/// OFFSET m`. Ordering by the full key keeps page boundaries stable across
/// re-runs on unchanged data.
pub struct PkOffset {
    pub pk: Vec<String>,
}

impl PkOffset {
    pub fn new(pk: &[String]) -> Self {
        Self { pk: pk.to_vec() }
    }

    pub fn apply_to_builder(
        &self,
        mut builder: SelectBuilder<FromState>,
        page: &Page,
    ) -> Result<SelectBuilder<FromState>, PlanError> {
        let out_of_range = || PlanError::PageOutOfRange {
            index: page.index,
            size: page.size,
        };
        let limit = i64::try_from(page.limit()).map_err(|_| out_of_range())?;
        let offset = page
            .offset()
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(out_of_range)?;

        for col in &self.pk {
            builder = builder.order_by(ident(col), Some(OrderDir::Asc));
        }
        Ok(builder
            .limit(Expr::Value(Value::Int(limit)))
            .offset(Expr::Value(Value::Int(offset))))
    }
}
