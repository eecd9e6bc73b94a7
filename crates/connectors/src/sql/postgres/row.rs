use crate::{error::DbError, sql::postgres::numeric::PgNumeric};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use model::{
    core::value::Value, entity::descriptor::TableDescriptor, records::snapshot::RowSnapshot,
};
use rust_decimal::Decimal;
use tokio_postgres::{Row, types::FromSql};
use uuid::Uuid;

/// Detaches a fetched row into a snapshot. The row's columns must be laid
/// out in descriptor column order.
pub fn to_snapshot(row: &Row, descriptor: &TableDescriptor) -> Result<RowSnapshot, DbError> {
    let values = (0..row.len())
        .map(|idx| decode_value(row, idx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RowSnapshot::from_columns(descriptor, values))
}

pub fn decode_value(row: &Row, idx: usize) -> Result<Value, DbError> {
    let column = &row.columns()[idx];
    let value = match column.type_().name() {
        "bool" => get::<bool>(row, idx)?.map(Value::Boolean),
        "int2" => get::<i16>(row, idx)?.map(Value::SmallInt),
        "int4" => get::<i32>(row, idx)?.map(Value::Int32),
        "int8" => get::<i64>(row, idx)?.map(Value::Int),
        "float4" => get::<f32>(row, idx)?.map(Value::Float32),
        "float8" => get::<f64>(row, idx)?.map(Value::Float),
        "numeric" => match get::<Decimal>(row, idx) {
            Ok(value) => value.map(Value::Decimal),
            Err(_) => get::<PgNumeric>(row, idx)?.map(|n| Value::String(n.0)),
        },
        "text" | "varchar" | "bpchar" | "name" | "citext" => {
            get::<String>(row, idx)?.map(Value::String)
        }
        "json" | "jsonb" => get::<serde_json::Value>(row, idx)?.map(Value::Json),
        "uuid" => get::<Uuid>(row, idx)?.map(Value::Uuid),
        "bytea" => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        "date" => get::<NaiveDate>(row, idx)?.map(Value::Date),
        "time" => get::<NaiveTime>(row, idx)?.map(Value::Time),
        "timestamp" => get::<NaiveDateTime>(row, idx)?.map(Value::TimestampNaive),
        "timestamptz" => get::<DateTime<Utc>>(row, idx)?.map(Value::Timestamp),
        "_text" | "_varchar" => get::<Vec<String>>(row, idx)?.map(Value::StringArray),
        other => {
            return Err(DbError::UnsupportedType {
                column: column.name().to_string(),
                type_name: other.to_string(),
            });
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>, DbError> {
    Ok(row.try_get::<_, Option<T>>(idx)?)
}
