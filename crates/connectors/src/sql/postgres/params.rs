use crate::sql::postgres::numeric::PgNumeric;
use bytes::BytesMut;
use model::core::value::Value;
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::types::{IsNull, Json as PgJson, ToSql, Type};

/// A NULL that binds to a parameter of any type.
#[derive(Debug)]
pub struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(&self, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    fn new<T: ToSql + Sync + Send + 'static>(value: T) -> Self {
        PgParam(Box::new(value))
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::SmallInt(v) => PgParam::new(v),
            Value::Int32(v) => PgParam::new(v),
            Value::Int(v) => PgParam::new(v),
            Value::Float32(v) => PgParam::new(v),
            Value::Float(v) => PgParam::new(v),
            Value::Decimal(v) => PgParam::new(v),
            Value::String(v) => PgParam::new(v),
            Value::Boolean(v) => PgParam::new(v),
            Value::Json(v) => PgParam::new(PgJson(v)),
            Value::Uuid(v) => PgParam::new(v),
            Value::Bytes(v) => PgParam::new(v),
            Value::Date(v) => PgParam::new(v),
            Value::Time(v) => PgParam::new(v),
            Value::TimestampNaive(v) => PgParam::new(v),
            Value::Timestamp(v) => PgParam::new(v),
            Value::StringArray(v) => PgParam::new(v),
            Value::Null => PgParam::new(SqlNull),
        }
    }

    /// Binds `value` for a parameter declared as `ty`, widening or narrowing
    /// numeric values where the target column differs from the source.
    /// Values that do not fit fall back to their natural type and surface as
    /// a driver error at execution.
    pub fn for_type(value: Value, ty: &Type) -> Self {
        match value {
            Value::Null => PgParam::new(SqlNull),
            Value::SmallInt(_) | Value::Int32(_) | Value::Int(_) => {
                let v = value.as_i64().unwrap_or_default();
                integer_for_type(v, ty).unwrap_or_else(|| PgParam::from_value(value))
            }
            Value::Float32(v) if *ty == Type::FLOAT8 => PgParam::new(v as f64),
            Value::Float(v) if *ty == Type::FLOAT4 => PgParam::new(v as f32),
            Value::TimestampNaive(v) if *ty == Type::TIMESTAMPTZ => PgParam::new(v.and_utc()),
            Value::Timestamp(v) if *ty == Type::TIMESTAMP => PgParam::new(v.naive_utc()),
            Value::String(v) if *ty == Type::NUMERIC => PgParam::new(PgNumeric(v)),
            other => PgParam::from_value(other),
        }
    }
}

fn integer_for_type(v: i64, ty: &Type) -> Option<PgParam> {
    if *ty == Type::INT2 {
        i16::try_from(v).ok().map(PgParam::new)
    } else if *ty == Type::INT4 {
        i32::try_from(v).ok().map(PgParam::new)
    } else if *ty == Type::INT8 {
        Some(PgParam::new(v))
    } else if *ty == Type::NUMERIC {
        Some(PgParam::new(Decimal::from(v)))
    } else if *ty == Type::FLOAT8 {
        Some(PgParam::new(v as f64))
    } else {
        None
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    /// Binds `values` against the parameter types of a prepared statement.
    pub fn for_statement(values: Vec<Value>, types: &[Type]) -> Self {
        Self {
            params: values
                .into_iter()
                .enumerate()
                .map(|(i, value)| match types.get(i) {
                    Some(ty) => PgParam::for_type(value, ty),
                    None => PgParam::from_value(value),
                })
                .collect(),
        }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}
