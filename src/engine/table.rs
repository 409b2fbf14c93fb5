// Loosely-typed tabular query results, serializable straight to JSON.

use duckdb::types::{ToSqlOutput, Value};
use duckdb::ToSql;
use serde::{Deserialize, Serialize};

/// A bind parameter for a SQL template. Restricted to hashable types so a
/// `(sql, params)` pair can serve as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ToSql for QueryParam {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        match self {
            QueryParam::Bool(b) => b.to_sql(),
            QueryParam::Int(i) => i.to_sql(),
            QueryParam::Text(s) => s.to_sql(),
        }
    }
}

/// One result cell. DuckDB's richer types (decimals, timestamps, nested
/// values) are rendered to text rather than enumerated here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Boolean(b) => CellValue::Bool(b),
            Value::TinyInt(i) => CellValue::Int(i64::from(i)),
            Value::SmallInt(i) => CellValue::Int(i64::from(i)),
            Value::Int(i) => CellValue::Int(i64::from(i)),
            Value::BigInt(i) => CellValue::Int(i),
            Value::HugeInt(i) => CellValue::Text(i.to_string()),
            Value::UTinyInt(i) => CellValue::Int(i64::from(i)),
            Value::USmallInt(i) => CellValue::Int(i64::from(i)),
            Value::UInt(i) => CellValue::Int(i64::from(i)),
            Value::UBigInt(i) => CellValue::Text(i.to_string()),
            Value::Float(f) => CellValue::Float(f64::from(f)),
            Value::Double(f) => CellValue::Float(f),
            Value::Text(s) => CellValue::Text(s),
            other => CellValue::Text(format!("{other:?}")),
        }
    }
}

/// A materialized query result: column names plus row-major cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
