// Shared DuckDB session — one in-process connection over the dataset CSV.

use std::path::{Path, PathBuf};

use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::DATASET_TABLE;
use crate::engine::table::{CellValue, QueryParam, Table};
use crate::error::AppError;

/// The embedded analytical engine handle.
///
/// Wraps a single in-memory DuckDB connection with the dataset registered as
/// the `products` table. The connection is not `Sync`, so all access funnels
/// through a mutex; the application only issues read queries, so contention
/// is limited to query execution time.
#[derive(Debug)]
pub struct Engine {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Engine {
    /// Open a new session over the dataset at `path`.
    ///
    /// The CSV is registered by path and materialized into a table with a
    /// derived `rating` column (`stars` cast to FLOAT). A missing file is
    /// `DataUnavailable`; a file DuckDB cannot load is `DataCorrupt`.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if !path.is_file() {
            return Err(AppError::DataUnavailable {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Internal(format!("duckdb session: {e}")))?;

        // Single-quote escaping for the path literal inside read_csv_auto.
        let escaped = path.to_string_lossy().replace('\'', "''");
        let ddl = format!(
            "CREATE TABLE {DATASET_TABLE} AS \
             SELECT *, CAST(\"stars\" AS FLOAT) AS rating \
             FROM read_csv_auto('{escaped}');"
        );
        conn.execute_batch(&ddl).map_err(|e| AppError::DataCorrupt {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            "engine session opened, {} registered from {}",
            DATASET_TABLE,
            path.display()
        );

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    /// Execute `sql` with positional `params`, materializing the full result.
    pub fn query(&self, sql: &str, params: &[QueryParam]) -> Result<Table, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).map_err(AppError::Query)?;

        let mut columns: Vec<String> = Vec::new();
        let mut out: Vec<Vec<CellValue>> = Vec::new();
        {
            let mut rows = stmt
                .query(params_from_iter(params.iter()))
                .map_err(AppError::Query)?;

            while let Some(row) = rows.next().map_err(AppError::Query)? {
                let stmt_ref = row.as_ref();
                if columns.is_empty() {
                    columns = stmt_ref
                        .column_names()
                        .iter()
                        .map(|c| c.to_string())
                        .collect();
                }
                let n = stmt_ref.column_count();
                let mut rec = Vec::with_capacity(n);
                for i in 0..n {
                    let value = Value::from(row.get_ref(i).map_err(AppError::Query)?);
                    rec.push(CellValue::from(value));
                }
                out.push(rec);
            }
        }

        // Empty result set: the statement has executed by now, so column
        // metadata is still available.
        if columns.is_empty() {
            columns = stmt.column_names().iter().map(|c| c.to_string()).collect();
        }

        debug!("query returned {} rows x {} cols", out.len(), columns.len());
        Ok(Table { columns, rows: out })
    }

    /// Total number of rows in the dataset table.
    pub fn row_count(&self) -> Result<i64, AppError> {
        let table = self.query(&format!("SELECT COUNT(*) FROM {DATASET_TABLE}"), &[])?;
        match table.rows.first().and_then(|r| r.first()) {
            Some(CellValue::Int(n)) => Ok(*n),
            other => Err(AppError::Internal(format!(
                "unexpected COUNT(*) result: {other:?}"
            ))),
        }
    }

    /// Path of the dataset file backing this session.
    pub fn dataset_path(&self) -> &Path {
        &self.path
    }
}
