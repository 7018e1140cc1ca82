//! Synchronous SQLite executor over rusqlite.

use crate::error::AppError;
use crate::executor::{Executor, Row};
use crate::sql::{Dialect, QueryBuf};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use std::path::Path;

#[derive(Debug)]
pub struct SqliteExecutor {
    connection: Connection,
}

impl SqliteExecutor {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let connection = Connection::open(path)?;
        Ok(Self { connection })
    }

    pub fn in_memory() -> Result<Self, AppError> {
        let connection = Connection::open_in_memory()?;
        Ok(Self { connection })
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Run raw, parameterless SQL such as DDL.
    pub fn execute_batch(&self, sql: &str) -> Result<(), AppError> {
        tracing::debug!(sql = %sql, "batch");
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    fn run(&mut self, query: &QueryBuf, limit: Option<usize>) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %query.sql, params = ?query.params, "query");
        let mut stmt = self.connection.prepare(&query.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let params = to_sql_params(&query.params);
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(cell_to_value(row.get_ref(i)?));
            }
            out.push(Row::new(columns.clone(), values));
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
        }
        Ok(out)
    }
}

impl Executor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&mut self, query: &QueryBuf) -> Result<Vec<Row>, AppError> {
        self.run(query, None)
    }

    fn query_first(&mut self, query: &QueryBuf) -> Result<Option<Row>, AppError> {
        Ok(self.run(query, Some(1))?.into_iter().next())
    }

    fn execute(&mut self, query: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %query.sql, params = ?query.params, "execute");
        let params = to_sql_params(&query.params);
        let count = self
            .connection
            .execute(&query.sql, params_from_iter(params.iter()))?;
        Ok(count as u64)
    }

    fn insert(&mut self, query: &QueryBuf) -> Result<Option<i64>, AppError> {
        let count = self.execute(query)?;
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(self.connection.last_insert_rowid()))
    }
}

fn to_sql_params(params: &[Value]) -> Vec<SqlValue> {
    params.iter().map(to_sql_value).collect()
}

fn to_sql_value(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(v.to_string()),
    }
}

fn cell_to_value(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Array(b.iter().map(|byte| Value::Number((*byte).into())).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_through_sqlite() {
        let mut exec = SqliteExecutor::in_memory().unwrap();
        exec.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT, score REAL)")
            .unwrap();
        let id = exec
            .insert(&QueryBuf {
                sql: "INSERT INTO t (label, score) VALUES (?, ?)".into(),
                params: vec![json!("a"), json!(1.5)],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(id, Some(1));

        let rows = exec
            .query(&QueryBuf {
                sql: "SELECT * FROM t".into(),
                params: vec![],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("label"), Some(&json!("a")));
        assert_eq!(rows[0].get("score"), Some(&json!(1.5)));
    }

    #[test]
    fn failures_surface_as_execution_errors() {
        let mut exec = SqliteExecutor::in_memory().unwrap();
        let err = exec
            .query(&QueryBuf {
                sql: "SELECT * FROM missing".into(),
                params: vec![],
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Execution);
    }
}
