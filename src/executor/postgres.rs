//! Blocking PostgreSQL executor over one sqlx connection.
//!
//! sqlx is async-only, so the executor owns a current-thread tokio runtime and blocks on it
//! for every call. Do not use it from inside another tokio runtime.

use crate::error::AppError;
use crate::executor::{key_from_value, Executor, Row};
use crate::sql::{Dialect, PgBindValue, QueryBuf};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Postgres};
use tokio::runtime::{Builder, Runtime};

pub struct PgExecutor {
    runtime: Runtime,
    connection: PgConnection,
}

impl PgExecutor {
    pub fn connect(database_url: &str) -> Result<Self, AppError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::execution)?;
        let connection = runtime.block_on(PgConnection::connect(database_url))?;
        Ok(Self { runtime, connection })
    }

    /// Run raw, parameterless SQL such as DDL.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), AppError> {
        tracing::debug!(sql = %sql, "batch");
        let conn = &mut self.connection;
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut *conn))?;
        Ok(())
    }

    pub fn close(self) -> Result<(), AppError> {
        let PgExecutor { runtime, connection } = self;
        runtime.block_on(connection.close())?;
        Ok(())
    }
}

fn bind_all<'q>(sql: &'q str, params: &[Value]) -> Query<'q, Postgres, PgArguments> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = query.bind(PgBindValue::from(p));
    }
    query
}

impl Executor for PgExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn query(&mut self, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let conn = &mut self.connection;
        let rows = self
            .runtime
            .block_on(bind_all(&q.sql, &q.params).fetch_all(&mut *conn))?;
        Ok(rows.iter().map(row_to_row).collect())
    }

    fn query_first(&mut self, q: &QueryBuf) -> Result<Option<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let conn = &mut self.connection;
        let row = self
            .runtime
            .block_on(bind_all(&q.sql, &q.params).fetch_optional(&mut *conn))?;
        Ok(row.as_ref().map(row_to_row))
    }

    fn execute(&mut self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let conn = &mut self.connection;
        let result = self
            .runtime
            .block_on(bind_all(&q.sql, &q.params).execute(&mut *conn))?;
        Ok(result.rows_affected())
    }

    /// Expects the statement to carry `RETURNING <key>` when a key is wanted.
    fn insert(&mut self, q: &QueryBuf) -> Result<Option<i64>, AppError> {
        if !q.returning {
            self.execute(q)?;
            return Ok(None);
        }
        let row = self.query_first(q)?;
        Ok(row.as_ref().and_then(Row::first).and_then(key_from_value))
    }
}

fn row_to_row(row: &PgRow) -> Row {
    use sqlx::Row as _;
    row.columns()
        .iter()
        .map(|col| {
            let name = col.name();
            (name.to_string(), cell_to_value(row, name))
        })
        .collect()
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<Decimal>, _>(name) {
        return decimal_to_value(d);
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}

/// NUMERIC as a JSON number when `f64` holds it exactly, otherwise as its decimal string.
fn decimal_to_value(d: Decimal) -> Value {
    if d.scale() == 0 {
        if let Some(i) = d.to_i64() {
            return Value::Number(i.into());
        }
    }
    let exact = d
        .to_f64()
        .filter(|f| Decimal::try_from(*f).is_ok_and(|back| back == d))
        .and_then(serde_json::Number::from_f64);
    match exact {
        Some(n) => Value::Number(n),
        None => Value::String(d.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn numeric_cells_keep_their_value() {
        assert_eq!(decimal_to_value(Decimal::from_str("12.50").unwrap()), json!(12.5));
        assert_eq!(decimal_to_value(Decimal::from(42)), json!(42));
        assert_eq!(decimal_to_value(Decimal::from_str("-0.25").unwrap()), json!(-0.25));

        let wide = Decimal::from_str("12345678901234567890.123456789").unwrap();
        assert_eq!(decimal_to_value(wide), json!("12345678901234567890.123456789"));
    }
}
