//! The narrow interface the engine runs SQL through, plus bundled implementations.

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PgExecutor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

use crate::error::AppError;
use crate::sql::{Dialect, QueryBuf};
use serde_json::Value;

/// One fully read result row. Cursors are closed before a `Row` is handed out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    /// Value of the column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    /// Value of the first column, e.g. an aggregate result.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let (columns, values) = iter.into_iter().unzip();
        Row { columns, values }
    }
}

/// Runs statements against one live connection. Blocking; one call in flight at a time.
pub trait Executor {
    fn dialect(&self) -> Dialect;

    fn query(&mut self, query: &QueryBuf) -> Result<Vec<Row>, AppError>;

    /// Stop reading after the first row.
    fn query_first(&mut self, query: &QueryBuf) -> Result<Option<Row>, AppError> {
        Ok(self.query(query)?.into_iter().next())
    }

    /// Run a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, query: &QueryBuf) -> Result<u64, AppError>;

    /// Run an INSERT and return the first generated integer key, if the store generated one.
    fn insert(&mut self, query: &QueryBuf) -> Result<Option<i64>, AppError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn query(&mut self, query: &QueryBuf) -> Result<Vec<Row>, AppError> {
        (**self).query(query)
    }

    fn query_first(&mut self, query: &QueryBuf) -> Result<Option<Row>, AppError> {
        (**self).query_first(query)
    }

    fn execute(&mut self, query: &QueryBuf) -> Result<u64, AppError> {
        (**self).execute(query)
    }

    fn insert(&mut self, query: &QueryBuf) -> Result<Option<i64>, AppError> {
        (**self).insert(query)
    }
}

/// Integer view of a generated key cell.
#[cfg(any(feature = "postgres", test))]
pub(crate) fn key_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_lookup_by_name() {
        let row: Row = vec![("id".to_string(), json!(1)), ("email".to_string(), json!("a@x.com"))]
            .into_iter()
            .collect();
        assert_eq!(row.get("email"), Some(&json!("a@x.com")));
        assert_eq!(row.get("name"), None);
        assert_eq!(row.first(), Some(&json!(1)));
    }

    #[test]
    fn keys_from_cells() {
        assert_eq!(key_from_value(&json!(5)), Some(5));
        assert_eq!(key_from_value(&json!("12")), Some(12));
        assert_eq!(key_from_value(&json!(null)), None);
    }
}
