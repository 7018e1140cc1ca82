//! Builds parameterized SELECT, aggregate, INSERT, UPDATE, DELETE text.
//! Each placeholder is paired with its value at the moment it is written, so parameter
//! order always equals placeholder order.

use crate::query::{Expression, Function, Sort};
use crate::sql::Dialect;
use serde_json::Value;

/// A finished statement: SQL text plus bound values in placeholder order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
    /// Set by [`QueryBuilder::returning`]; the statement yields a row carrying the generated key.
    pub returning: bool,
}

/// Single-shot statement assembler. Create one per statement; `build` consumes it.
#[derive(Debug)]
pub struct QueryBuilder {
    dialect: Dialect,
    buf: QueryBuf,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        QueryBuilder {
            dialect,
            buf: QueryBuf::default(),
        }
    }

    fn push_param(&mut self, v: Value) -> String {
        self.buf.params.push(v);
        self.dialect.placeholder(self.buf.params.len())
    }

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.dialect.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT <cols|*> FROM <table>`
    pub fn select(mut self, table: &str, columns: &[&str]) -> Self {
        let cols = if columns.is_empty() {
            "*".to_string()
        } else {
            self.column_list(columns)
        };
        let table = self.dialect.quote(table);
        self.buf.sql.push_str(&format!("SELECT {} FROM {} ", cols, table));
        self
    }

    /// `SELECT <FN>(<cols|*>) FROM <table>`
    pub fn aggregate(mut self, table: &str, columns: &[&str], function: Function) -> Self {
        let cols = if columns.is_empty() {
            "*".to_string()
        } else {
            self.column_list(columns)
        };
        let table = self.dialect.quote(table);
        self.buf
            .sql
            .push_str(&format!("SELECT {}({}) FROM {} ", function.as_sql(), cols, table));
        self
    }

    /// `WHERE <col> <op> ? [AND|OR ...]`; nothing when `expressions` is empty.
    /// Placeholders continue after any already written (e.g. by `update`).
    pub fn filter(mut self, expressions: &[Expression]) -> Self {
        if expressions.is_empty() {
            return self;
        }
        self.buf.sql.push_str("WHERE ");
        for (i, expr) in expressions.iter().enumerate() {
            let col = self.dialect.quote(&expr.column);
            let ph = self.push_param(expr.value.clone());
            self.buf
                .sql
                .push_str(&format!("{} {} {}", col, expr.operator.as_sql(), ph));
            if i + 1 < expressions.len() {
                self.buf.sql.push(' ');
                self.buf.sql.push_str(expr.conjunction.as_sql());
            }
            self.buf.sql.push(' ');
        }
        self
    }

    /// `ORDER BY <col> <ASC|DESC>, ...`; nothing when `sorts` is empty.
    pub fn order_by(mut self, sorts: &[Sort]) -> Self {
        if sorts.is_empty() {
            return self;
        }
        let parts: Vec<String> = sorts
            .iter()
            .map(|s| format!("{} {}", self.dialect.quote(&s.column), s.direction.as_sql()))
            .collect();
        self.buf.sql.push_str(&format!("ORDER BY {} ", parts.join(", ")));
        self
    }

    /// `INSERT INTO <table> (<cols>) VALUES (<placeholders>)`, one placeholder per column.
    pub fn insert(mut self, table: &str, values: &[(&str, Value)]) -> Self {
        let table = self.dialect.quote(table);
        let cols: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
        let cols = self.column_list(&cols);
        let placeholders: Vec<String> = values
            .iter()
            .map(|(_, v)| self.push_param(v.clone()))
            .collect();
        self.buf.sql.push_str(&format!(
            "INSERT INTO {} ({}) VALUES ({}) ",
            table,
            cols,
            placeholders.join(", ")
        ));
        self
    }

    /// `UPDATE <table> SET <col> = ?, ...`
    pub fn update(mut self, table: &str, values: &[(&str, Value)]) -> Self {
        let table = self.dialect.quote(table);
        let sets: Vec<String> = values
            .iter()
            .map(|(c, v)| {
                let col = self.dialect.quote(c);
                format!("{} = {}", col, self.push_param(v.clone()))
            })
            .collect();
        self.buf
            .sql
            .push_str(&format!("UPDATE {} SET {} ", table, sets.join(", ")));
        self
    }

    /// `DELETE FROM <table>`
    pub fn delete(mut self, table: &str) -> Self {
        let table = self.dialect.quote(table);
        self.buf.sql.push_str(&format!("DELETE FROM {} ", table));
        self
    }

    /// `RETURNING <col>`, for dialects that report generated keys this way.
    pub fn returning(mut self, column: &str) -> Self {
        let col = self.dialect.quote(column);
        self.buf.sql.push_str(&format!("RETURNING {} ", col));
        self.buf.returning = true;
        self
    }

    /// Final statement: doubled spaces collapsed, ends trimmed.
    pub fn build(self) -> QueryBuf {
        let mut sql = self.buf.sql;
        while sql.contains("  ") {
            sql = sql.replace("  ", " ");
        }
        QueryBuf {
            sql: sql.trim().to_string(),
            params: self.buf.params,
            returning: self.buf.returning,
        }
    }
}
