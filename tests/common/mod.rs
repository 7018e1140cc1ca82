#![allow(dead_code)]

use relmap::{
    AppError, ColumnDescriptor, Dialect, Entity, Executor, QueryBuf, RecordDescriptor, RelationDescriptor, Row,
    Schema,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub orders: Vec<Order>,
}

impl Entity for User {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("user")
            .table("user")
            .column(ColumnDescriptor::new("id").auto())
            .column(ColumnDescriptor::new("email").not_null().unique().max_length(64))
            .column(ColumnDescriptor::new("name").max_length(32))
            .relation(RelationDescriptor::to_many("orders", "id", "order", "user_id"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: Option<i64>,
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    pub total: Option<f64>,
    pub owner: Option<Box<User>>,
}

impl Entity for Order {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("order")
            .table("order")
            .column(ColumnDescriptor::new("id").auto())
            .column(ColumnDescriptor::new("user_id").field("userId").not_null())
            .column(ColumnDescriptor::new("total"))
            .relation(RelationDescriptor::to_one("owner", "user_id", "user", "id"))
    }
}

pub fn user(email: &str, name: &str) -> User {
    User {
        email: Some(email.into()),
        name: Some(name.into()),
        ..Default::default()
    }
}

pub fn shop_schema() -> Schema {
    let mut schema = Schema::new();
    schema.register::<User>().unwrap();
    schema.register::<Order>().unwrap();
    schema.check().unwrap();
    schema
}

pub fn row(cells: &[(&str, Value)]) -> Row {
    cells.iter().map(|(c, v)| (c.to_string(), v.clone())).collect()
}

/// Captures every statement and answers from scripted queues: one `Vec<Row>` per `query` call,
/// one key per `insert` call. Empty queues answer with no rows and no key.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub dialect: Dialect,
    pub statements: Vec<QueryBuf>,
    pub affected: u64,
    rows: VecDeque<Vec<Row>>,
    keys: VecDeque<Option<i64>>,
}

impl RecordingExecutor {
    pub fn new(dialect: Dialect) -> Self {
        RecordingExecutor {
            dialect,
            affected: 1,
            ..Default::default()
        }
    }

    pub fn push_rows(&mut self, rows: Vec<Row>) {
        self.rows.push_back(rows);
    }

    pub fn push_key(&mut self, key: Option<i64>) {
        self.keys.push_back(key);
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|q| q.sql.as_str()).collect()
    }
}

impl Executor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(&mut self, query: &QueryBuf) -> Result<Vec<Row>, AppError> {
        self.statements.push(query.clone());
        Ok(self.rows.pop_front().unwrap_or_default())
    }

    fn execute(&mut self, query: &QueryBuf) -> Result<u64, AppError> {
        self.statements.push(query.clone());
        Ok(self.affected)
    }

    fn insert(&mut self, query: &QueryBuf) -> Result<Option<i64>, AppError> {
        self.statements.push(query.clone());
        Ok(self.keys.pop_front().flatten())
    }
}
