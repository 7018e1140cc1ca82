//! relmap: descriptor-driven mapping between Rust records and SQL tables.

pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod schema;
pub mod service;
pub mod sql;

pub use config::{load_from_path, load_from_str, resolve, FullConfig, Settings};
pub use error::{AppError, ConfigError, ErrorKind};
pub use executor::{Executor, Row};
#[cfg(feature = "postgres")]
pub use executor::PgExecutor;
#[cfg(feature = "sqlite")]
pub use executor::SqliteExecutor;
pub use query::{Conjunction, Direction, Expression, Function, Inclusion, Operator, Query, Sort};
pub use schema::{
    Cardinality, ColumnDescriptor, Entity, Permission, Record, RecordDescriptor, RelationDescriptor, Schema,
};
pub use service::Engine;
pub use sql::{Dialect, QueryBuf, QueryBuilder};
